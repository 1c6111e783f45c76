//! Core conversion logic, independent of the terminal

pub mod amount;
pub mod config;
pub mod converter;
pub mod currency;
pub mod error;
pub mod log;
pub mod picker;
pub mod session;

// Re-export main types for cleaner imports
pub use converter::{Converter, ConverterView, Effect, Input};
pub use currency::{Catalog, Conversion, ConversionRequest, LatestRates, RateService};
pub use error::{ConvertError, ServiceError};
pub use picker::{CurrencyPicker, PickerKey};
pub use session::ConverterSession;
