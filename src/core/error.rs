//! Error types shared by the rate service and the converter.
//!
//! [`ServiceError`] describes why a call to the exchange-rate API did not
//! produce data. [`ConvertError`] is what the form shows next to the inputs;
//! every variant is transient and cleared by the next input change.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error: {status} for {url}")]
    Http {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The caller fired the cancellation token before the response arrived.
    #[error("Request cancelled")]
    Cancelled,
}

impl ServiceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ServiceError::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("Failed to load currencies")]
    CurrencyListLoad,

    #[error("Please enter a valid positive number")]
    InvalidAmount,

    #[error("Please select both currencies")]
    MissingSelection,

    #[error("Conversion failed. Please try again.")]
    ConversionRequest,
}
