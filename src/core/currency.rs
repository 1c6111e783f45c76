//! Currency catalog, conversion types and the rate service abstraction

use super::error::ServiceError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// Supported currencies, keyed by code. Iterates in ascending code order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(BTreeMap<String, String>);

impl Catalog {
    pub fn name(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(code, name)| (code.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<C: Into<String>, N: Into<String>> FromIterator<(C, N)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (C, N)>>(iter: I) -> Self {
        Catalog(
            iter.into_iter()
                .map(|(code, name)| (code.into(), name.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

/// What the form displays once a conversion settles.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub amount: f64,
    pub currency: String,
    pub rate: f64,
    pub date: Option<NaiveDate>,
}

/// Body of a `/latest` response. Only `rates` is required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LatestRates {
    pub rates: BTreeMap<String, f64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[async_trait]
pub trait RateService: Send + Sync {
    async fn list_currencies(&self) -> Result<Catalog, ServiceError>;

    /// Converts `request.amount`. Returns [`ServiceError::Cancelled`] if `cancel`
    /// fires before the response is complete.
    async fn convert(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<LatestRates, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_deserializes_from_code_map() {
        let catalog: Catalog =
            serde_json::from_str(r#"{"USD": "United States Dollar", "EUR": "Euro"}"#).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.name("EUR"), Some("Euro"));
        assert!(!catalog.contains("JPY"));
        let codes: Vec<&str> = catalog.entries().map(|(code, _)| code).collect();
        assert_eq!(codes, vec!["EUR", "USD"]);
    }

    #[test]
    fn test_latest_rates_date_is_optional() {
        let rates: LatestRates = serde_json::from_str(r#"{"rates": {"EUR": 92.5}}"#).unwrap();
        assert_eq!(rates.rates.get("EUR"), Some(&92.5));
        assert!(rates.date.is_none());

        let rates: LatestRates = serde_json::from_str(
            r#"{"amount": 100.0, "base": "USD", "date": "2024-05-17", "rates": {"EUR": 92.5}}"#,
        )
        .unwrap();
        assert_eq!(rates.date, NaiveDate::from_ymd_opt(2024, 5, 17));
    }
}
