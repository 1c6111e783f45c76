use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::core::currency::{Catalog, ConversionRequest, LatestRates, RateService};
use crate::core::error::ServiceError;

pub const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

// FrankfurterClient implementation for RateService
pub struct FrankfurterClient {
    base_url: String,
    client: reqwest::Client,
}

impl FrankfurterClient {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fxconv/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(FrankfurterClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Joins `path` onto the base URL; parameter values are percent-encoded.
    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ServiceError> {
        let url = format!("{}/{path}", self.base_url);
        Url::parse_with_params(&url, params)
            .map_err(|e| ServiceError::InvalidUrl(format!("{url}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ServiceError> {
        debug!("Requesting {}", url);
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(ServiceError::Http {
                status: response.status(),
                url: url.to_string(),
            });
        }

        let text = response.text().await?;
        debug!(body = %text, "Received Frankfurter response");
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl RateService for FrankfurterClient {
    #[instrument(name = "FrankfurterCurrencies", skip(self))]
    async fn list_currencies(&self) -> Result<Catalog, ServiceError> {
        let url = self.endpoint("currencies", &[])?;
        self.get_json(url).await
    }

    #[instrument(
        name = "FrankfurterConvert",
        skip(self, request, cancel),
        fields(amount = request.amount, from = %request.from, to = %request.to)
    )]
    async fn convert(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<LatestRates, ServiceError> {
        let url = self.endpoint(
            "latest",
            &[
                ("amount", request.amount.to_string()),
                ("from", request.from.clone()),
                ("to", request.to.clone()),
            ],
        )?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Conversion request cancelled");
                Err(ServiceError::Cancelled)
            }
            result = self.get_json::<LatestRates>(url) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn usd_eur(amount: f64) -> ConversionRequest {
        ConversionRequest {
            amount,
            from: "USD".to_string(),
            to: "EUR".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_currency_list() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/currencies"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"EUR": "Euro", "USD": "United States Dollar"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = FrankfurterClient::new(&mock_server.uri()).unwrap();
        let catalog = client.list_currencies().await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.name("USD"), Some("United States Dollar"));
    }

    #[tokio::test]
    async fn test_currency_list_error_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/currencies"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = FrankfurterClient::new(&mock_server.uri()).unwrap();
        let result = client.list_currencies().await;
        assert!(matches!(
            result,
            Err(ServiceError::Http { status, .. }) if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn test_successful_conversion() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("amount", "100"))
            .and(query_param("from", "USD"))
            .and(query_param("to", "EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"amount": 100.0, "base": "USD", "date": "2024-05-17", "rates": {"EUR": 92.5}}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = FrankfurterClient::new(&mock_server.uri()).unwrap();
        let latest = client
            .convert(&usd_eur(100.0), &CancellationToken::new())
            .await
            .expect("Failed to convert");
        assert_eq!(latest.rates.get("EUR"), Some(&92.5));
        assert_eq!(
            latest.date,
            chrono::NaiveDate::from_ymd_opt(2024, 5, 17)
        );
    }

    #[tokio::test]
    async fn test_fractional_amount_in_query() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("amount", "12.5"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"rates": {"EUR": 11.5}}"#),
            )
            .mount(&mock_server)
            .await;

        let client = FrankfurterClient::new(&format!("{}/", mock_server.uri())).unwrap();
        let latest = client
            .convert(&usd_eur(12.5), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(latest.rates.get("EUR"), Some(&11.5));
    }

    #[tokio::test]
    async fn test_conversion_error_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = FrankfurterClient::new(&mock_server.uri()).unwrap();
        let result = client
            .convert(&usd_eur(1.0), &CancellationToken::new())
            .await;
        let err = result.unwrap_err();
        assert!(!err.is_cancelled());
        assert!(err.to_string().starts_with("HTTP error: 404 Not Found"));
    }

    #[tokio::test]
    async fn test_conversion_malformed_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ratez": {}}"#))
            .mount(&mock_server)
            .await;

        let client = FrankfurterClient::new(&mock_server.uri()).unwrap();
        let result = client
            .convert(&usd_eur(1.0), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ServiceError::Decode(_))));
    }

    #[tokio::test]
    async fn test_cancelled_conversion() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"rates": {"EUR": 0.9}}"#)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let client = FrankfurterClient::new(&mock_server.uri()).unwrap();
        let token = CancellationToken::new();
        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                token.cancel();
            })
        };

        let result = client.convert(&usd_eur(1.0), &token).await;
        canceller.await.unwrap();
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_currency_codes_are_encoded_in_query() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("amount", "1"))
            .and(query_param("from", "USD"))
            .and(query_param("to", "EUR&amount=9"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"rates": {"EUR": 0.9}}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = FrankfurterClient::new(&mock_server.uri()).unwrap();
        let request = ConversionRequest {
            amount: 1.0,
            from: "USD".to_string(),
            to: "EUR&amount=9".to_string(),
        };
        let latest = client
            .convert(&request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(latest.rates.get("EUR"), Some(&0.9));

        let requests = mock_server.received_requests().await.unwrap();
        let amounts: Vec<_> = requests[0]
            .url
            .query_pairs()
            .filter(|(key, _)| key == "amount")
            .collect();
        assert_eq!(amounts.len(), 1);
    }

    #[test]
    fn test_unusable_base_url_is_reported() {
        let client = FrankfurterClient::new("not a url").unwrap();
        let err = client.endpoint("currencies", &[]).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidUrl(_)));
    }
}
