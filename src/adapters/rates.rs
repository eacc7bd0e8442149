//! Conversion-rate provider over HTTP
//!
//! One GET returns a flat object keyed `"{REF}_{CUR}"`:
//! `{"USD_TRY": 3.52, "USD_JPY": 110.4}`. A currency absent from the reply is
//! logged and skipped, so the monitor keeps whatever rate it had before.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapters::errors::{AdapterError, AdapterResult};
use crate::adapters::http_source::parse_price;
use crate::adapters::traits::RateProvider;
use crate::core::normalize::Rates;

pub struct HttpRateProvider {
    url: String,
    reference_currency: String,
    target_currencies: Vec<String>,
    http_client: reqwest::Client,
}

impl HttpRateProvider {
    pub fn new(
        url: impl Into<String>,
        reference_currency: impl Into<String>,
        target_currencies: Vec<String>,
        timeout: Duration,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            url: url.into(),
            reference_currency: reference_currency.into(),
            target_currencies,
            http_client,
        }
    }

    fn rate_key(&self, currency: &str) -> String {
        format!("{}_{}", self.reference_currency, currency)
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch_rates(&self) -> AdapterResult<Rates> {
        let response = self.http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AdapterError::Request(format!("Rate request failed: {}", e)))?;

        let status = response.status();
        let text = response.text().await
            .map_err(|e| AdapterError::InvalidResponse(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AdapterError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
                body: text,
            });
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| AdapterError::InvalidResponse(format!("Invalid JSON: {} - {}", e, text)))?;
        let Some(object) = body.as_object() else {
            return Err(AdapterError::InvalidResponse(format!("Expected an object, got: {}", text)));
        };

        let mut rates = Rates::new();
        for currency in &self.target_currencies {
            if *currency == self.reference_currency {
                continue;
            }
            let key = self.rate_key(currency);
            match object.get(&key) {
                Some(value) => {
                    rates.insert(currency.clone(), parse_price(&key, value)?);
                }
                None => warn!(currency = %currency, key = %key, "Rate missing from response"),
            }
        }

        debug!(rates = ?rates, "Rates fetched");
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(url: String) -> HttpRateProvider {
        HttpRateProvider::new(
            url,
            "USD",
            vec!["TRY".to_string(), "JPY".to_string(), "USD".to_string()],
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_fetch_rates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/convert")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "USD_TRY,USD_JPY".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"USD_TRY":3.5215,"USD_JPY":"110.4"}"#)
            .create_async()
            .await;

        let rates = provider(format!("{}/convert?q=USD_TRY,USD_JPY", server.url()))
            .fetch_rates()
            .await
            .unwrap();

        assert_eq!(rates.get("TRY"), Some(&3.5215));
        assert_eq!(rates.get("JPY"), Some(&110.4));
        assert_eq!(rates.len(), 2, "reference currency never gets a rate");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_currency_is_skipped() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/convert")
            .with_body(r#"{"USD_TRY":3.5}"#)
            .create_async()
            .await;

        let rates = provider(format!("{}/convert", server.url())).fetch_rates().await.unwrap();

        assert_eq!(rates.get("TRY"), Some(&3.5));
        assert!(!rates.contains_key("JPY"));
    }

    #[tokio::test]
    async fn test_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/convert")
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let err = provider(format!("{}/convert", server.url())).fetch_rates().await.unwrap_err();
        assert!(matches!(err, AdapterError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_non_object_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/convert")
            .with_body("[3.5]")
            .create_async()
            .await;

        let err = provider(format!("{}/convert", server.url())).fetch_rates().await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidResponse(_)));
    }
}
