//! HTTP/JSON ticker source
//!
//! Each configured endpoint is fetched with a GET and the ask/bid prices are
//! read by JSON pointer. Exchanges disagree on how they encode prices, so a
//! price may be a JSON number or a numeric string. Endpoints sharing a URL
//! (one ticker document covering several markets) are fetched once per cycle.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::adapters::errors::{AdapterError, AdapterResult};
use crate::adapters::traits::QuoteSource;
use crate::config::SourceConfig;
use crate::core::types::Quote;

pub struct HttpQuoteSource {
    config: SourceConfig,
    http_client: reqwest::Client,
}

impl HttpQuoteSource {
    pub fn new(config: SourceConfig, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, http_client }
    }

    async fn get_json(&self, url: &str) -> AdapterResult<Value> {
        let response = self.http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AdapterError::Request(format!("{} ticker request failed: {}", self.config.name, e)))?;

        let status = response.status();
        let text = response.text().await
            .map_err(|e| AdapterError::InvalidResponse(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AdapterError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| AdapterError::InvalidResponse(format!("Invalid JSON: {} - {}", e, text)))
    }

    fn price(&self, body: &Value, symbol: &str, pointer: &str) -> AdapterResult<f64> {
        let value = body.pointer(pointer).filter(|v| !v.is_null()).ok_or_else(|| {
            AdapterError::MissingSymbol {
                source_name: self.config.name.clone(),
                symbol: symbol.to_string(),
            }
        })?;
        parse_price(pointer, value)
    }
}

/// Read a price encoded as a JSON number or a numeric string
pub(crate) fn parse_price(field: &str, value: &Value) -> AdapterResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|p| p.is_finite()).ok_or_else(|| AdapterError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn fetch_quotes(&self) -> AdapterResult<Vec<Quote>> {
        let mut bodies: HashMap<&str, Value> = HashMap::new();
        let mut quotes = Vec::with_capacity(self.config.endpoints.len());

        for endpoint in &self.config.endpoints {
            let body = match bodies.entry(endpoint.url.as_str()) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => e.insert(self.get_json(&endpoint.url).await?),
            };

            let ask = self.price(body, &endpoint.symbol, &endpoint.ask)?;
            let bid = self.price(body, &endpoint.symbol, &endpoint.bid)?;
            let currency = endpoint.currency.as_deref().unwrap_or(&self.config.currency);

            quotes.push(Quote::new(&self.config.name, currency, &endpoint.symbol, ask, bid));
        }

        debug!(source = %self.config.name, quotes = quotes.len(), "Quotes fetched");
        Ok(quotes)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
