//! In-memory collaborators for tests
//!
//! Compiled for unit tests and behind the `test-utils` feature, which the
//! crate's own dev-dependency turns on so integration tests under `tests/`
//! can drive the evaluation cycle without network access.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::adapters::errors::{AdapterError, AdapterResult};
use crate::adapters::traits::{AlertSink, QuoteSource, RateProvider};
use crate::core::normalize::Rates;
use crate::core::types::Quote;

/// Returns scripted batches in order, then repeats the last one
pub struct StaticSource {
    name: String,
    batches: Mutex<VecDeque<Vec<Quote>>>,
    last: Mutex<Vec<Quote>>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, quotes: Vec<Quote>) -> Self {
        Self::scripted(name, vec![quotes])
    }

    pub fn scripted(name: impl Into<String>, batches: Vec<Vec<Quote>>) -> Self {
        Self {
            name: name.into(),
            batches: Mutex::new(batches.into()),
            last: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl QuoteSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_quotes(&self) -> AdapterResult<Vec<Quote>> {
        let next = self.batches.lock().map_err(|e| AdapterError::Request(e.to_string()))?.pop_front();
        let mut last = self.last.lock().map_err(|e| AdapterError::Request(e.to_string()))?;
        if let Some(batch) = next {
            *last = batch;
        }
        Ok(last.clone())
    }
}

/// Always fails
pub struct FailingSource {
    name: String,
}

impl FailingSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl QuoteSource for FailingSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_quotes(&self) -> AdapterResult<Vec<Quote>> {
        Err(AdapterError::Request(format!("{} unavailable", self.name)))
    }
}

/// Fixed conversion rates
pub struct StaticRates(pub Rates);

#[async_trait]
impl RateProvider for StaticRates {
    async fn fetch_rates(&self) -> AdapterResult<Rates> {
        Ok(self.0.clone())
    }
}

/// Records every delivered message; optionally fails every delivery
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn deliver(&self, message: &str) -> AdapterResult<()> {
        self.messages
            .lock()
            .map_err(|e| AdapterError::Request(e.to_string()))?
            .push(message.to_string());
        if self.fail {
            return Err(AdapterError::Status {
                url: "recording://sink".to_string(),
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        Ok(())
    }
}
