//! Collaborator traits
//!
//! The evaluation cycle only talks to these seams, so tests drive it with the
//! in-memory implementations from `adapters::test_utils` (`test-utils`
//! feature).

use async_trait::async_trait;

use crate::adapters::errors::AdapterResult;
use crate::core::normalize::Rates;
use crate::core::types::Quote;

/// One price source
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Source name as it appears in keys and alert lines
    fn name(&self) -> &str;

    /// Fetch the current quote of every configured symbol.
    ///
    /// Fails if any symbol is missing: a partial batch would shift which
    /// quote is the reference.
    async fn fetch_quotes(&self) -> AdapterResult<Vec<Quote>>;
}

/// Conversion-rate provider (units of each currency per reference unit)
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rates(&self) -> AdapterResult<Rates>;
}

/// Push delivery of composed alert messages
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, message: &str) -> AdapterResult<()>;
}
