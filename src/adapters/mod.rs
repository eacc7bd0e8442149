//! Collaborator adapters: quote sources, conversion rates, alert delivery
//!
//! The core only sees the traits in `traits`; the HTTP implementations here
//! are thin wrappers over `reqwest`.

pub mod errors;
pub mod http_source;
pub mod pushover;
pub mod rates;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod traits;

// Re-export commonly used types for convenience
pub use errors::{AdapterError, AdapterResult};
pub use http_source::HttpQuoteSource;
pub use pushover::{LogSink, PushoverSink};
pub use rates::HttpRateProvider;
pub use traits::{AlertSink, QuoteSource, RateProvider};
