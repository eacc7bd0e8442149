//! Spread alert service
//!
//! Polls bid/ask quotes from several crypto exchanges, normalizes them into
//! common currencies, computes percentage spreads between sources and raises
//! rate-limited push alerts when a spread crosses a configured threshold.
//!
//! - `core`: rounding, normalization, spread calculation, alert state machine
//! - `adapters`: HTTP quote sources, conversion rates, Pushover delivery
//! - `config`: YAML configuration, env-driven constants, logging
//! - `server`: HTTP status and control surface

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;
pub mod server;

pub use error::AppError;
