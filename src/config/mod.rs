//! Configuration module: YAML loading, env-driven constants, logging setup
//!
//! This module provides:
//! - Configuration types (`AppConfig`, `SourceConfig`, `EndpointConfig`, ...)
//! - YAML loading functionality (`load_config`)
//! - Application constants with environment variable overrides
//! - Subscriber initialization (`logging::init_logging`)

pub mod constants;
pub mod logging;
mod loader;
mod types;

// Re-export types
pub use types::{ApiConfig, AppConfig, EndpointConfig, PushoverConfig, RatesConfig, SourceConfig};

// Re-export loader functions
pub use loader::{load_config, load_config_from_str};
