//! Configuration types for the spread monitor
//!
//! This module defines all configuration structs that are loaded from YAML.
//! Secrets (Pushover credentials) never live here: they come from the
//! environment, see `config::constants`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::spread::{CalculatorSettings, CrossPair};
use crate::core::thresholds::ThresholdConfig;
use crate::error::AppError;

// ============================================================================
// Configuration Structs
// ============================================================================

/// One ticker endpoint of a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Symbol this endpoint quotes (e.g. "BTC")
    pub symbol: String,
    pub url: String,
    /// JSON pointer to the ask price in the response body
    #[serde(default = "default_ask_pointer")]
    pub ask: String,
    /// JSON pointer to the bid price in the response body
    #[serde(default = "default_bid_pointer")]
    pub bid: String,
    /// Overrides the source currency for this market (e.g. an ETH-BTC book)
    #[serde(default)]
    pub currency: Option<String>,
}

fn default_ask_pointer() -> String {
    "/ask".to_string()
}

fn default_bid_pointer() -> String {
    "/bid".to_string()
}

/// A price source and its endpoints, in evaluation order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique source name (e.g. "Gdax", "BTCTurk")
    pub name: String,
    /// Currency the source prices in (e.g. "TRY", or "BTC" for a rebased source)
    pub currency: String,
    /// Prices are in a crypto asset and must be converted with the
    /// reference source's ask of that asset
    #[serde(default)]
    pub rebase: bool,
    pub endpoints: Vec<EndpointConfig>,
}

impl SourceConfig {
    /// Validate source configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        // Rule: source name cannot be empty
        if self.name.trim().is_empty() {
            return Err(AppError::Config("Source name cannot be empty".to_string()));
        }

        if self.currency.trim().is_empty() {
            return Err(AppError::Config(format!(
                "Source '{}': currency cannot be empty",
                self.name
            )));
        }

        if self.endpoints.is_empty() {
            return Err(AppError::Config(format!(
                "Source '{}': at least one endpoint is required",
                self.name
            )));
        }

        for endpoint in &self.endpoints {
            if endpoint.url.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "Source '{}': endpoint for {} has an empty url",
                    self.name, endpoint.symbol
                )));
            }
            // JSON pointers are either empty (whole document) or start with '/'
            for pointer in [&endpoint.ask, &endpoint.bid] {
                if !pointer.is_empty() && !pointer.starts_with('/') {
                    return Err(AppError::Config(format!(
                        "Source '{}': invalid JSON pointer '{}' for {}",
                        self.name, pointer, endpoint.symbol
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Conversion-rate endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesConfig {
    /// Returns a flat object keyed `"{REF}_{CUR}"`, e.g. `{"USD_TRY": 3.52}`
    pub url: String,
}

/// Pushover delivery endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushoverConfig {
    #[serde(default = "default_pushover_url")]
    pub url: String,
}

fn default_pushover_url() -> String {
    "https://api.pushover.net/1/messages.json".to_string()
}

impl Default for PushoverConfig {
    fn default() -> Self {
        Self {
            url: default_pushover_url(),
        }
    }
}

/// HTTP status/control server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP server port (overridden by `PORT`)
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Root application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Currency conversion rates are quoted against (e.g. "USD")
    pub reference_currency: String,
    /// Source anchoring rebasing and cross pairs; the first source when omitted
    #[serde(default)]
    pub reference_source: Option<String>,
    /// Currencies deviations are computed in
    pub target_currencies: Vec<String>,
    /// Tracked symbols
    pub symbols: Vec<String>,
    /// Sources in evaluation order; the first quote per symbol is the reference
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub cross_pairs: Vec<CrossPair>,
    /// Thresholds in effect at startup
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    pub rates: RatesConfig,
    #[serde(default)]
    pub pushover: PushoverConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl AppConfig {
    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        if self.reference_currency.trim().is_empty() {
            return Err(AppError::Config(
                "reference_currency cannot be empty".to_string(),
            ));
        }

        // Rule: at least one source and one symbol
        if self.sources.is_empty() {
            return Err(AppError::Config(
                "Configuration must contain at least one source".to_string(),
            ));
        }
        if self.symbols.is_empty() {
            return Err(AppError::Config(
                "Configuration must track at least one symbol".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !names.insert(source.name.as_str()) {
                return Err(AppError::Config(format!(
                    "Duplicate source name '{}'",
                    source.name
                )));
            }
        }

        if let Some(reference) = &self.reference_source {
            if !names.contains(reference.as_str()) {
                return Err(AppError::Config(format!(
                    "reference_source '{}' is not a configured source",
                    reference
                )));
            }
        }

        for pair in &self.cross_pairs {
            if !names.contains(pair.source.as_str()) {
                return Err(AppError::Config(format!(
                    "Cross pair {}/{}: unknown source '{}'",
                    pair.base, pair.quote, pair.source
                )));
            }
            if pair.base == pair.quote {
                return Err(AppError::Config(format!(
                    "Cross pair on '{}': base and quote cannot both be {}",
                    pair.source, pair.base
                )));
            }
        }

        if self.rates.url.trim().is_empty() {
            return Err(AppError::Config("rates.url cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Name of the reference source
    pub fn reference_source_name(&self) -> &str {
        self.reference_source
            .as_deref()
            .or_else(|| self.sources.first().map(|s| s.name.as_str()))
            .unwrap_or_default()
    }

    /// Static inputs of the spread calculator
    pub fn calculator_settings(&self) -> CalculatorSettings {
        CalculatorSettings {
            reference_currency: self.reference_currency.clone(),
            reference_source: self.reference_source_name().to_string(),
            target_currencies: self.target_currencies.clone(),
            symbols: self.symbols.clone(),
            rebase_sources: self
                .sources
                .iter()
                .filter(|s| s.rebase)
                .map(|s| s.name.clone())
                .collect(),
            cross_pairs: self.cross_pairs.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
