//! Alert thresholds and partial updates from the control surface

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Thresholds consulted by the notification state machine on every cycle
///
/// No validation beyond number parsing: a minimum above the maximum is
/// accepted as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Fiat alert fires when ask deviation <= this (percent, e.g. -1.0)
    pub min_fiat_percent: f64,
    /// Fiat alert fires when bid deviation >= this (percent, e.g. 3.0)
    pub max_fiat_percent: f64,
    /// Magnitude for cross-pair and extremes alerts (percent)
    pub pair_threshold: f64,
    /// Minimum minutes between two firings of the same alert
    pub cooldown_minutes: f64,
    pub fiat_alerts_enabled: bool,
    pub pair_alerts_enabled: bool,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_fiat_percent: -1.0,
            max_fiat_percent: 3.0,
            pair_threshold: 1.0,
            cooldown_minutes: 10.0,
            fiat_alerts_enabled: false,
            pair_alerts_enabled: false,
        }
    }
}

/// Partial update as received from the control endpoint query string
///
/// Numeric fields: absent or empty keeps the current value.
/// Boolean fields: only the token `"true"` enables; anything else,
/// including absence, disables.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ThresholdPatch {
    pub minimum: Option<String>,
    pub maximum: Option<String>,
    pub duration: Option<String>,
    #[serde(rename = "pThreshold")]
    pub p_threshold: Option<String>,
    #[serde(rename = "fiatEnable")]
    pub fiat_enable: Option<String>,
    #[serde(rename = "pairEnable")]
    pub pair_enable: Option<String>,
}

impl ThresholdConfig {
    /// Apply `patch`, all or nothing.
    ///
    /// Every numeric field is parsed before anything is written, so a
    /// malformed value leaves the whole configuration untouched.
    pub fn apply(&mut self, patch: &ThresholdPatch) -> Result<(), AppError> {
        let minimum = parse_number("minimum", patch.minimum.as_deref())?;
        let maximum = parse_number("maximum", patch.maximum.as_deref())?;
        let duration = parse_number("duration", patch.duration.as_deref())?;
        let p_threshold = parse_number("pThreshold", patch.p_threshold.as_deref())?;

        if let Some(v) = minimum {
            self.min_fiat_percent = v;
        }
        if let Some(v) = maximum {
            self.max_fiat_percent = v;
        }
        if let Some(v) = duration {
            self.cooldown_minutes = v;
        }
        if let Some(v) = p_threshold {
            self.pair_threshold = v;
        }
        self.fiat_alerts_enabled = parse_flag(patch.fiat_enable.as_deref());
        self.pair_alerts_enabled = parse_flag(patch.pair_enable.as_deref());

        Ok(())
    }
}

fn parse_number(field: &'static str, raw: Option<&str>) -> Result<Option<f64>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|e| AppError::InvalidThreshold {
                field,
                reason: format!("'{}': {}", s, e),
            }),
    }
}

/// Absent and unrecognized tokens both mean disabled
fn parse_flag(raw: Option<&str>) -> bool {
    matches!(raw, Some("true"))
}
