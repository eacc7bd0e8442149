//! Monitor: the shared context every task and handler works through
//!
//! Holds one lock per state group so the evaluation cycle, the rate refresh
//! task and the HTTP surface never contend on unrelated data:
//! - rates (`RwLock`), written hourly, read every cycle
//! - thresholds (`RwLock`), written by the control endpoint
//! - alert book (`Mutex`), touched only by the evaluation cycle
//! - snapshot (`RwLock`), replaced after every successful cycle

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::core::normalize::{missing_rates, Rates};
use crate::core::notifier::{AlertState, Notifier};
use crate::core::spread::{CalculatorSettings, Deviations, SpreadCalculator, Spreads};
use crate::core::thresholds::{ThresholdConfig, ThresholdPatch};
use crate::core::types::{AlertKey, DeviationKey, Quote};
use crate::error::Result;

/// Type alias for the monitor shared across tasks and handlers
pub type SharedMonitor = Arc<Monitor>;

/// Result of evaluating one batch of quotes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub deviations: Deviations,
    pub spreads: Spreads,
    /// Alert lines fired this cycle, in emission order
    pub alert_lines: Vec<String>,
}

/// Last successful cycle, as served by the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub updated_at: DateTime<Utc>,
    pub rates: BTreeMap<String, f64>,
    pub reference_prices: BTreeMap<String, f64>,
    #[serde(serialize_with = "display_keys")]
    pub deviations: Deviations,
    #[serde(serialize_with = "display_keys")]
    pub prices: BTreeMap<DeviationKey, f64>,
    #[serde(serialize_with = "display_keys")]
    pub spreads: Spreads,
}

/// JSON objects need string keys: structured keys are written with `Display`
fn display_keys<K, S>(map: &BTreeMap<K, f64>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    K: Display,
    S: Serializer,
{
    serializer.collect_map(map.iter().map(|(k, v)| (k.to_string(), v)))
}

pub struct Monitor {
    calculator: SpreadCalculator,
    rates: RwLock<Rates>,
    thresholds: RwLock<ThresholdConfig>,
    notifier: Mutex<Notifier>,
    snapshot: RwLock<Option<Snapshot>>,
}

impl Monitor {
    pub fn new(settings: CalculatorSettings, thresholds: ThresholdConfig) -> Self {
        Self {
            calculator: SpreadCalculator::new(settings),
            rates: RwLock::new(Rates::new()),
            thresholds: RwLock::new(thresholds),
            notifier: Mutex::new(Notifier::new()),
            snapshot: RwLock::new(None),
        }
    }

    pub fn into_shared(self) -> SharedMonitor {
        Arc::new(self)
    }

    /// Compute deviations and spreads for `quotes`, run the alert state
    /// machine at `now`, and publish the result as the new snapshot.
    pub async fn evaluate(&self, quotes: &[Quote], now: DateTime<Utc>) -> Evaluation {
        let rates = self.rates.read().await.clone();
        let settings = self.calculator.settings();
        let missing = missing_rates(&settings.target_currencies, &settings.reference_currency, &rates);
        if !missing.is_empty() {
            warn!(currencies = ?missing, "No conversion rate, quotes degrade to zero");
        }

        let report = self.calculator.calculate(quotes, &rates);
        let thresholds = *self.thresholds.read().await;

        let alert_lines = {
            let mut notifier = self.notifier.lock().await;
            notifier.evaluate(&report.deviations, &report.spreads, &thresholds, now)
        };

        debug!(
            quotes = quotes.len(),
            deviations = report.deviations.len(),
            spreads = report.spreads.len(),
            alerts = alert_lines.len(),
            "Cycle evaluated"
        );

        let snapshot = Snapshot {
            updated_at: now,
            rates: rates.into_iter().collect(),
            reference_prices: report.reference_prices,
            deviations: report.deviations.clone(),
            prices: report.prices,
            spreads: report.spreads.clone(),
        };
        *self.snapshot.write().await = Some(snapshot);

        Evaluation {
            deviations: report.deviations,
            spreads: report.spreads,
            alert_lines,
        }
    }

    /// Merge freshly fetched rates; currencies absent from `fresh` keep their
    /// previous value.
    pub async fn set_rates(&self, fresh: Rates) {
        let mut rates = self.rates.write().await;
        for (currency, rate) in fresh {
            rates.insert(currency, rate);
        }
        info!(rates = ?*rates, "Conversion rates updated");
    }

    pub async fn rates(&self) -> Rates {
        self.rates.read().await.clone()
    }

    /// Apply a partial threshold update, all or nothing, and return the
    /// configuration now in effect.
    pub async fn update_thresholds(&self, patch: &ThresholdPatch) -> Result<ThresholdConfig> {
        let mut thresholds = self.thresholds.write().await;
        thresholds.apply(patch)?;
        info!(
            min = thresholds.min_fiat_percent,
            max = thresholds.max_fiat_percent,
            pair_threshold = thresholds.pair_threshold,
            cooldown_minutes = thresholds.cooldown_minutes,
            fiat_enabled = thresholds.fiat_alerts_enabled,
            pair_enabled = thresholds.pair_alerts_enabled,
            "Thresholds updated"
        );
        Ok(*thresholds)
    }

    pub async fn thresholds(&self) -> ThresholdConfig {
        *self.thresholds.read().await
    }

    /// `None` until the first successful cycle
    pub async fn snapshot(&self) -> Option<Snapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn alert_state(&self, key: &AlertKey) -> Option<AlertState> {
        self.notifier.lock().await.state(key).copied()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
