//! Core module - normalization, spread calculation, alert state machine, runtime
//!
//! This module uses **explicit re-exports** instead of glob exports (`pub use module::*`)
//! to provide better API visibility and prevent accidental public API changes.
//!
//! ## Usage
//! Prefer importing from `crate::core`:
//! ```ignore
//! use crate::core::{Monitor, SpreadCalculator, ThresholdConfig};
//! ```

pub mod composer;
pub mod monitor;
pub mod normalize;
pub mod notifier;
pub mod rounding;
pub mod runtime;
pub mod spread;
pub mod thresholds;
pub mod types;

// Explicit re-exports for rounding module
pub use rounding::{round, round_percent, PERCENT_PLACES, ROUND_ON};

// Explicit re-exports for types module
pub use types::{AlertKey, CrossDirection, DeviationKey, Quote, Side, SpreadKey};

// Explicit re-exports for normalize module
pub use normalize::{normalize_quote, normalized_list, rebase_quotes, Rates};

// Explicit re-exports for spread module
pub use spread::{CalculatorSettings, CrossPair, Deviations, SpreadCalculator, SpreadReport, Spreads};

// Explicit re-exports for thresholds and notifier modules
pub use notifier::{AlertState, Notifier};
pub use thresholds::{ThresholdConfig, ThresholdPatch};

// Explicit re-exports for composer, monitor and runtime modules
pub use composer::compose;
pub use monitor::{Evaluation, Monitor, SharedMonitor, Snapshot};
pub use runtime::{cycle_task, fetch_all, rates_task, refresh_rates, run_cycle};
