//! Hysteresis alert state machine
//!
//! Every alert key is either armed (an alert fired and the value has not
//! come back yet) or disarmed. A disarmed key fires when its value crosses
//! the threshold and the cooldown since its last firing has elapsed; firing
//! arms it. An armed key disarms as soon as the value is back inside the
//! band. The cooldown gates firing only, never disarming.
//!
//! Two families are evaluated independently:
//! - fiat: one key per (source, symbol), over ask/bid deviations
//! - pair: one key per cross-pair direction or extremes spread (across
//!   sources for a symbol, or across symbols on a source)

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::core::spread::{Deviations, Spreads};
use crate::core::thresholds::ThresholdConfig;
use crate::core::types::{AlertKey, CrossDirection, Side, SpreadKey};

/// Armed flag and last firing time of one alert key
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlertState {
    pub armed: bool,
    /// `None` until the first firing; a never-fired key has no cooldown
    pub last_fired_at: Option<DateTime<Utc>>,
}

impl AlertState {
    pub fn cooldown_elapsed(&self, now: DateTime<Utc>, cooldown_minutes: f64) -> bool {
        match self.last_fired_at {
            None => true,
            Some(fired) => {
                let elapsed_minutes = (now - fired).num_milliseconds() as f64 / 60_000.0;
                elapsed_minutes >= cooldown_minutes
            }
        }
    }

    fn fire(&mut self, now: DateTime<Utc>) {
        self.armed = true;
        self.last_fired_at = Some(now);
    }
}

/// Alert book: one lazily created state per key, kept for the process lifetime
#[derive(Debug, Default)]
pub struct Notifier {
    states: HashMap<AlertKey, AlertState>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &AlertKey) -> Option<&AlertState> {
        self.states.get(key)
    }

    /// Number of keys seen so far
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Run both alert families and return the lines fired this cycle.
    ///
    /// Fiat lines come first (source, then symbol order), followed by pair
    /// lines in spread key order.
    pub fn evaluate(
        &mut self,
        deviations: &Deviations,
        spreads: &Spreads,
        thresholds: &ThresholdConfig,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let mut lines = Vec::new();
        if thresholds.fiat_alerts_enabled {
            self.evaluate_fiat(deviations, thresholds, now, &mut lines);
        }
        if thresholds.pair_alerts_enabled {
            self.evaluate_pairs(spreads, thresholds, now, &mut lines);
        }
        lines
    }

    fn evaluate_fiat(
        &mut self,
        deviations: &Deviations,
        thresholds: &ThresholdConfig,
        now: DateTime<Utc>,
        lines: &mut Vec<String>,
    ) {
        let mut pairs: BTreeMap<(&str, &str), (Option<f64>, Option<f64>)> = BTreeMap::new();
        for (key, &value) in deviations {
            let entry = pairs
                .entry((key.source.as_str(), key.symbol.as_str()))
                .or_default();
            match key.side {
                Side::Ask => entry.0 = Some(value),
                Side::Bid => entry.1 = Some(value),
            }
        }

        let min = thresholds.min_fiat_percent;
        let max = thresholds.max_fiat_percent;

        for ((source, symbol), sides) in pairs {
            let (Some(ask), Some(bid)) = sides else {
                continue;
            };
            // Crossed market: bad or inverted data, leave the state alone
            if bid > ask {
                debug!(source, symbol, ask, bid, "Crossed deviations, skipping");
                continue;
            }

            let key = AlertKey::Fiat {
                source: source.to_string(),
                symbol: symbol.to_string(),
            };
            let state = self.states.entry(key).or_default();

            if state.armed {
                if ask > min && bid < max {
                    state.armed = false;
                    debug!(source, symbol, ask, bid, "Fiat alert disarmed");
                }
            } else if state.cooldown_elapsed(now, thresholds.cooldown_minutes)
                && (ask <= min || bid >= max)
            {
                state.fire(now);
                let value = if ask <= min { ask } else { bid };
                info!(source, symbol, deviation = value, "Fiat alert fired");
                lines.push(format!("{} {} %{:.2}", source, symbol, value));
            }
        }
    }

    fn evaluate_pairs(
        &mut self,
        spreads: &Spreads,
        thresholds: &ThresholdConfig,
        now: DateTime<Utc>,
        lines: &mut Vec<String>,
    ) {
        let t = thresholds.pair_threshold;

        for (key, &value) in spreads {
            // Arm and disarm bands are not complements for extremes:
            // a value exactly at the threshold changes nothing
            let (fires, clears) = match key {
                SpreadKey::Cross { direction: CrossDirection::AskBid, .. } => (value <= -t, value > -t),
                SpreadKey::Cross { direction: CrossDirection::BidAsk, .. } => (value >= t, value < t),
                SpreadKey::Extremes { .. } | SpreadKey::SourceExtremes { .. } => (value > t, value < t),
            };

            let state = self.states.entry(AlertKey::Spread(key.clone())).or_default();

            if fires && !state.armed && state.cooldown_elapsed(now, thresholds.cooldown_minutes) {
                state.fire(now);
                info!(key = %key, spread = value, "Pair alert fired");
                lines.push(pair_line(key, value));
            }
            if clears && state.armed {
                state.armed = false;
                debug!(key = %key, spread = value, "Pair alert disarmed");
            }
        }
    }
}

fn pair_line(key: &SpreadKey, value: f64) -> String {
    match key {
        SpreadKey::Cross { .. } => format!("{} %{:.2}", key, value),
        SpreadKey::Extremes { symbol, min_source, max_source } => {
            format!("{} {} {} %{:.2}", symbol, min_source, max_source, value)
        }
        SpreadKey::SourceExtremes { source, min_symbol, max_symbol } => {
            format!("{} {} {} %{:.2}", source, min_symbol, max_symbol, value)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DeviationKey;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn fiat_on() -> ThresholdConfig {
        ThresholdConfig {
            min_fiat_percent: -1.0,
            max_fiat_percent: 3.0,
            cooldown_minutes: 10.0,
            fiat_alerts_enabled: true,
            ..Default::default()
        }
    }

    fn pair_on() -> ThresholdConfig {
        ThresholdConfig {
            pair_threshold: 1.0,
            cooldown_minutes: 10.0,
            pair_alerts_enabled: true,
            ..Default::default()
        }
    }

    fn devs(source: &str, symbol: &str, ask: f64, bid: f64) -> Deviations {
        let mut d = Deviations::new();
        d.insert(DeviationKey::new(source, symbol, Side::Ask), ask);
        d.insert(DeviationKey::new(source, symbol, Side::Bid), bid);
        d
    }

    fn fiat_key(source: &str, symbol: &str) -> AlertKey {
        AlertKey::Fiat {
            source: source.to_string(),
            symbol: symbol.to_string(),
        }
    }

    fn cross(direction: CrossDirection) -> SpreadKey {
        SpreadKey::Cross {
            source: "BTCTurk".to_string(),
            base: "ETH".to_string(),
            quote: "BTC".to_string(),
            direction,
        }
    }

    fn extremes() -> SpreadKey {
        SpreadKey::Extremes {
            symbol: "BTC".to_string(),
            min_source: "Paribu".to_string(),
            max_source: "Koineks".to_string(),
        }
    }

    fn source_extremes() -> SpreadKey {
        SpreadKey::SourceExtremes {
            source: "Paribu".to_string(),
            min_symbol: "BTC".to_string(),
            max_symbol: "ETH".to_string(),
        }
    }

    fn spreads(key: SpreadKey, value: f64) -> Spreads {
        let mut s = Spreads::new();
        s.insert(key, value);
        s
    }

    // =========================================================================
    // Fiat family
    // =========================================================================

    #[test]
    fn test_fiat_arms_then_disarms() {
        let mut n = Notifier::new();
        let cfg = fiat_on();

        let lines = n.evaluate(&devs("Paribu", "BTC", -2.0, -2.5), &Spreads::new(), &cfg, t0());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("-2.00"), "Got: {}", lines[0]);
        assert_eq!(lines[0], "Paribu BTC %-2.00");
        let state = n.state(&fiat_key("Paribu", "BTC")).unwrap();
        assert!(state.armed);
        assert_eq!(state.last_fired_at, Some(t0()));

        // Back inside the band: ask 0.5 > -1.0, bid 0.2 < 3.0
        let later = t0() + Duration::seconds(5);
        let lines = n.evaluate(&devs("Paribu", "BTC", 0.5, 0.2), &Spreads::new(), &cfg, later);
        assert!(lines.is_empty());
        let state = n.state(&fiat_key("Paribu", "BTC")).unwrap();
        assert!(!state.armed);
        assert_eq!(state.last_fired_at, Some(t0()), "disarm keeps the firing time");
    }

    #[test]
    fn test_fiat_bid_trigger_reports_bid() {
        let mut n = Notifier::new();
        let lines = n.evaluate(&devs("BTCTurk", "ETH", 4.0, 3.5), &Spreads::new(), &fiat_on(), t0());
        assert_eq!(lines, vec!["BTCTurk ETH %3.50".to_string()]);
    }

    #[test]
    fn test_fiat_ask_takes_priority_when_both_qualify() {
        let mut n = Notifier::new();
        // Inverted band: both conditions hold, bid <= ask
        let cfg = ThresholdConfig {
            min_fiat_percent: 5.0,
            max_fiat_percent: -5.0,
            ..fiat_on()
        };
        let lines = n.evaluate(&devs("Koinim", "LTC", 1.25, 0.75), &Spreads::new(), &cfg, t0());
        assert_eq!(lines, vec!["Koinim LTC %1.25".to_string()]);
    }

    #[test]
    fn test_fiat_cooldown_blocks_refire() {
        let mut n = Notifier::new();
        let cfg = fiat_on();
        let trigger = devs("Paribu", "BTC", -2.0, -2.5);
        let calm = devs("Paribu", "BTC", 0.5, 0.2);

        assert_eq!(n.evaluate(&trigger, &Spreads::new(), &cfg, t0()).len(), 1);
        // Disarm, then qualify again within the cooldown
        n.evaluate(&calm, &Spreads::new(), &cfg, t0() + Duration::minutes(1));
        let lines = n.evaluate(&trigger, &Spreads::new(), &cfg, t0() + Duration::minutes(9));
        assert!(lines.is_empty(), "cooldown not elapsed: must not emit");
        assert!(!n.state(&fiat_key("Paribu", "BTC")).unwrap().armed, "must not arm");

        // Exactly at the cooldown boundary it fires
        let lines = n.evaluate(&trigger, &Spreads::new(), &cfg, t0() + Duration::minutes(10));
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_fiat_disarm_ignores_cooldown() {
        let mut n = Notifier::new();
        let cfg = fiat_on();
        n.evaluate(&devs("Paribu", "BTC", -2.0, -2.5), &Spreads::new(), &cfg, t0());
        n.evaluate(&devs("Paribu", "BTC", 0.0, -0.1), &Spreads::new(), &cfg, t0() + Duration::seconds(1));
        assert!(!n.state(&fiat_key("Paribu", "BTC")).unwrap().armed);
    }

    #[test]
    fn test_fiat_armed_stays_silent_while_outside_band() {
        let mut n = Notifier::new();
        let cfg = fiat_on();
        let trigger = devs("Paribu", "BTC", -2.0, -2.5);
        assert_eq!(n.evaluate(&trigger, &Spreads::new(), &cfg, t0()).len(), 1);
        let lines = n.evaluate(&trigger, &Spreads::new(), &cfg, t0() + Duration::hours(2));
        assert!(lines.is_empty(), "armed alert never repeats");
    }

    #[test]
    fn test_fiat_crossed_market_is_skipped_entirely() {
        let mut n = Notifier::new();
        let cfg = fiat_on();

        // Would qualify (ask <= min) but bid > ask
        let lines = n.evaluate(&devs("Paribu", "BTC", -2.0, -1.5), &Spreads::new(), &cfg, t0());
        assert!(lines.is_empty());
        assert!(n.state(&fiat_key("Paribu", "BTC")).is_none(), "no state touched");

        // Armed key is not disarmed by crossed data either
        n.evaluate(&devs("Paribu", "BTC", -2.0, -2.5), &Spreads::new(), &cfg, t0());
        n.evaluate(&devs("Paribu", "BTC", 0.5, 0.7), &Spreads::new(), &cfg, t0() + Duration::seconds(5));
        assert!(n.state(&fiat_key("Paribu", "BTC")).unwrap().armed);
    }

    #[test]
    fn test_fiat_disabled_does_nothing() {
        let mut n = Notifier::new();
        let cfg = ThresholdConfig {
            fiat_alerts_enabled: false,
            ..fiat_on()
        };
        let lines = n.evaluate(&devs("Paribu", "BTC", -2.0, -2.5), &Spreads::new(), &cfg, t0());
        assert!(lines.is_empty());
        assert!(n.is_empty());
    }

    #[test]
    fn test_fiat_needs_both_sides() {
        let mut n = Notifier::new();
        let mut d = Deviations::new();
        d.insert(DeviationKey::new("Paribu", "BTC", Side::Ask), -5.0);
        assert!(n.evaluate(&d, &Spreads::new(), &fiat_on(), t0()).is_empty());
    }

    #[test]
    fn test_fiat_lines_ordered_by_source_then_symbol() {
        let mut n = Notifier::new();
        let mut d = devs("Paribu", "ETH", -3.0, -3.5);
        d.extend(devs("BTCTurk", "XRP", -4.0, -4.5));
        d.extend(devs("Paribu", "BTC", 5.0, 4.0));
        let lines = n.evaluate(&d, &Spreads::new(), &fiat_on(), t0());
        assert_eq!(
            lines,
            vec![
                "BTCTurk XRP %-4.00".to_string(),
                "Paribu BTC %4.00".to_string(),
                "Paribu ETH %-3.00".to_string(),
            ]
        );
    }

    // =========================================================================
    // Pair family
    // =========================================================================

    #[test]
    fn test_ask_bid_fires_on_negative_threshold() {
        let mut n = Notifier::new();
        let cfg = pair_on();

        let lines = n.evaluate(&Deviations::new(), &spreads(cross(CrossDirection::AskBid), -1.0), &cfg, t0());
        assert_eq!(lines, vec!["BTCTurk-ETHBTC-AskBid %-1.00".to_string()]);

        // -0.99 > -1.0: disarm
        n.evaluate(&Deviations::new(), &spreads(cross(CrossDirection::AskBid), -0.99), &cfg, t0());
        let key = AlertKey::Spread(cross(CrossDirection::AskBid));
        assert!(!n.state(&key).unwrap().armed);
    }

    #[test]
    fn test_ask_bid_positive_spread_never_fires() {
        let mut n = Notifier::new();
        let lines = n.evaluate(&Deviations::new(), &spreads(cross(CrossDirection::AskBid), 5.0), &pair_on(), t0());
        assert!(lines.is_empty());
    }

    #[test]
    fn test_bid_ask_fires_on_positive_threshold() {
        let mut n = Notifier::new();
        let cfg = pair_on();
        let key = AlertKey::Spread(cross(CrossDirection::BidAsk));

        let lines = n.evaluate(&Deviations::new(), &spreads(cross(CrossDirection::BidAsk), 1.0), &cfg, t0());
        assert_eq!(lines, vec!["BTCTurk-ETHBTC-BidAsk %1.00".to_string()]);
        assert!(n.state(&key).unwrap().armed);

        n.evaluate(&Deviations::new(), &spreads(cross(CrossDirection::BidAsk), 0.99), &cfg, t0());
        assert!(!n.state(&key).unwrap().armed);
    }

    #[test]
    fn test_pair_disarm_regardless_of_cooldown() {
        let mut n = Notifier::new();
        let cfg = pair_on();
        let key = AlertKey::Spread(cross(CrossDirection::BidAsk));

        n.evaluate(&Deviations::new(), &spreads(cross(CrossDirection::BidAsk), 2.0), &cfg, t0());
        n.evaluate(&Deviations::new(), &spreads(cross(CrossDirection::BidAsk), 0.0), &cfg, t0() + Duration::seconds(5));
        assert!(!n.state(&key).unwrap().armed);

        // Qualifies again, cooldown still running: silent
        let lines = n.evaluate(&Deviations::new(), &spreads(cross(CrossDirection::BidAsk), 2.0), &cfg, t0() + Duration::minutes(3));
        assert!(lines.is_empty());
    }

    #[test]
    fn test_extremes_fire_and_line_format() {
        let mut n = Notifier::new();
        let lines = n.evaluate(&Deviations::new(), &spreads(extremes(), 1.75), &pair_on(), t0());
        assert_eq!(lines, vec!["BTC Paribu Koineks %1.75".to_string()]);
    }

    #[test]
    fn test_extremes_exact_threshold_changes_nothing() {
        // Arm needs > T and disarm needs < T: T itself is a dead point.
        // Kept as-is pending product decision on >=/<= symmetry.
        let cfg = pair_on();
        let key = AlertKey::Spread(extremes());

        // Disarmed stays disarmed, no emission
        let mut n = Notifier::new();
        let lines = n.evaluate(&Deviations::new(), &spreads(extremes(), 1.0), &cfg, t0());
        assert!(lines.is_empty());
        assert!(!n.state(&key).unwrap().armed);

        // Armed stays armed
        let mut n = Notifier::new();
        n.evaluate(&Deviations::new(), &spreads(extremes(), 1.5), &cfg, t0());
        n.evaluate(&Deviations::new(), &spreads(extremes(), 1.0), &cfg, t0() + Duration::seconds(5));
        assert!(n.state(&key).unwrap().armed);

        n.evaluate(&Deviations::new(), &spreads(extremes(), 0.99), &cfg, t0() + Duration::seconds(10));
        assert!(!n.state(&key).unwrap().armed);
    }

    #[test]
    fn test_source_extremes_fire_with_source_first_line() {
        let mut n = Notifier::new();
        let lines = n.evaluate(&Deviations::new(), &spreads(source_extremes(), 3.5), &pair_on(), t0());
        assert_eq!(lines, vec!["Paribu BTC ETH %3.50".to_string()]);
        assert!(n.state(&AlertKey::Spread(source_extremes())).unwrap().armed);
    }

    #[test]
    fn test_source_extremes_hysteresis_and_cooldown() {
        let mut n = Notifier::new();
        let cfg = pair_on();
        let key = AlertKey::Spread(source_extremes());

        n.evaluate(&Deviations::new(), &spreads(source_extremes(), 2.0), &cfg, t0());
        // At the threshold: neither arms nor disarms
        n.evaluate(&Deviations::new(), &spreads(source_extremes(), 1.0), &cfg, t0() + Duration::seconds(5));
        assert!(n.state(&key).unwrap().armed);

        n.evaluate(&Deviations::new(), &spreads(source_extremes(), 0.5), &cfg, t0() + Duration::seconds(10));
        assert!(!n.state(&key).unwrap().armed);

        let lines = n.evaluate(&Deviations::new(), &spreads(source_extremes(), 2.0), &cfg, t0() + Duration::minutes(5));
        assert!(lines.is_empty(), "cooldown still running");
        let lines = n.evaluate(&Deviations::new(), &spreads(source_extremes(), 2.0), &cfg, t0() + Duration::minutes(10));
        assert_eq!(lines, vec!["Paribu BTC ETH %2.00".to_string()]);
    }

    #[test]
    fn test_pair_lines_follow_spread_key_order() {
        let mut n = Notifier::new();
        let mut s = spreads(source_extremes(), 2.0);
        s.insert(extremes(), 2.5);
        s.insert(cross(CrossDirection::BidAsk), 1.5);
        let lines = n.evaluate(&Deviations::new(), &s, &pair_on(), t0());
        assert_eq!(
            lines,
            vec![
                "BTCTurk-ETHBTC-BidAsk %1.50".to_string(),
                "BTC Paribu Koineks %2.50".to_string(),
                "Paribu BTC ETH %2.00".to_string(),
            ]
        );
    }

    #[test]
    fn test_pair_disabled_does_nothing() {
        let mut n = Notifier::new();
        let cfg = ThresholdConfig {
            pair_alerts_enabled: false,
            ..pair_on()
        };
        assert!(n.evaluate(&Deviations::new(), &spreads(extremes(), 9.0), &cfg, t0()).is_empty());
        assert!(n.is_empty());
    }

    #[test]
    fn test_families_are_independent() {
        let mut n = Notifier::new();
        let cfg = ThresholdConfig {
            fiat_alerts_enabled: true,
            pair_alerts_enabled: true,
            ..Default::default()
        };
        let lines = n.evaluate(
            &devs("Paribu", "BTC", -2.0, -2.5),
            &spreads(extremes(), 3.0),
            &cfg,
            t0(),
        );
        assert_eq!(
            lines,
            vec!["Paribu BTC %-2.00".to_string(), "BTC Paribu Koineks %3.00".to_string()]
        );
        assert_eq!(n.len(), 2);
    }

    #[test]
    fn test_cooldown_elapsed_fractional_minutes() {
        let state = AlertState {
            armed: false,
            last_fired_at: Some(t0()),
        };
        assert!(!state.cooldown_elapsed(t0() + Duration::seconds(29), 0.5));
        assert!(state.cooldown_elapsed(t0() + Duration::seconds(30), 0.5));
        assert!(AlertState::default().cooldown_elapsed(t0(), 1e9));
    }
}
