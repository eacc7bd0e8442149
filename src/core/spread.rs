//! Spread calculation engine
//!
//! Turns one batch of quotes into:
//! - per-source, per-symbol deviations from the symbol's reference quote
//! - implied cross-rate spreads on a single source against the reference market
//! - cheapest-ask vs richest-bid spreads across sources for each symbol
//! - cheapest-ask vs richest-bid spreads across symbols on each source
//!
//! # Reference quote
//! Quotes are grouped per symbol and per target currency **in the order they
//! were received**. The first quote of each group is the reference; sources
//! are never re-sorted. Both sides of every other quote are measured against
//! the reference **ask**, so a single price is the common basis.
//!
//! # Totality
//! Missing data never raises: a symbol without quotes, or whose reference
//! ask is zero, simply contributes nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::normalize::{normalized_list, rebase_quotes, Rates};
use crate::core::rounding::round_percent;
use crate::core::types::{CrossDirection, DeviationKey, Quote, Side, SpreadKey};

/// Deviations in percent, keyed by (source, symbol, side)
pub type Deviations = BTreeMap<DeviationKey, f64>;

/// Pair-family spreads in percent
pub type Spreads = BTreeMap<SpreadKey, f64>;

/// Implied `base/quote` cross rate to watch on one source
///
/// The source must quote both `base` and `quote` in the same currency; the
/// reference source must list `base` directly priced in `quote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossPair {
    pub source: String,
    pub base: String,
    pub quote: String,
}

/// Static inputs of the calculator, derived from configuration
#[derive(Debug, Clone, Default)]
pub struct CalculatorSettings {
    /// Currency rates are quoted against (e.g. "USD")
    pub reference_currency: String,
    /// Source whose quotes anchor rebasing and cross pairs
    pub reference_source: String,
    /// Currencies deviations are computed in (e.g. ["TRY", "JPY"])
    pub target_currencies: Vec<String>,
    /// Tracked symbols, in display order
    pub symbols: Vec<String>,
    /// Sources whose markets are priced in another asset
    pub rebase_sources: Vec<String>,
    pub cross_pairs: Vec<CrossPair>,
}

/// Output of one calculation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpreadReport {
    pub deviations: Deviations,
    /// Cross-pair and extremes spreads, evaluated by the pair alert family
    pub spreads: Spreads,
    /// Normalized prices of every non-reference quote
    pub prices: BTreeMap<DeviationKey, f64>,
    /// Reference source ask per symbol in the reference currency
    pub reference_prices: BTreeMap<String, f64>,
}

/// Spread calculator over a fixed symbol/currency layout
#[derive(Debug, Clone)]
pub struct SpreadCalculator {
    settings: CalculatorSettings,
}

impl SpreadCalculator {
    pub fn new(settings: CalculatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CalculatorSettings {
        &self.settings
    }

    /// Signed percent change of `price` from `reference_ask`, rounded.
    ///
    /// `(price - reference_ask) * 100 / reference_ask`
    ///
    /// Returns `None` for a zero (or non-finite) reference, never NaN/Inf.
    #[inline]
    pub fn percent_change(price: f64, reference_ask: f64) -> Option<f64> {
        if reference_ask == 0.0 || !reference_ask.is_finite() {
            return None;
        }
        let pct = (price - reference_ask) * 100.0 / reference_ask;
        pct.is_finite().then(|| round_percent(pct))
    }

    /// Compute every deviation and spread for one batch of quotes.
    ///
    /// `quotes` must be in source order, reference source first.
    #[must_use]
    pub fn calculate(&self, quotes: &[Quote], rates: &Rates) -> SpreadReport {
        let s = &self.settings;
        let mut report = SpreadReport::default();

        let rebased = rebase_quotes(quotes, &s.reference_source, &s.reference_currency, &s.rebase_sources);

        for symbol in &s.symbols {
            if let Some(reference) = rebased.iter().find(|q| {
                q.source == s.reference_source
                    && q.symbol == *symbol
                    && q.currency == s.reference_currency
            }) {
                report.reference_prices.insert(symbol.clone(), reference.ask);
            }

            for target in &s.target_currencies {
                let list = normalized_list(&rebased, symbol, target, &s.reference_currency, rates);
                Self::symbol_deviations(&list, &mut report);
            }
        }

        for pair in &s.cross_pairs {
            self.cross_spreads(quotes, pair, &mut report);
        }

        for symbol in &s.symbols {
            Self::extremes(symbol, &mut report);
        }
        Self::source_extremes(&mut report);

        report
    }

    /// Deviations of every quote after the first against the first one's ask
    fn symbol_deviations(list: &[Quote], report: &mut SpreadReport) {
        let Some((reference, rest)) = list.split_first() else {
            return;
        };

        for p in rest {
            let ask = Self::percent_change(p.ask, reference.ask);
            let bid = Self::percent_change(p.bid, reference.ask);
            let (Some(ask), Some(bid)) = (ask, bid) else {
                // Zero reference ask: no data for this symbol
                return;
            };

            let ask_key = DeviationKey::new(&p.source, &p.symbol, Side::Ask);
            let bid_key = DeviationKey::new(&p.source, &p.symbol, Side::Bid);
            report.deviations.insert(ask_key.clone(), ask);
            report.deviations.insert(bid_key.clone(), bid);
            report.prices.insert(ask_key, p.ask);
            report.prices.insert(bid_key, p.bid);
        }
    }

    /// Implied cross rates on `pair.source` against the reference market ask
    fn cross_spreads(&self, quotes: &[Quote], pair: &CrossPair, report: &mut SpreadReport) {
        let reference = quotes.iter().find(|q| {
            q.source == self.settings.reference_source && q.symbol == pair.base && q.currency == pair.quote
        });
        let base_leg = quotes.iter().find(|q| q.source == pair.source && q.symbol == pair.base);
        let (Some(reference), Some(base_leg)) = (reference, base_leg) else {
            return;
        };
        let Some(quote_leg) = quotes.iter().find(|q| {
            q.source == pair.source && q.symbol == pair.quote && q.currency == base_leg.currency
        }) else {
            return;
        };

        let legs = [
            (CrossDirection::AskBid, base_leg.ask, quote_leg.bid),
            (CrossDirection::BidAsk, base_leg.bid, quote_leg.ask),
        ];
        for (direction, numerator, denominator) in legs {
            if denominator == 0.0 {
                continue;
            }
            if let Some(spread) = Self::percent_change(numerator / denominator, reference.ask) {
                let key = SpreadKey::Cross {
                    source: pair.source.clone(),
                    base: pair.base.clone(),
                    quote: pair.quote.clone(),
                    direction,
                };
                report.spreads.insert(key, spread);
            }
        }
    }

    /// Cheapest-ask source versus richest-bid source for `symbol`
    fn extremes(symbol: &str, report: &mut SpreadReport) {
        let mut min_ask: Option<(&str, f64)> = None;
        let mut max_bid: Option<(&str, f64)> = None;

        for (key, &value) in report.deviations.iter().filter(|(k, _)| k.symbol == symbol) {
            match key.side {
                Side::Ask => {
                    if min_ask.map_or(true, |(_, v)| value < v) {
                        min_ask = Some((key.source.as_str(), value));
                    }
                }
                Side::Bid => {
                    if max_bid.map_or(true, |(_, v)| value > v) {
                        max_bid = Some((key.source.as_str(), value));
                    }
                }
            }
        }

        let (Some((min_source, min_ask)), Some((max_source, max_bid))) = (min_ask, max_bid) else {
            return;
        };
        if min_source == max_source {
            return;
        }

        let key = SpreadKey::Extremes {
            symbol: symbol.to_string(),
            min_source: min_source.to_string(),
            max_source: max_source.to_string(),
        };
        report.spreads.insert(key, round_percent(max_bid - min_ask));
    }

    /// Cheapest-ask symbol versus richest-bid symbol on every source
    fn source_extremes(report: &mut SpreadReport) {
        let mut per_source: BTreeMap<&str, (Option<(&str, f64)>, Option<(&str, f64)>)> = BTreeMap::new();

        for (key, &value) in &report.deviations {
            let (min_ask, max_bid) = per_source.entry(key.source.as_str()).or_default();
            match key.side {
                Side::Ask => {
                    if min_ask.map_or(true, |(_, v)| value < v) {
                        *min_ask = Some((key.symbol.as_str(), value));
                    }
                }
                Side::Bid => {
                    if max_bid.map_or(true, |(_, v)| value > v) {
                        *max_bid = Some((key.symbol.as_str(), value));
                    }
                }
            }
        }

        for (source, extremes) in per_source {
            let (Some((min_symbol, min_ask)), Some((max_symbol, max_bid))) = extremes else {
                continue;
            };
            if min_symbol == max_symbol {
                continue;
            }
            let key = SpreadKey::SourceExtremes {
                source: source.to_string(),
                min_symbol: min_symbol.to_string(),
                max_symbol: max_symbol.to_string(),
            };
            report.spreads.insert(key, round_percent(max_bid - min_ask));
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
