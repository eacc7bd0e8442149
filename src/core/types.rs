//! Shared domain types: quotes and the structured keys used by the
//! spread calculator and the notification state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A best bid/ask quote for one symbol on one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Source name (e.g. "Gdax", "BTCTurk")
    pub source: String,
    /// Currency the prices are denominated in (e.g. "USD", "TRY", "BTC")
    pub currency: String,
    /// Asset symbol (e.g. "BTC", "ETH")
    pub symbol: String,
    pub ask: f64,
    pub bid: f64,
}

impl Quote {
    pub fn new(
        source: impl Into<String>,
        currency: impl Into<String>,
        symbol: impl Into<String>,
        ask: f64,
        bid: f64,
    ) -> Self {
        Self {
            source: source.into(),
            currency: currency.into(),
            symbol: symbol.into(),
            ask,
            bid,
        }
    }

    /// Copy of this quote re-denominated in `currency` with both sides scaled by `rate`
    pub fn converted(&self, currency: &str, rate: f64) -> Self {
        Self {
            source: self.source.clone(),
            currency: currency.to_string(),
            symbol: self.symbol.clone(),
            ask: self.ask * rate,
            bid: self.bid * rate,
        }
    }
}

/// Quote side
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Ask,
    Bid,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Ask => write!(f, "Ask"),
            Side::Bid => write!(f, "Bid"),
        }
    }
}

/// Key of a per-source, per-symbol deviation from the reference quote
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviationKey {
    pub source: String,
    pub symbol: String,
    pub side: Side,
}

impl DeviationKey {
    pub fn new(source: impl Into<String>, symbol: impl Into<String>, side: Side) -> Self {
        Self {
            source: source.into(),
            symbol: symbol.into(),
            side,
        }
    }
}

impl fmt::Display for DeviationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.source, self.symbol, self.side)
    }
}

/// Which legs an implied cross rate was built from
///
/// - `AskBid`: base ask over quote bid (the expensive side of the cross)
/// - `BidAsk`: base bid over quote ask (the cheap side of the cross)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CrossDirection {
    AskBid,
    BidAsk,
}

impl fmt::Display for CrossDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossDirection::AskBid => write!(f, "AskBid"),
            CrossDirection::BidAsk => write!(f, "BidAsk"),
        }
    }
}

/// Key of a spread evaluated by the pair alert family
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpreadKey {
    /// Implied `base/quote` rate on `source` against the reference market
    Cross {
        source: String,
        base: String,
        quote: String,
        direction: CrossDirection,
    },
    /// Cheapest-ask source versus richest-bid source for one symbol
    Extremes {
        symbol: String,
        min_source: String,
        max_source: String,
    },
    /// Cheapest-ask symbol versus richest-bid symbol on one source
    SourceExtremes {
        source: String,
        min_symbol: String,
        max_symbol: String,
    },
}

impl fmt::Display for SpreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpreadKey::Cross { source, base, quote, direction } => {
                write!(f, "{}-{}{}-{}", source, base, quote, direction)
            }
            SpreadKey::Extremes { symbol, min_source, max_source } => {
                write!(f, "{}-{}-{}", symbol, min_source, max_source)
            }
            SpreadKey::SourceExtremes { source, min_symbol, max_symbol } => {
                write!(f, "{}-{}-{}", source, min_symbol, max_symbol)
            }
        }
    }
}

/// Key of one armed/disarmed alert
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertKey {
    Fiat { source: String, symbol: String },
    Spread(SpreadKey),
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKey::Fiat { source, symbol } => write!(f, "{}-{}", source, symbol),
            AlertKey::Spread(key) => write!(f, "{}", key),
        }
    }
}
