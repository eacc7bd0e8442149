//! Rate normalization: re-denominates quotes into the currencies the
//! spread calculator compares in.
//!
//! Rates are expressed as units of a currency per one unit of the reference
//! currency (e.g. `TRY -> 3.52` means 1 USD = 3.52 TRY).
//!
//! A missing rate is NOT an error: the converted quote degrades to zero
//! prices. A zero reference ask yields no deviations for its symbol, while a
//! zero non-reference quote shows up as a -100% deviation.

use std::collections::HashMap;

use crate::core::types::Quote;

/// Conversion rates keyed by currency code
pub type Rates = HashMap<String, f64>;

/// Re-denominate `quote` into `target`.
///
/// - Already in `target`: passed through unchanged
/// - In the `reference` currency: both sides multiplied by `rates[target]`
///   (zero when the rate is absent)
/// - Any other currency: `None`, the quote does not take part in `target`
pub fn normalize_quote(quote: &Quote, target: &str, reference: &str, rates: &Rates) -> Option<Quote> {
    if quote.currency == target {
        return Some(quote.clone());
    }
    if quote.currency == reference {
        let rate = rates.get(target).copied().unwrap_or(0.0);
        return Some(quote.converted(target, rate));
    }
    None
}

/// Collect the quotes for `symbol` re-denominated in `target`, preserving
/// the order in which they appear in `quotes`.
pub fn normalized_list(
    quotes: &[Quote],
    symbol: &str,
    target: &str,
    reference: &str,
    rates: &Rates,
) -> Vec<Quote> {
    quotes
        .iter()
        .filter(|q| q.symbol == symbol)
        .filter_map(|q| normalize_quote(q, target, reference, rates))
        .collect()
}

/// Convert quotes from crypto-quoted sources into the reference currency.
///
/// A source listed in `rebase_sources` prices its markets in another asset
/// (e.g. DOGE in BTC). Such quotes are multiplied by the reference source's
/// ask for that asset in the reference currency; if the reference source has
/// no such quote the converted prices degrade to zero. Quotes from other
/// sources are returned unchanged.
pub fn rebase_quotes(
    quotes: &[Quote],
    reference_source: &str,
    reference_currency: &str,
    rebase_sources: &[String],
) -> Vec<Quote> {
    quotes
        .iter()
        .map(|q| {
            let needs_rebase = q.currency != reference_currency
                && rebase_sources.iter().any(|s| s == &q.source);
            if !needs_rebase {
                return q.clone();
            }
            let asset_ask = quotes
                .iter()
                .find(|r| {
                    r.source == reference_source
                        && r.symbol == q.currency
                        && r.currency == reference_currency
                })
                .map(|r| r.ask)
                .unwrap_or(0.0);
            q.converted(reference_currency, asset_ask)
        })
        .collect()
}

/// Target currencies that have no rate, for logging
pub fn missing_rates<'a>(targets: &'a [String], reference: &str, rates: &Rates) -> Vec<&'a str> {
    targets
        .iter()
        .filter(|t| t.as_str() != reference && !rates.contains_key(t.as_str()))
        .map(String::as_str)
        .collect()
}
