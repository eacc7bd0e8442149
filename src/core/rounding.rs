//! Decimal rounding used by every percentage computation
//!
//! Rounding works on the *computed* scaled value: `1.005 * 100` is
//! `100.49999999999999` in binary floating point, so `round(1.005, 0.5, 2)`
//! yields `1.00`, not the decimal-ideal `1.01`.

/// Fraction at or above which a scaled value is rounded away from zero
pub const ROUND_ON: f64 = 0.5;

/// Number of decimal places kept for percentages
pub const PERCENT_PLACES: i32 = 2;

/// Round `value` to `places` decimals, rounding away from zero when the
/// fractional part of the scaled magnitude is `>= round_on`.
///
/// The rule is applied to the magnitude and the sign restored afterwards, so
/// negative values mirror positive ones and the function is idempotent.
#[inline]
pub fn round(value: f64, round_on: f64, places: i32) -> f64 {
    let pow = 10f64.powi(places);
    let digit = pow * value.abs();
    let rounded = if digit.fract() >= round_on {
        digit.ceil()
    } else {
        digit.floor()
    };
    let magnitude = rounded / pow;

    if magnitude == 0.0 {
        0.0
    } else if value.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    }
}

/// Round a percentage with the standard half-up rule at two places
#[inline]
pub fn round_percent(value: f64) -> f64 {
    round(value, ROUND_ON, PERCENT_PLACES)
}
