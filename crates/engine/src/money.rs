//! Monetary rounding shared by the allocator and the settlement engine.
//!
//! Amounts are currency-agnostic `f64` values rounded to 2 decimal places.
//! Every place the engine computes money goes through [`round2`]; the rounding
//! convention is never reimplemented inline.

/// Threshold below which a residual balance is treated as settled.
///
/// Rounding per-head shares to cents leaves residues smaller than one cent;
/// transfers below this value are noise, not debt.
pub const SETTLE_EPSILON: f64 = 0.01;

/// Rounds to 2 decimal places, half away from zero.
///
/// A machine-epsilon bias is added before scaling so values sitting exactly on
/// a half-cent boundary after binary-float representation (e.g. `1.005`) round
/// up instead of truncating down.
///
/// # Examples
///
/// ```rust
/// use engine::round2;
///
/// assert_eq!(round2(10.0 / 3.0), 3.33);
/// assert_eq!(round2(1.005), 1.01);
/// assert_eq!(round2(-2.675), -2.68);
/// ```
#[must_use]
pub fn round2(value: f64) -> f64 {
    let biased = if value.is_sign_negative() {
        value - f64::EPSILON
    } else {
        value + f64::EPSILON
    };
    (biased * 100.0).round() / 100.0
}

/// Formats an amount with 2 decimals for activity messages and prompts.
#[must_use]
pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}
