//! Shared money math for report calculations.
//!
//! Every ratio in the engine routes through these helpers so zero
//! denominators collapse to zero instead of surfacing as NaN, infinity,
//! or an error. Percentages are returned unrounded; currency amounts are
//! rounded only when they land on a result model.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::constants::DISPLAY_DECIMAL_PRECISION;

/// Round a currency amount to cents, half-up.
///
/// Uses midpoint-away-from-zero so `10.005` rounds to `10.01` and
/// `-10.005` to `-10.01`, matching how statements present money.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(
        DISPLAY_DECIMAL_PRECISION,
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// Percentage that `part` represents of `whole`.
///
/// Returns zero when the whole is zero. The result is unrounded;
/// display rounding is the caller's concern.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole == Decimal::ZERO {
        return Decimal::ZERO;
    }
    part / whole * dec!(100)
}

/// Weighted average over `(value, weight)` pairs.
///
/// Returns zero when the total weight is zero.
pub fn weighted_average(pairs: &[(Decimal, Decimal)]) -> Decimal {
    let total_weight: Decimal = pairs.iter().map(|(_, weight)| *weight).sum();
    if total_weight == Decimal::ZERO {
        return Decimal::ZERO;
    }
    let weighted_sum: Decimal = pairs.iter().map(|(value, weight)| value * weight).sum();
    weighted_sum / total_weight
}

/// Treat a missing amount as zero.
///
/// The single place where optional monetary fields (expense template
/// entries, loan figures, operating parameters) default to zero.
pub fn coalesce(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO)
}
