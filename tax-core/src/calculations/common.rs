//! Small decimal helpers shared by the calculator, scenarios and suggestions.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps negative values to zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::floor_zero;
///
/// assert_eq!(floor_zero(dec!(-10)), dec!(0));
/// assert_eq!(floor_zero(dec!(10)), dec!(10));
/// ```
pub fn floor_zero(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// `a - b`, floored at zero.
pub fn sub_floor_zero(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    floor_zero(a - b)
}
