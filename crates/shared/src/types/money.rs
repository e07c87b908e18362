//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount in the system is a `rust_decimal::Decimal` with two fractional
//! digits, and comparisons against limits go through the tolerance helpers below.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept for stored amounts.
pub const MONEY_SCALE: u32 = 2;

/// Fixed tolerance applied to limit and equality checks (one cent).
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, MONEY_SCALE);

/// Rounds an amount to two decimal places using banker's rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Returns true when `amount` exceeds `limit` by more than the tolerance.
#[must_use]
pub fn exceeds_with_tolerance(amount: Decimal, limit: Decimal) -> bool {
    amount - limit > MONEY_TOLERANCE
}

/// Collapses negative values and sub-cent residue to zero.
#[must_use]
pub fn clamp_dust(amount: Decimal) -> Decimal {
    if amount < MONEY_TOLERANCE {
        Decimal::ZERO
    } else {
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tolerance_is_one_cent() {
        assert_eq!(MONEY_TOLERANCE, dec!(0.01));
    }

    #[rstest]
    #[case(dec!(10.125), dec!(10.12))]
    #[case(dec!(10.135), dec!(10.14))]
    #[case(dec!(10.126), dec!(10.13))]
    #[case(dec!(-2.345), dec!(-2.34))]
    #[case(dec!(7), dec!(7))]
    fn test_round_money_bankers(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_money(input), expected);
    }

    #[rstest]
    #[case(dec!(1000.01), dec!(1000), false)]
    #[case(dec!(1000.02), dec!(1000), true)]
    #[case(dec!(1050), dec!(1000), true)]
    #[case(dec!(999), dec!(1000), false)]
    fn test_exceeds_with_tolerance(
        #[case] amount: Decimal,
        #[case] limit: Decimal,
        #[case] expected: bool,
    ) {
        assert_eq!(exceeds_with_tolerance(amount, limit), expected);
    }

    #[rstest]
    #[case(dec!(-5), dec!(0))]
    #[case(dec!(0.004), dec!(0))]
    #[case(dec!(0.01), dec!(0.01))]
    #[case(dec!(12.50), dec!(12.50))]
    fn test_clamp_dust(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(clamp_dust(input), expected);
    }
}
