//! Money helpers for decimal arithmetic.
//!
//! All monetary values in Sugarloaf are `rust_decimal::Decimal` with two
//! decimal places, serialized as strings on the wire. Conversion to integer
//! minor units (cents) happens only at the payment-provider boundary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Errors converting a decimal amount to provider minor units.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// The amount is negative.
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
    /// The amount does not fit in an i64 cent count.
    #[error("amount out of range: {0}")]
    OutOfRange(Decimal),
}

/// Round a monetary amount to two decimal places, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a decimal amount to integer minor units (e.g., `19.99` -> `1999`).
///
/// The amount is rounded to two decimal places first, so sub-cent residue
/// from discount arithmetic never reaches the provider.
///
/// # Errors
///
/// Returns `MoneyError::Negative` for negative amounts and
/// `MoneyError::OutOfRange` if the cent count overflows i64.
pub fn to_minor_units(amount: Decimal) -> Result<i64, MoneyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative(amount));
    }

    let cents = round_money(amount) * Decimal::from(100);
    cents.to_i64().ok_or(MoneyError::OutOfRange(amount))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec("10.005")), dec("10.01"));
        assert_eq!(round_money(dec("10.004")), dec("10.00"));
        assert_eq!(round_money(dec("80.0")), dec("80.0"));
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(dec("19.99")).unwrap(), 1999);
        assert_eq!(to_minor_units(dec("0.01")).unwrap(), 1);
        assert_eq!(to_minor_units(dec("45.00")).unwrap(), 4500);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_to_minor_units_rounds_residue() {
        // 33.333... style residue from percentage discounts
        assert_eq!(to_minor_units(dec("33.3333")).unwrap(), 3333);
        assert_eq!(to_minor_units(dec("33.335")).unwrap(), 3334);
    }

    #[test]
    fn test_to_minor_units_rejects_negative() {
        assert!(matches!(
            to_minor_units(dec("-1.00")),
            Err(MoneyError::Negative(_))
        ));
    }
}
