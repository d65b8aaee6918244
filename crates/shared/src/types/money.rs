//! Integer money amounts.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are denominated in the smallest currency unit (e.g. cents)
//! and wrap an `i64`. All arithmetic is checked; overflow surfaces as
//! an error at the call site instead of wrapping.

use serde::{Deserialize, Serialize};

/// A monetary amount in minor currency units.
///
/// The sign carries meaning: balances are constrained to be
/// non-negative by the wallet store, while balance deltas may be
/// negative (debits).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor currency units.
    #[must_use]
    pub const fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    /// Returns the amount in minor currency units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    /// The additive inverse (a debit for a credit and vice versa).
    ///
    /// Returns `None` for `i64::MIN`, which has no negation.
    #[must_use]
    pub const fn checked_neg(self) -> Option<Self> {
        match self.0.checked_neg() {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_sign_predicates() {
        assert!(Amount::from_minor_units(1).is_positive());
        assert!(!Amount::ZERO.is_positive());
        assert!(Amount::from_minor_units(-1).is_negative());
        assert!(Amount::ZERO.is_zero());
    }

    #[test]
    fn test_amount_checked_add() {
        let a = Amount::from_minor_units(40);
        let b = Amount::from_minor_units(60);
        assert_eq!(a.checked_add(b), Some(Amount::from_minor_units(100)));
        assert_eq!(Amount::from_minor_units(i64::MAX).checked_add(a), None);
    }

    #[test]
    fn test_amount_checked_sub() {
        let a = Amount::from_minor_units(40);
        let b = Amount::from_minor_units(60);
        assert_eq!(b.checked_sub(a), Some(Amount::from_minor_units(20)));
        assert_eq!(Amount::from_minor_units(i64::MIN).checked_sub(a), None);
    }

    #[test]
    fn test_amount_checked_neg() {
        assert_eq!(
            Amount::from_minor_units(50).checked_neg(),
            Some(Amount::from_minor_units(-50))
        );
        assert_eq!(Amount::from_minor_units(i64::MIN).checked_neg(), None);
    }

    #[test]
    fn test_amount_serde_transparent() {
        let amount = Amount::from_minor_units(1250);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "1250");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}
