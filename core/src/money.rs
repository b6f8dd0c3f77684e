//! Money value object.
//!
//! Amounts are integer minor units of the event's currency (cents, yen, ...)
//! so totals never drift the way floating-point prices do.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative amount in currency minor units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from minor units
    #[must_use]
    pub const fn from_minor_units(units: u64) -> Self {
        Self(units)
    }

    /// Returns the amount in minor units
    #[must_use]
    pub const fn minor_units(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Converts a signed database column into `Money`.
    ///
    /// Returns `None` for negative amounts.
    #[must_use]
    #[allow(clippy::cast_sign_loss)] // Checked non-negative before the cast
    pub const fn from_signed(units: i64) -> Option<Self> {
        if units < 0 {
            None
        } else {
            Some(Self(units as u64))
        }
    }

    /// Converts to a signed value for `BIGINT` columns.
    ///
    /// Returns `None` if the amount exceeds `i64::MAX`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // Checked against i64::MAX before the cast
    pub const fn to_signed(self) -> Option<i64> {
        if self.0 > i64::MAX as u64 {
            None
        } else {
            Some(self.0 as i64)
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_detects_overflow() {
        let price = Money::from_minor_units(u64::MAX / 2 + 1);
        assert_eq!(price.checked_multiply(2), None);
        assert_eq!(
            Money::from_minor_units(1500).checked_multiply(3),
            Some(Money::from_minor_units(4500))
        );
    }

    #[test]
    fn signed_conversion_rejects_negative_and_oversized() {
        assert_eq!(Money::from_signed(-1), None);
        assert_eq!(Money::from_signed(250), Some(Money::from_minor_units(250)));
        assert_eq!(Money::from_minor_units(u64::MAX).to_signed(), None);
        assert_eq!(Money::from_minor_units(42).to_signed(), Some(42));
    }
}
