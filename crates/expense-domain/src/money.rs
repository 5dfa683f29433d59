//! Fixed-point monetary amounts.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

/// Number of minor units (cents) in one major unit.
pub const CENTS_PER_UNIT: i64 = 100;

/// A monetary amount stored as a whole number of cents.
///
/// Every stored value in the engine is a `Money`, so sums and differences are
/// exact. Fractional intermediates (prorated rates, proportional shares) are
/// rounded to the cent once, at the point they become a `Money`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// One cent, the smallest representable difference.
    pub const CENT: Money = Money(1);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Builds an amount from whole and fractional parts, e.g. `from_major(12, 34)` is 12.34.
    pub const fn from_major(units: i64, cents: i64) -> Self {
        Self(units * CENTS_PER_UNIT + cents)
    }

    /// Converts a floating point major-unit value, rounding half away from zero.
    ///
    /// Non-finite input resolves to zero.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        Self((value * CENTS_PER_UNIT as f64).round() as i64)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / CENTS_PER_UNIT as f64
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Absolute distance between two amounts.
    pub fn abs_diff(self, other: Money) -> Money {
        (self - other).abs()
    }

    /// Returns `true` when the two amounts differ by no more than `tolerance`.
    pub fn within(self, other: Money, tolerance: Money) -> bool {
        self.abs_diff(other) <= tolerance
    }

    /// Clamps the amount into `[min, max]`. When `max < min`, `min` wins.
    pub fn clamp_between(self, min: Money, max: Money) -> Money {
        self.min(max).max(min)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_unit = CENTS_PER_UNIT as u64;
        write!(f, "{}{}.{:02}", sign, abs / per_unit, abs % per_unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_f64_rounds_to_nearest_cent() {
        assert_eq!(Money::from_f64(10.005).cents(), 1001);
        assert_eq!(Money::from_f64(-2.5).cents(), -250);
        assert_eq!(Money::from_f64(f64::NAN), Money::ZERO);
        assert_eq!(Money::from_f64(f64::INFINITY), Money::ZERO);
    }

    #[test]
    fn display_pads_cents() {
        assert_eq!(Money::from_major(1234, 5).to_string(), "1234.05");
        assert_eq!(Money::from_cents(-50).to_string(), "-0.50");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn within_uses_inclusive_tolerance() {
        let a = Money::from_cents(1000);
        assert!(a.within(Money::from_cents(1001), Money::CENT));
        assert!(!a.within(Money::from_cents(1002), Money::CENT));
    }

    #[test]
    fn sums_iterators() {
        let values = [Money::from_cents(150), Money::from_cents(250)];
        let total: Money = values.iter().sum();
        assert_eq!(total, Money::from_major(4, 0));
    }

    #[test]
    fn serializes_as_plain_cents() {
        let json = serde_json::to_string(&Money::from_cents(123456)).unwrap();
        assert_eq!(json, "123456");
    }
}
