use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "INR";

/// Number of minor units (paise) in one major currency unit.
const MINOR_PER_MAJOR: i64 = 100;

//--------------------------------------       Money         ---------------------------------------------------------
/// An amount of money, held as a whole number of minor currency units.
///
/// All arithmetic that can produce fractional minor units (proration, percentages) rounds half-to-even, so that the
/// same inputs always produce the same stored amounts.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Cannot divide an amount into {0} parts")]
    InvalidDivisor(i64),
    #[error("Value cannot be represented as money: {0}")]
    Overflow(String),
    #[error("Value is out of range: {0}")]
    OutOfRange(String),
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let minor = MINOR_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}₹{}.{:02}", abs / minor, abs % minor)
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major(units: i64) -> Self {
        Self(units * MINOR_PER_MAJOR)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, MoneyError> {
        self.0.checked_add(rhs.0).map(Self).ok_or_else(|| MoneyError::Overflow(format!("{self} + {rhs}")))
    }

    pub fn checked_mul(self, rhs: i64) -> Result<Self, MoneyError> {
        self.0.checked_mul(rhs).map(Self).ok_or_else(|| MoneyError::Overflow(format!("{self} × {rhs}")))
    }

    /// Splits the amount into `parts` equal shares and returns one share, rounded half-to-even to the minor unit.
    pub fn divide_evenly(self, parts: i64) -> Result<Self, MoneyError> {
        if parts <= 0 {
            return Err(MoneyError::InvalidDivisor(parts));
        }
        let share = div_round_half_even(i128::from(self.0), i128::from(parts));
        i64::try_from(share).map(Self).map_err(|e| MoneyError::Overflow(e.to_string()))
    }

    /// Returns `basis_points / 10_000` of this amount, rounded half-to-even to the minor unit.
    pub fn portion_bps(self, basis_points: i64) -> Result<Self, MoneyError> {
        let product = i128::from(self.0) * i128::from(basis_points);
        let portion = div_round_half_even(product, 10_000);
        i64::try_from(portion).map(Self).map_err(|e| MoneyError::Overflow(e.to_string()))
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }
}

/// Integer division of `num` by a positive `den`, rounding ties to the even quotient.
fn div_round_half_even(num: i128, den: i128) -> i128 {
    let q = num.div_euclid(den);
    let r = num.rem_euclid(den);
    let twice = 2 * r;
    if twice > den || (twice == den && q % 2 != 0) {
        q + 1
    } else {
        q
    }
}
