use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "usd";

//--------------------------------------        Money          ---------------------------------------------------------
/// A monetary amount in major currency units (e.g. dollars, not cents).
///
/// Amounts are exact decimals so that line totals and percentage discounts never accumulate floating point error.
/// Conversion to the payment provider's minor units happens once, via [`Money::to_minor_units`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);
op!(scalar Money(Decimal), i64, Mul, mul);

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a currency amount: {0}")]
pub struct MoneyConversionError(String);

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self).map_err(|e| MoneyConversionError(format!("{s}. {e}")))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Money {
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Builds an amount from a count of minor units (cents).
    pub fn from_minor_units(minor: i64) -> Self {
        Self(Decimal::new(minor, 2))
    }

    /// Converts to the provider's minor units. The amount is multiplied by 100 and truncated towards zero, so a
    /// customer is never charged a fraction of a cent more than the computed total.
    pub fn to_minor_units(&self) -> Result<i64, MoneyConversionError> {
        let minor = self
            .0
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(|| MoneyConversionError(format!("{} overflows when converted to minor units", self.0)))?;
        minor
            .trunc()
            .to_i64()
            .ok_or_else(|| MoneyConversionError(format!("{} does not fit into minor units", self.0)))
    }

    /// Returns `pct` percent of this amount, e.g. `Money::from(350).percentage(5.into()) == Some(17.50)`, or `None` on
    /// overflow.
    pub fn percentage(&self, pct: Decimal) -> Option<Self> {
        self.0.checked_mul(pct).and_then(|v| v.checked_div(Decimal::ONE_HUNDRED)).map(Self)
    }

    /// `self * quantity`, or `None` if the product does not fit.
    pub fn checked_times(&self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    pub fn checked_add(&self, rhs: Money) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }
}
