use std::{
    fmt,
    ops::{Add, Sub},
    str::FromStr,
};

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use thiserror::Error;

/// Signed money amount represented as **integer cents**.
///
/// Budget entries are never negative, but aggregated balances can be, so the
/// value itself is signed.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(100_00);
/// assert_eq!(amount.cents(), 10000);
/// assert_eq!(amount.to_string(), "100.00");
/// ```
///
/// Parsing rounds to two decimals, half to even:
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("100".parse::<Money>().unwrap().cents(), 10000);
/// assert_eq!("0.125".parse::<Money>().unwrap().cents(), 12);
/// assert_eq!("1e2".parse::<Money>().unwrap().cents(), 10000);
/// assert!("abc".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

/// Reasons a decimal literal cannot become a [`Money`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyParseError {
    #[error("A valid number is required.")]
    Invalid,
    #[error("Amount is too large.")]
    Overflow,
}

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Number of digits left of the decimal point.
    #[must_use]
    pub fn integer_digits(self) -> usize {
        let units = self.0.unsigned_abs() / 100;
        units.checked_ilog10().map_or(1, |log| log as usize + 1)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyParseError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
        rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Money)
            .ok_or(MoneyParseError::Overflow)
    }
}

/// Parses a decimal literal (plain or scientific notation) without rounding.
pub(crate) fn parse_decimal(s: &str) -> Result<Decimal, MoneyParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(MoneyParseError::Invalid);
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| MoneyParseError::Invalid)
}

impl FromStr for Money {
    type Err = MoneyParseError;

    /// Parses a decimal literal into cents, see [`parse_decimal`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::try_from(parse_decimal(s)?)
    }
}
