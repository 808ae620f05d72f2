//! Fixed-point currency amounts.
//!
//! Amounts are held as a signed count of minor units (paise/cents), so totals
//! are computed without floating point drift. On the wire an amount is a
//! decimal string with two places (`"2198.00"`); incoming JSON may use either
//! a number or a string.

use std::{fmt, str::FromStr};

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("not a valid decimal amount")]
    Invalid,
    #[error("amount has more than two decimal places")]
    TooPrecise,
    #[error("amount is out of range")]
    OutOfRange,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_mul(self, quantity: i32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Sum of `quantity * unit_price` over all lines, `None` on overflow.
    pub fn line_total<I>(lines: I) -> Option<Money>
    where
        I: IntoIterator<Item = (i32, Money)>,
    {
        lines
            .into_iter()
            .try_fold(Money::ZERO, |acc, (quantity, price)| {
                acc.checked_add(price.checked_mul(quantity)?)
            })
    }

    pub fn to_decimal(self) -> BigDecimal {
        BigDecimal::new(self.0.into(), 2)
    }

    pub fn try_from_decimal(value: &BigDecimal) -> Result<Self, MoneyError> {
        let scaled = value.with_scale(2);
        if &scaled != value {
            return Err(MoneyError::TooPrecise);
        }
        (scaled * BigDecimal::from(100))
            .to_i64()
            .map(Money)
            .ok_or(MoneyError::OutOfRange)
    }

    fn try_from_f64(value: f64) -> Result<Self, MoneyError> {
        if !value.is_finite() {
            return Err(MoneyError::Invalid);
        }
        let scaled = value * 100.0;
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-4 {
            return Err(MoneyError::TooPrecise);
        }
        // 2^53, past which f64 no longer represents every integer
        if rounded.abs() > 9_007_199_254_740_992.0 {
            return Err(MoneyError::OutOfRange);
        }
        Ok(Money(rounded as i64))
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(MoneyError::Invalid);
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::Invalid);
        }

        let (kept, dropped) = frac.split_at(frac.len().min(2));
        if dropped.bytes().any(|b| b != b'0') {
            return Err(MoneyError::TooPrecise);
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| MoneyError::OutOfRange)?
        };
        let frac: i64 = match kept.len() {
            0 => 0,
            1 => kept.parse::<i64>().map_err(|_| MoneyError::Invalid)? * 10,
            _ => kept.parse().map_err(|_| MoneyError::Invalid)?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or(MoneyError::OutOfRange)?;
        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl de::Visitor<'_> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal amount with at most two decimal places")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                v.checked_mul(100)
                    .map(Money)
                    .ok_or_else(|| E::custom(MoneyError::OutOfRange))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                let v = i64::try_from(v).map_err(|_| E::custom(MoneyError::OutOfRange))?;
                self.visit_i64(v)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                Money::try_from_f64(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}
