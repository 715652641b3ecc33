use anyhow::{Context, Error, Result};
use num_traits::Zero;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// Signed decimal amount as it appears in the ledger.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] pub Decimal);

impl Money {
    /// Multiplies by a rate, e.g. a commission percentage.
    pub fn scale(&self, rate: Decimal) -> Money {
        Money(self.0 * rate)
    }

    /// Lossy conversion for spreadsheet cells.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// The `f64` of this amount, if it prints back as the same decimal.
    pub fn to_exact_f64(&self) -> Option<f64> {
        let f = self.0.to_f64()?;
        let back = Decimal::from_str(&f.to_string()).ok()?;
        (back == self.0).then_some(f)
    }

    pub fn abs(&self) -> Money {
        Money(self.0.abs())
    }

    /// `None` on overflow.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// `None` on overflow.
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Divides evenly over `n` parts, zero when there are no parts.
    pub fn mean_over(&self, n: usize) -> Money {
        if n == 0 {
            return Money::zero();
        }
        Money(self.0 / Decimal::from(n))
    }
}

/// Basically this holds a Decimal that is scaled out to at least 2 dp (doesn't round).
impl TryFrom<f64> for Money {
    type Error = Error;

    fn try_from(f: f64) -> Result<Self> {
        let mut d = Decimal::from_f64(f).context(format!("Failed to convert {} to Money", f))?;
        if d.scale() < 2 {
            d.rescale(2);
        }
        Ok(Self(d))
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl FromStr for Money {
    type Err = Error;

    /// Strict parse of plain or scientific decimal notation.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let d = Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .with_context(|| format!("Failed to parse amount: '{}'", s))?;
        Ok(Self(d))
    }
}

/// Two decimals with thousands separators, e.g. `-1,234.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = format!("{:.2}", self.0.abs().round_dp(2));
        let (int_part, frac_part) = rounded.split_once('.').unwrap_or((&rounded, "00"));
        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, c) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        let sign = if self.0.is_sign_negative() && !self.0.round_dp(2).is_zero() {
            "-"
        } else {
            ""
        };
        let text = format!("{sign}{grouped}.{frac_part}");
        f.pad(&text)
    }
}

impl Zero for Money {
    fn zero() -> Self {
        Money(Decimal::zero())
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl<'a, 'b> Add<&'b Money> for &'a Money {
    type Output = Money;

    fn add(self, other: &Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl Add<Money> for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl Sub<Money> for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}
