use std::{
    fmt::{self, Display},
    ops::{Add, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// A monetary amount in cents.
///
/// The remote platform reports prices as decimal strings ("9.99"). Storing cents as an integer
/// keeps the amounts exact; no floating point is involved in parsing, storage or comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Money(i64);

#[derive(Debug, Clone, Error)]
#[error("Invalid monetary amount: {0}")]
pub struct MoneyParseError(String);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in cents.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Lossy conversion for outbound JSON payloads that insist on floats.
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    /// Parses decimal strings like "12.50", "9.99" or "3". Fractional digits beyond the second
    /// are discarded; a single fractional digit means tenths ("12.5" is 12.50, not 12.05).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MoneyParseError(s.to_string()));
        }
        let (sign, s) = match s.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, s),
        };
        let mut parts = s.splitn(2, '.');
        let whole = parts
            .next()
            .filter(|w| !w.is_empty())
            .and_then(|w| w.parse::<i64>().ok())
            .ok_or_else(|| MoneyParseError(s.to_string()))?;
        let cents = match parts.next() {
            None => 0,
            Some(frac) => {
                let digits: String = frac.chars().take(2).collect();
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(MoneyParseError(s.to_string()));
                }
                let n = digits.parse::<i64>().map_err(|_| MoneyParseError(s.to_string()))?;
                if digits.len() == 1 {
                    n * 10
                } else {
                    n
                }
            },
        };
        Ok(Self(sign * (whole * 100 + cents)))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
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
