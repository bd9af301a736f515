//! Amount type for handling monetary values in Brazilian reais.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles
//! parsing values that may arrive as machine-formatted numbers (`1234.56`),
//! pt-BR formatted strings (`1.234,56`) or currency strings (`R$ 1.234,56`).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents an amount of money in reais.
///
/// The display form is always the canonical currency rendering, e.g.
/// `R$ 1.234,56` (or `-R$ 50,00` for negative values). Use [`Amount::plain`]
/// when a machine-readable rendering with a decimal point is needed.
///
/// # Examples
///
/// ```
/// # use synclife::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("R$ 1.234,56").unwrap();
/// let b = Amount::from_str("1234.56").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "R$ 1.234,56");
/// assert_eq!(a.plain(), "1234.56");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Creates an Amount from a binary float, as received in tool-call
    /// arguments. Returns `None` for NaN or infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::from_f64_retain(value).map(Self::new)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.value.is_sign_positive()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative()
    }

    /// Machine rendering with two decimal places and a decimal point,
    /// e.g. `1234.56`.
    pub fn plain(&self) -> String {
        format!("{:.2}", self.value)
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // Handle empty string
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        // Peel off the sign and the currency symbol: "-R$ 50,00" or "R$ -50,00"
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix("R$").unwrap_or(rest).trim_start();
        let (negative, rest) = match rest.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (negative, rest),
        };

        // A comma marks pt-BR formatting: '.' groups thousands, ',' is the
        // decimal separator. Without a comma the string is machine-formatted.
        let normalized = if rest.contains(',') {
            rest.replace('.', "").replace(',', ".")
        } else {
            rest.to_string()
        };

        let mut value = Decimal::from_str(&normalized).map_err(AmountError)?;
        if negative {
            value.set_sign_negative(true);
        }
        Ok(Amount::new(value))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.is_negative() {
            ("-", self.value.abs())
        } else {
            ("", self.value)
        };

        // format_num groups US-style ("1,234.56"); swap the separators.
        let grouped = format_num::format_num!(",.2", num.to_f64().unwrap_or_default());
        let localized: String = grouped
            .chars()
            .map(|c| match c {
                ',' => '.',
                '.' => ',',
                other => other,
            })
            .collect();
        write!(f, "{sign}R$ {localized}")
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // The record store emits JSON numbers; user-authored config and
        // transcripts carry strings.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Str(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Num(n) => Amount::from_f64(n)
                .ok_or_else(|| serde::de::Error::custom(format!("non-finite amount: {n}"))),
            Repr::Str(s) => Amount::from_str(&s).map_err(serde::de::Error::custom),
        }
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
