//! Fixed-point product prices.
//!
//! Prices are held in minor units (cents) with two fractional digits and at most ten
//! significant digits. On the wire they travel as strings such as `"100.00"`, while
//! input also accepts plain JSON numbers.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

const FRACTION_DIGITS: usize = 2;
const MAX_INTEGRAL_DIGITS: usize = 8;
const CENTS_PER_UNIT: i64 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("this field is required")]
    Empty,
    #[error("a valid number is required")]
    Malformed,
    #[error("must not be negative")]
    Negative,
    #[error("ensure that there are no more than 2 decimal places")]
    TooPrecise,
    #[error("ensure that there are no more than 8 digits before the decimal point")]
    TooLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);

    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        if cents < 0 {
            return Err(PriceError::Negative);
        }
        if cents / CENTS_PER_UNIT >= 10_i64.pow(MAX_INTEGRAL_DIGITS as u32) {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(cents))
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    /// Parse a decimal literal such as `12`, `12.5`, `12.50` or `1.25e1`.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let literal = DecimalLiteral::parse(input)?;
        if literal.negative {
            return Err(PriceError::Negative);
        }
        if literal.fraction_digits() > FRACTION_DIGITS as i64 {
            return Err(PriceError::TooPrecise);
        }
        if literal.integral_digits() > MAX_INTEGRAL_DIGITS as i64 {
            return Err(PriceError::TooLarge);
        }

        Self::from_cents(literal.floor_cents())
    }

    /// Accept either a JSON number or a JSON string holding a decimal literal.
    pub fn from_json(value: &Value) -> Result<Self, PriceError> {
        match value {
            Value::Null => Err(PriceError::Empty),
            Value::Number(number) => Self::parse(&number.to_string()),
            Value::String(text) => Self::parse(text),
            _ => Err(PriceError::Malformed),
        }
    }
}

/// A signed decimal of arbitrary scale and magnitude, normalised so that `digits` carries
/// no leading or trailing zeros. The value is `digits * 10^-scale`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalLiteral {
    negative: bool,
    digits: String,
    scale: i64,
}

impl DecimalLiteral {
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }

        let (negative, unsigned) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => {
                let exponent: i64 = exponent.parse().map_err(|_| PriceError::Malformed)?;
                (mantissa, exponent)
            }
            None => (unsigned, 0),
        };

        let (integral, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if integral.is_empty() && fraction.is_empty() {
            return Err(PriceError::Malformed);
        }
        if !integral.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(PriceError::Malformed);
        }

        let mut scale = i64::try_from(fraction.len())
            .ok()
            .and_then(|len| len.checked_sub(exponent))
            .ok_or(PriceError::Malformed)?;

        let joined = format!("{integral}{fraction}");
        let significant = joined.trim_start_matches('0');
        let digits = significant.trim_end_matches('0');
        scale = scale.saturating_sub((significant.len() - digits.len()) as i64);

        if digits.is_empty() {
            return Ok(Self {
                negative: false,
                digits: String::new(),
                scale: 0,
            });
        }

        Ok(Self {
            negative,
            digits: digits.to_string(),
            scale,
        })
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Digits after the decimal point, ignoring trailing zeros.
    pub fn fraction_digits(&self) -> i64 {
        self.scale.max(0)
    }

    /// Digits before the decimal point, ignoring leading zeros.
    pub fn integral_digits(&self) -> i64 {
        (self.digits.len() as i64).saturating_sub(self.scale).max(0)
    }

    /// Largest whole number of cents not above the value, saturating at the `i64` bounds.
    pub fn floor_cents(&self) -> i64 {
        let (magnitude, inexact) = self.cents_magnitude();
        if self.negative {
            clamp_cents(-(magnitude + i128::from(inexact)))
        } else {
            clamp_cents(magnitude)
        }
    }

    /// Smallest whole number of cents not below the value, saturating at the `i64` bounds.
    pub fn ceil_cents(&self) -> i64 {
        let (magnitude, inexact) = self.cents_magnitude();
        if self.negative {
            clamp_cents(-magnitude)
        } else {
            clamp_cents(magnitude + i128::from(inexact))
        }
    }

    /// Truncated absolute value in cents and whether any fraction of a cent was dropped.
    fn cents_magnitude(&self) -> (i128, bool) {
        const SATURATED: i128 = i64::MAX as i128 + 1;

        if self.digits.is_empty() {
            return (0, false);
        }

        let shift = (FRACTION_DIGITS as i64).saturating_sub(self.scale);
        if shift >= 0 {
            if (self.digits.len() as i64).saturating_add(shift) > 20 {
                return (SATURATED, false);
            }
            let value: i128 = self.digits.parse().unwrap_or(SATURATED);
            return (value * 10_i128.pow(shift as u32), false);
        }

        let dropped = shift.unsigned_abs();
        if dropped >= self.digits.len() as u64 {
            return (0, true);
        }
        let kept = &self.digits[..self.digits.len() - dropped as usize];
        if kept.len() > 20 {
            return (SATURATED, true);
        }
        (kept.parse().unwrap_or(SATURATED), true)
    }
}

fn clamp_cents(value: i128) -> i64 {
    value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// An inclusive price limit in cents. Unlike [`Price`] it may be negative or exceed the
/// storable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceBound(i64);

impl PriceBound {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Lower limit: prices at or above `literal` admit exactly the cents at or above this.
    pub fn at_least(literal: &DecimalLiteral) -> Self {
        Self(literal.ceil_cents())
    }

    /// Upper limit: prices at or below `literal` admit exactly the cents at or below this.
    pub fn at_most(literal: &DecimalLiteral) -> Self {
        Self(literal.floor_cents())
    }

    pub fn cents(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PriceBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = i128::from(self.0).abs();
        write!(
            f,
            "{sign}{}.{:02}",
            magnitude / i128::from(CENTS_PER_UNIT),
            magnitude % i128::from(CENTS_PER_UNIT)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / CENTS_PER_UNIT,
            self.0 % CENTS_PER_UNIT
        )
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
