//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! All boundary conversions to on-ledger integer amounts round HALF_UP.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

/// Number of stroops (smallest ledger unit) per whole asset unit.
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

/// Price type with fixed-point decimal representation
///
/// Must always be strictly positive. Serialized as a string to prevent
/// JSON number precision loss; the string form also feeds the canonical
/// signing payload, so it must round-trip the client's input exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Try to create a Price, returning None if non-positive
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from integer (for testing/convenience)
    ///
    /// # Panics
    /// Panics if the value is zero
    pub fn from_u64(value: u64) -> Self {
        Self::try_new(Decimal::from(value)).expect("price must be positive")
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s)?;
        Self::try_new(decimal).ok_or(rust_decimal::Error::LessThanMinimumPossibleValue)
    }
}

impl Mul<Quantity> for Price {
    type Output = Decimal;

    fn mul(self, rhs: Quantity) -> Self::Output {
        self.0 * rhs.as_decimal()
    }
}

// Custom serialization to preserve precision
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("price must be positive"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity type with fixed-point decimal representation
///
/// Non-negative; zero is valid only for filled quantities. Serialized as a
/// string to prevent JSON number precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Try to create a Quantity, returning None if negative
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Zero quantity (initial filled amount)
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Create from integer (for testing/convenience)
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Check if quantity is zero
    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }

    /// Check if quantity is strictly positive
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Saturating subtraction, clamped at zero
    pub fn saturating_sub(self, rhs: Self) -> Self {
        if self.0 >= rhs.0 {
            Self(self.0 - rhs.0)
        } else {
            Self::zero()
        }
    }

    /// The smaller of two quantities
    pub fn min(self, rhs: Self) -> Self {
        if self.0 <= rhs.0 {
            self
        } else {
            rhs
        }
    }
}

impl FromStr for Quantity {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s)?;
        Self::try_new(decimal).ok_or(rust_decimal::Error::LessThanMinimumPossibleValue)
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    /// # Panics
    /// Panics if the result would be negative
    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "quantity subtraction would go negative");
        Self(self.0 - rhs.0)
    }
}

impl Mul<Price> for Quantity {
    type Output = Decimal;

    fn mul(self, rhs: Price) -> Self::Output {
        self.0 * rhs.as_decimal()
    }
}

// Custom serialization to preserve precision
impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("quantity cannot be negative"))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Convert a decimal asset amount to integer stroops (factor 10^7),
/// rounding HALF_UP at zero decimal places.
///
/// Returns None when the scaled value would not fit the ledger's signed
/// 64-bit stroop width.
pub fn to_stroops(amount: Decimal) -> Option<i128> {
    let scaled = amount.checked_mul(Decimal::from(STROOPS_PER_UNIT))?;
    let rounded = scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let value = rounded.to_i128()?;
    if value > i64::MAX as i128 || value < i64::MIN as i128 {
        return None;
    }
    Some(value)
}

/// Convert integer stroops back to a decimal asset amount.
pub fn from_stroops(stroops: i128) -> Decimal {
    Decimal::from_i128_with_scale(stroops, 7).normalize()
}
