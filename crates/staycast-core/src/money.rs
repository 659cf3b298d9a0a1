//! # Money Module
//!
//! Provides the `Money` type for handling nightly prices safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 7-night stay at $119.99/night must total $839.93 — exactly.         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    11999 cents × 7 = 83993 cents, no drift, ever                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use staycast_core::money::Money;
//!
//! // Create from cents (preferred)
//! let nightly = Money::from_cents(11999); // $119.99
//!
//! // Arithmetic operations
//! let two_nights = nightly * 2;                      // $239.98
//! let total = nightly + Money::from_cents(500);      // $124.99
//!
//! // NEVER do this:
//! // let bad = Money::from_float(119.99); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for adjustments and credits
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  RateOverride.nightly_price_cents ──┐                                   │
/// │  RatePlan.nightly_price_cents ──────┼──► PriceEngine cascade            │
/// │  Property.fallback_price_cents ─────┘         │                         │
/// │                                               ▼                         │
/// │                       resolved nightly price ──► channel calendar push  │
/// │                                                                         │
/// │  EVERY resolved price in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use staycast_core::money::Money;
    ///
    /// let price = Money::from_cents(11999); // Represents $119.99
    /// assert_eq!(price.cents(), 11999);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use staycast_core::money::Money;
    ///
    /// let price = Money::from_major_minor(119, 99); // $119.99
    /// assert_eq!(price.cents(), 11999);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -$5.50, not -$4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major_units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_units(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    ///
    /// A resolved price of zero is a real price (a free night); it is NOT
    /// the same as an unresolvable date, which is `None` at the call site.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a nightly price by a number of nights.
    ///
    /// ## Example
    /// ```rust
    /// use staycast_core::money::Money;
    ///
    /// let nightly = Money::from_cents(11999); // $119.99
    /// let week = nightly.multiply_nights(7);
    /// assert_eq!(week.cents(), 83993); // $839.93
    /// ```
    #[inline]
    pub const fn multiply_nights(&self, nights: i64) -> Self {
        Money(self.0 * nights)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and audit messages. Channel-facing formatting (currency
/// symbols, localization) is the connector's concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.major_units().abs(),
            self.minor_units()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for night counts).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, nights: i32) -> Self {
        Money(self.0 * nights as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, nights: i64) -> Self {
        Money(self.0 * nights)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(11999);
        assert_eq!(money.cents(), 11999);
        assert_eq!(money.major_units(), 119);
        assert_eq!(money.minor_units(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        let money = Money::from_major_minor(119, 99);
        assert_eq!(money.cents(), 11999);

        let negative = Money::from_major_minor(-5, 50);
        assert_eq!(negative.cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(11999)), "$119.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(10000);
        let b = Money::from_cents(2500);

        assert_eq!((a + b).cents(), 12500);
        assert_eq!((a - b).cents(), 7500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 30000);
    }

    #[test]
    fn test_multiply_nights() {
        let nightly = Money::from_cents(11999);
        let week = nightly.multiply_nights(7);
        assert_eq!(week.cents(), 83993);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_cents(100);
        assert!(positive.is_positive());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }

    /// Zero is a legitimate price, distinct from "no price resolvable".
    #[test]
    fn test_zero_price_is_a_price() {
        let free_night = Some(Money::zero());
        let unresolvable: Option<Money> = None;
        assert_ne!(free_night, unresolvable);
    }
}
