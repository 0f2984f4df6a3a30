//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In floating point:                                                 │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  A ledger that must satisfy `total == paid + pending` after every   │
//! │  mutation cannot be built on "within 0.01 of equal".                │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Cents                                        │
//! │    Prices, totals, paid and pending amounts are all i64 cents.      │
//! │    Equality is exact; tolerances only exist at the intake edge      │
//! │    where callers hand us subtotals they computed themselves.        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The one place fractions enter is weight-priced products: 0.25 kg at
//! $48.00/kg. [`Money::multiply_qty`] does that multiplication once, rounds
//! half away from zero, and returns exact cents again.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate subtractions may dip negative before
///   validation rejects them
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support plus `Ord` so allocation code can take
///   `min(pending, remaining)` directly
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use mercadito_core::Money;
    ///
    /// let price = Money::from_cents(1850); // $18.50
    /// assert_eq!(price.cents(), 1850);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
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

    /// Multiplies by a possibly fractional quantity, rounding half away
    /// from zero.
    ///
    /// This is the single bridge between f64 quantities (weight-priced
    /// lines) and integer cents. It is used to compute line subtotals and
    /// to check caller-claimed subtotals.
    ///
    /// ## Example
    /// ```rust
    /// use mercadito_core::Money;
    ///
    /// let per_kilo = Money::from_cents(4800); // $48.00 / kg
    /// assert_eq!(per_kilo.multiply_qty(0.25).cents(), 1200);
    /// assert_eq!(per_kilo.multiply_qty(3.0).cents(), 14400);
    /// ```
    #[inline]
    pub fn multiply_qty(&self, qty: f64) -> Self {
        Money((self.0 as f64 * qty).round() as i64)
    }

    /// Multiplies money by a whole quantity, exactly.
    #[inline]
    pub const fn multiply_count(&self, count: i64) -> Self {
        Money(self.0 * count)
    }

    /// Scales by an exact fraction `numer/denom` using integer math,
    /// rounding half up.
    ///
    /// Used by the cart's weight-fraction shortcuts (1/4, 1/2, 3/4) so the
    /// reference price never drifts through repeated f64 round-trips.
    #[inline]
    pub const fn scale_fraction(&self, numer: i64, denom: i64) -> Self {
        Money((self.0 * numer + denom / 2) / denom)
    }

    /// Saturating subtraction clamped at zero.
    #[inline]
    pub const fn saturating_sub_floor(&self, other: Money) -> Self {
        let diff = self.0 - other.0;
        if diff < 0 {
            Money(0)
        } else {
            Money(diff)
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// This is for debugging and log output. UI formatting (locale, currency
/// symbol) is the frontend's job.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
