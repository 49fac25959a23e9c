//! # Exact Amount Module
//!
//! Provides the `ExactAmount` type for money shares that must add up without
//! rounding error.
//!
//! ## Why Fractions?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE SPLIT PROBLEM                                                      │
//! │                                                                         │
//! │  A 10.00 taxi ride split three ways:                                    │
//! │    Cents:      333 + 333 + 333 = 999         → 1 cent disappears        │
//! │    Floats:     3.3333… × 3     = 9.9999…     → equality checks fail     │
//! │                                                                         │
//! │  OUR SOLUTION: Rationals                                                │
//! │    10/3 + 10/3 + 10/3 = 10                   → exact, every time        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Float Boundary
//! Clients send decimal prices as JSON numbers. [`ExactAmount::from_client_decimal`]
//! is the single place where such a float becomes a fraction. It reads the
//! value as the decimal the client typed (`12.5` → `25/2`), not as the binary
//! float closest to it.
//!
//! ## Usage
//! ```rust
//! use tripsplit_core::exact::ExactAmount;
//!
//! let total = ExactAmount::from_client_decimal(10.0).unwrap();
//! let share = total.divide_by_integer(3).unwrap();
//!
//! let sum = share.add(&share).add(&share);
//! assert_eq!(sum, total);
//! ```

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::AddAssign;

use crate::error::{AmountError, AmountResult};
use crate::types::Fraction;

// =============================================================================
// ExactAmount Type
// =============================================================================

/// An arbitrary-precision rational amount of money.
///
/// The inner value is always reduced with a positive, non-zero denominator,
/// so structural equality is numeric equality: `15/30 == 1/2`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExactAmount(BigRational);

impl ExactAmount {
    /// Zero.
    pub fn zero() -> Self {
        ExactAmount(BigRational::zero())
    }

    /// Creates a whole amount.
    pub fn from_integer(value: i64) -> Self {
        ExactAmount(BigRational::from_integer(BigInt::from(value)))
    }

    /// Creates an amount from a numerator/denominator pair.
    ///
    /// ## Errors
    /// `AmountError::InvalidFraction` when `denominator` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use tripsplit_core::exact::ExactAmount;
    ///
    /// let half = ExactAmount::from_fraction(15, 30).unwrap();
    /// assert_eq!(half, ExactAmount::from_fraction(1, 2).unwrap());
    /// assert!(ExactAmount::from_fraction(5, 0).is_err());
    /// ```
    pub fn from_fraction(numerator: i64, denominator: i64) -> AmountResult<Self> {
        if denominator == 0 {
            return Err(AmountError::InvalidFraction { numerator });
        }

        Ok(ExactAmount(BigRational::new(
            BigInt::from(numerator),
            BigInt::from(denominator),
        )))
    }

    /// Creates an amount from a `rust_decimal::Decimal` without rounding.
    pub fn from_decimal(decimal: Decimal) -> Self {
        let numerator = BigInt::from(decimal.mantissa());
        let denominator = BigInt::from(10u32).pow(decimal.scale());
        ExactAmount(BigRational::new(numerator, denominator))
    }

    /// Converts a decimal number received from a client into an exact amount.
    ///
    /// ## How It Works
    /// ```text
    /// 12.5 (f64) ──► "12.5" (shortest round-trip text)
    ///            ──► Decimal { mantissa: 125, scale: 1 }
    ///            ──► 125/10 ──► 25/2
    /// ```
    /// Two floats that print the same text always produce the same fraction,
    /// so a total of `30.1` and distribution shares summing to `301/10`
    /// compare equal. The nearest-binary-float reading of `30.1` would not.
    ///
    /// ## Errors
    /// - `AmountError::NotFinite` for NaN and infinities
    /// - `AmountError::OutOfRange` when the decimal text needs more than
    ///   28 significant digits
    ///
    /// ## Example
    /// ```rust
    /// use tripsplit_core::exact::ExactAmount;
    ///
    /// let price = ExactAmount::from_client_decimal(0.1).unwrap();
    /// assert_eq!(price, ExactAmount::from_fraction(1, 10).unwrap());
    /// ```
    pub fn from_client_decimal(value: f64) -> AmountResult<Self> {
        if !value.is_finite() {
            return Err(AmountError::NotFinite(value.to_string()));
        }

        let text = value.to_string();
        let decimal = Decimal::from_str_exact(&text).map_err(|e| AmountError::OutOfRange {
            value: text.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self::from_decimal(decimal))
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    /// Exact sum.
    pub fn add(&self, other: &ExactAmount) -> ExactAmount {
        ExactAmount(&self.0 + &other.0)
    }

    /// Exact difference.
    pub fn subtract(&self, other: &ExactAmount) -> ExactAmount {
        ExactAmount(&self.0 - &other.0)
    }

    /// Multiplies by a whole number.
    pub fn multiply_by_integer(&self, factor: i64) -> ExactAmount {
        ExactAmount(&self.0 * BigRational::from_integer(BigInt::from(factor)))
    }

    /// Divides by a whole number without rounding.
    ///
    /// `a/b ÷ n` is `a/(b·n)`; a non-terminating result such as `10/3` is
    /// kept as a fraction.
    ///
    /// ## Errors
    /// `AmountError::DivisionByZero` when `divisor` is zero.
    pub fn divide_by_integer(&self, divisor: i64) -> AmountResult<ExactAmount> {
        if divisor == 0 {
            return Err(AmountError::DivisionByZero);
        }

        Ok(ExactAmount(
            &self.0 / BigRational::from_integer(BigInt::from(divisor)),
        ))
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Checks if the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the amount is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Three-way comparison (same as `Ord::cmp`).
    pub fn compare(&self, other: &ExactAmount) -> Ordering {
        self.0.cmp(&other.0)
    }

    /// Reduced numerator (carries the sign).
    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    /// Reduced denominator (always positive).
    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    /// Converts to the storable numerator/denominator pair.
    ///
    /// ## Errors
    /// `AmountError::FractionOverflow` when either reduced part exceeds `i64`.
    pub fn to_fraction(&self) -> AmountResult<Fraction> {
        let numerator = self.0.numer().to_i64();
        let denominator = self.0.denom().to_i64();

        match (numerator, denominator) {
            (Some(numerator), Some(denominator)) => Ok(Fraction {
                numerator,
                denominator,
            }),
            _ => Err(AmountError::FractionOverflow(self.to_string())),
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows `num/den`, or just `num` for whole amounts.
impl fmt::Display for ExactAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() {
            write!(f, "{}", self.0.numer())
        } else {
            write!(f, "{}/{}", self.0.numer(), self.0.denom())
        }
    }
}

impl Default for ExactAmount {
    fn default() -> Self {
        ExactAmount::zero()
    }
}

impl AddAssign<&ExactAmount> for ExactAmount {
    fn add_assign(&mut self, other: &ExactAmount) {
        self.0 += &other.0;
    }
}

impl<'a> Sum<&'a ExactAmount> for ExactAmount {
    fn sum<I: Iterator<Item = &'a ExactAmount>>(iter: I) -> Self {
        iter.fold(ExactAmount::zero(), |acc, x| acc.add(x))
    }
}

impl TryFrom<Fraction> for ExactAmount {
    type Error = AmountError;

    fn try_from(fraction: Fraction) -> AmountResult<Self> {
        ExactAmount::from_fraction(fraction.numerator, fraction.denominator)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
