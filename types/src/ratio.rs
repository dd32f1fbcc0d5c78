//! Exact fractions for consensus arithmetic.
//!
//! Quorum decisions never go through floating point: 2 of 3 is `2/3`, and comparing it
//! against a 67% threshold is done by cross-multiplication.

use crate::error::WhistleError;
use crate::params::BPS_SCALE;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A fraction `numerator / denominator` of valid reveals.
///
/// A zero denominator is allowed and means "no reveals"; such a ratio has value 0.
/// Equality is structural (`2/4 != 1/2`); use [`Ratio::cmp_value`] to compare values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ratio {
    pub numerator: u32,
    pub denominator: u32,
}

impl Ratio {
    pub const ZERO: Self = Self {
        numerator: 0,
        denominator: 0,
    };

    /// Build a ratio the caller already knows is proper, such as a count of agreeing
    /// reveals over all reveals. Use [`Ratio::try_new`] for untrusted input.
    pub fn new(numerator: u32, denominator: u32) -> Self {
        debug_assert!(numerator <= denominator, "ratio must not exceed 1");
        Self {
            numerator,
            denominator,
        }
    }

    pub fn try_new(numerator: u32, denominator: u32) -> Result<Self, WhistleError> {
        if numerator > denominator {
            return Err(WhistleError::InvalidRatio {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// Whether this ratio is at least `bps / 10_000`.
    ///
    /// An empty ratio only meets a zero threshold.
    pub fn meets_bps(&self, bps: u32) -> bool {
        u64::from(self.numerator) * BPS_SCALE >= u64::from(bps) * u64::from(self.denominator)
            && (self.denominator > 0 || bps == 0)
    }

    /// Compare the values of two ratios exactly.
    pub fn cmp_value(&self, other: &Ratio) -> Ordering {
        // Empty ratios are worth 0; treat their denominator as 1 for the comparison.
        let (a_num, a_den) = (u64::from(self.numerator), u64::from(self.denominator.max(1)));
        let (b_num, b_den) = (u64::from(other.numerator), u64::from(other.denominator.max(1)));
        (a_num * b_den).cmp(&(b_num * a_den))
    }

    /// `amount * numerator / denominator`, rounded down. Empty ratios scale to 0.
    pub fn scale(&self, amount: u64) -> u64 {
        if self.denominator == 0 {
            return 0;
        }
        let scaled =
            u128::from(amount) * u128::from(self.numerator) / u128::from(self.denominator);
        // Capped at `amount`, so a decoded improper fraction cannot overflow.
        u64::try_from(scaled).unwrap_or(u64::MAX).min(amount)
    }

    /// Approximate value, for display and logging only.
    pub fn as_f64(&self) -> f64 {
        if self.denominator == 0 {
            0.0
        } else {
            f64::from(self.numerator) / f64::from(self.denominator)
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
