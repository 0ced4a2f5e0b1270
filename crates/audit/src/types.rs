//! Shared value types for the audit domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. fractions are in `[0.0, 1.0]`,
//! usage counts are non-negative integers) and participate in report
//! computations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Usage types
// ---------------------------------------------------------------------------

/// Compute usage after the per-platform cost multipliers have been applied.
///
/// See [`crate::usage::weighted_usage`] for the weighting rule.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WeightedUsage(u64);

impl WeightedUsage {
    /// Creates a [`WeightedUsage`] from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Creates a [`WeightedUsage`] of exactly zero.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns `true` if this usage is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for WeightedUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for WeightedUsage {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for WeightedUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::iter::Sum for WeightedUsage {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, u| acc + u)
    }
}

// ---------------------------------------------------------------------------

/// One workflow's share of the organization-wide weighted usage, in the
/// range `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageFraction(f64);

impl UsageFraction {
    /// Creates a [`UsageFraction`], returning `None` if `value` is outside
    /// the valid range `[0.0, 1.0]`.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Creates a [`UsageFraction`] of exactly zero.
    pub fn zero() -> Self {
        Self(0.0)
    }

    /// Returns the fraction as an `f64` in `[0.0, 1.0]`.
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Returns `true` if this fraction is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl std::fmt::Display for UsageFraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly. Serializes as RFC 3339, which is also the format of GraphQL
/// `DateTime` scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Whole seconds elapsed from `self` until `later`. Negative when `later`
    /// is earlier.
    pub fn seconds_until(self, later: Timestamp) -> i64 {
        (later.0 - self.0).num_seconds()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn usage_fraction_rejects_out_of_range_values() {
        assert!(UsageFraction::new(-0.1).is_none());
        assert!(UsageFraction::new(1.5).is_none());
        assert!(UsageFraction::new(f64::NAN).is_none());
        assert_eq!(UsageFraction::new(0.5).map(UsageFraction::as_f64), Some(0.5));
    }

    #[test]
    fn weighted_usage_sums() {
        let total: WeightedUsage = [1, 2, 3].into_iter().map(WeightedUsage::new).sum();
        assert_eq!(total.as_u64(), 6);
    }

    #[test]
    fn timestamp_parses_graphql_datetime() {
        let ts: Timestamp = serde_json::from_str("\"2020-05-01T12:00:00Z\"").unwrap();
        let expected = Utc.with_ymd_and_hms(2020, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(ts.as_datetime(), expected);
    }

    #[test]
    fn seconds_until_measures_elapsed_time() {
        let start = Timestamp::from_utc(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let end = Timestamp::from_utc(Utc.with_ymd_and_hms(2020, 1, 1, 0, 1, 0).unwrap());
        assert_eq!(start.seconds_until(end), 60);
    }
}
