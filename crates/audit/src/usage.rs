//! Runner usage weighting.
//!
//! Actions bills runner time with a per-platform multiplier. Weighting the
//! raw totals with the same multipliers turns a workflow's usage into one
//! number that tracks cost rather than wall-clock time. Downstream consumers
//! compare these numbers across runs, so the multipliers are fixed.

use serde::{Deserialize, Serialize};

use crate::{UsageFraction, WeightedUsage};

/// Cost multiplier for Ubuntu runners.
pub const UBUNTU_MULTIPLIER: u64 = 1;
/// Cost multiplier for Windows runners.
pub const WINDOWS_MULTIPLIER: u64 = 2;
/// Cost multiplier for macOS runners.
pub const MAC_MULTIPLIER: u64 = 10;

/// Billable runner time of one workflow, split by runner platform.
///
/// Units are whatever the timing endpoint reports (milliseconds for GitHub);
/// weighting is unit-agnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerUsage {
    pub ubuntu: u64,
    pub windows: u64,
    pub mac: u64,
}

impl RunnerUsage {
    /// Creates a usage record.
    pub fn new(ubuntu: u64, windows: u64, mac: u64) -> Self {
        Self {
            ubuntu,
            windows,
            mac,
        }
    }

    /// See [`weighted_usage`].
    pub fn weighted(&self) -> WeightedUsage {
        weighted_usage(self)
    }
}

/// `ubuntu * 1 + windows * 2 + mac * 10`.
pub fn weighted_usage(usage: &RunnerUsage) -> WeightedUsage {
    let weighted = usage
        .ubuntu
        .saturating_mul(UBUNTU_MULTIPLIER)
        .saturating_add(usage.windows.saturating_mul(WINDOWS_MULTIPLIER))
        .saturating_add(usage.mac.saturating_mul(MAC_MULTIPLIER));
    WeightedUsage::new(weighted)
}

/// Share of `total` taken by `part`.
///
/// A zero total yields a zero fraction, so an organization without any
/// billable usage still produces a well-formed report.
pub fn fraction_of(part: WeightedUsage, total: WeightedUsage) -> UsageFraction {
    if total.is_zero() {
        return UsageFraction::zero();
    }
    let ratio = part.as_u64() as f64 / total.as_u64() as f64;
    UsageFraction::new(ratio).unwrap_or_else(UsageFraction::zero)
}
