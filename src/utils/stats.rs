//! Throughput and latency arithmetic for the reporter
//!
//! All divisions are guarded: a zero divisor yields `None`, which renders
//! as `n/a`. Intermediates are widened to `u128` so `count * 1e6` cannot
//! overflow; results too large for `u64` saturate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const NANOS_PER_MILLI: u128 = 1_000_000;

/// Rendering of an undefined rate or latency
pub const UNDEFINED: &str = "n/a";

/// Throughput and mean latency over one interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateStats {
    /// Operations completed per millisecond; `None` if the interval is empty
    pub ops_per_ms: Option<u64>,

    /// Mean nanoseconds per operation; `None` if no operation completed
    pub ns_per_op: Option<u64>,
}

impl RateStats {
    /// Derive rate and latency from `count` operations over `elapsed`
    pub fn compute(count: u64, elapsed: Duration) -> Self {
        let elapsed_ns: u128 = elapsed.as_nanos();
        let count: u128 = count as u128;

        let ops_per_ms: Option<u64> = (count * NANOS_PER_MILLI)
            .checked_div(elapsed_ns)
            .map(saturate);

        let ns_per_op: Option<u64> = elapsed_ns.checked_div(count).map(saturate);

        Self {
            ops_per_ms,
            ns_per_op,
        }
    }
}

fn saturate(v: u128) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

/// Which side of the queue a line of statistics describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Producer side (`put`)
    Send,
    /// Consumer side (`take`)
    Recv,
}

impl Direction {
    /// Short label used in report lines
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Send => "send",
            Direction::Recv => "recv",
        }
    }
}

/// Cumulative and windowed statistics for one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionStats {
    pub direction: Direction,

    /// Since benchmark start
    pub total: RateStats,

    /// Since the previous tick
    pub delta: RateStats,
}

impl DirectionStats {
    pub fn compute(
        direction: Direction,
        total_count: u64,
        elapsed_total: Duration,
        delta_count: u64,
        elapsed_window: Duration,
    ) -> Self {
        Self {
            direction,
            total: RateStats::compute(total_count, elapsed_total),
            delta: RateStats::compute(delta_count, elapsed_window),
        }
    }
}

struct OrUndefined(Option<u64>);

impl fmt::Display for OrUndefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{}", v),
            None => f.write_str(UNDEFINED),
        }
    }
}

impl fmt::Display for DirectionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op: &str = self.direction.label();
        write!(
            f,
            "{op}: total: {} {op}/ms, {} ns/{op}. delta: {} {op}/ms, {} ns/{op}",
            OrUndefined(self.total.ops_per_ms),
            OrUndefined(self.total.ns_per_op),
            OrUndefined(self.delta.ops_per_ms),
            OrUndefined(self.delta.ns_per_op),
        )
    }
}
