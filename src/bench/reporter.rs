//! Periodic sampling of the worker counters
//!
//! The reporter never touches the queue. Each tick it sums both counter
//! sets with plain loads, derives cumulative and windowed rates, and writes
//! two lines to its sink.

use crate::utils::{CancelToken, CounterSet, Direction, DirectionStats};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::{Duration, Instant};

/// Reporter lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    /// No tick taken yet
    WarmUp,
    /// At least one tick taken
    Sampling,
}

/// Statistics produced by one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// 1-based tick number
    pub tick: u64,

    /// Time since benchmark start
    pub elapsed_total: Duration,

    /// Time since the previous tick (or start, for the first one)
    pub elapsed_window: Duration,

    pub total_send: u64,
    pub total_recv: u64,
    pub delta_send: u64,
    pub delta_recv: u64,

    pub send: DirectionStats,
    pub recv: DirectionStats,
}

impl std::fmt::Display for TickReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.send)?;
        write!(f, "{}", self.recv)
    }
}

/// Counter sampler with cumulative and windowed statistics
pub struct Reporter {
    send: CounterSet,
    recv: CounterSet,
    interval: Duration,
    started: Instant,
    last_tick: Instant,
    last_send: u64,
    last_recv: u64,
    ticks: u64,
}

impl Reporter {
    /// Create a reporter whose clock starts now
    pub fn new(send: CounterSet, recv: CounterSet, interval: Duration) -> Self {
        Self::starting_at(send, recv, interval, Instant::now())
    }

    /// Create a reporter with an explicit start instant
    pub fn starting_at(
        send: CounterSet,
        recv: CounterSet,
        interval: Duration,
        started: Instant,
    ) -> Self {
        let last_send: u64 = send.sum();
        let last_recv: u64 = recv.sum();

        Self {
            send,
            recv,
            interval,
            started,
            last_tick: started,
            last_send,
            last_recv,
            ticks: 0,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ReporterState {
        if self.ticks == 0 {
            ReporterState::WarmUp
        } else {
            ReporterState::Sampling
        }
    }

    /// Configured tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Take a tick as of `now`
    ///
    /// An instant earlier than the previous tick yields zero-length windows
    /// rather than a panic.
    pub fn sample_at(&mut self, now: Instant) -> TickReport {
        let total_send: u64 = self.send.sum();
        let total_recv: u64 = self.recv.sum();

        let delta_send: u64 = total_send.wrapping_sub(self.last_send);
        let delta_recv: u64 = total_recv.wrapping_sub(self.last_recv);

        let elapsed_total: Duration = now.saturating_duration_since(self.started);
        let elapsed_window: Duration = now.saturating_duration_since(self.last_tick);

        self.ticks += 1;
        self.last_send = total_send;
        self.last_recv = total_recv;
        self.last_tick = now.max(self.last_tick);

        TickReport {
            tick: self.ticks,
            elapsed_total,
            elapsed_window,
            total_send,
            total_recv,
            delta_send,
            delta_recv,
            send: DirectionStats::compute(
                Direction::Send,
                total_send,
                elapsed_total,
                delta_send,
                elapsed_window,
            ),
            recv: DirectionStats::compute(
                Direction::Recv,
                total_recv,
                elapsed_total,
                delta_recv,
                elapsed_window,
            ),
        }
    }

    /// Take a tick now
    pub fn sample(&mut self) -> TickReport {
        self.sample_at(Instant::now())
    }

    /// Tick every interval until cancelled, then tick once more and return
    ///
    /// Sink errors are logged and sampling goes on.
    pub fn run<W: Write>(mut self, cancel: &CancelToken, out: &mut W) -> Option<TickReport> {
        info!("reporter started, interval {:?}", self.interval);

        loop {
            let cancelled: bool = cancel.wait_timeout(self.interval);

            let report: TickReport = self.sample();
            emit(&report, out);

            if cancelled {
                info!("reporter stopped after {} ticks", self.ticks);
                return Some(report);
            }
        }
    }
}

fn emit<W: Write>(report: &TickReport, out: &mut W) {
    debug!(
        "tick {}: send {} (+{}), recv {} (+{}) over {:?}",
        report.tick,
        report.total_send,
        report.delta_send,
        report.total_recv,
        report.delta_recv,
        report.elapsed_window
    );

    if let Err(e) = writeln!(out, "{}", report).and_then(|()| out.flush()) {
        warn!("failed to write tick {}: {}", report.tick, e);
    }
}
