//! # MPMC Bench
//!
//! Throughput and latency microbenchmark for bounded blocking
//! multi-producer/multi-consumer queues.
//!
//! ## Features
//!
//! - Blocking `put`/`take` queues with a single global FIFO order
//! - Cache-line padded per-thread counters
//! - Periodic cumulative and windowed statistics
//! - Clean shutdown that drains the queue
//!
//! ## Quick Start
//!
//! ```no_run
//! use mpmc_bench::*;
//!
//! let harness = Harness::start(BenchConfig::simple(2, 2))?;
//! std::thread::sleep(std::time::Duration::from_secs(30));
//! let summary = harness.stop()?;
//! assert_eq!(summary.total_send, summary.total_recv);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bench;
pub mod queue;
pub mod utils;

// Re-exports
pub use bench::{BenchConfig, Harness, Reporter, RunSummary, TickReport};
pub use queue::{BlockingQueue, BoundedQueue, ChannelQueue, QueueKind, Token};
pub use utils::{CancelToken, CounterSet, PaddedCounter};

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A blocking call was interrupted by shutdown; not a failure
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Queue fault: {0}")]
    QueueFault(String),

    #[error("Thread spawn error: {0}")]
    Spawn(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}
