//! Utility types shared by the queue, workers and reporter

mod cancel;
mod counter;
mod stats;

pub use cancel::CancelToken;
pub use counter::{CACHE_LINE_SIZE, CounterHandle, CounterSet, PaddedCounter};
pub use stats::{Direction, DirectionStats, RateStats, UNDEFINED};
