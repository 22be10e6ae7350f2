//! Cache-line padded per-thread counters
//!
//! Every worker thread owns exactly one counter for writing. The reporter
//! holds a read-only view over the whole set and sums it on each tick.

use static_assertions::{const_assert_eq, const_assert};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache-line size (64 bytes on most modern CPUs)
pub const CACHE_LINE_SIZE: usize = 64;

/// A single 64-bit counter occupying a full cache line
///
/// Counters packed into a slice never share a line, so one worker bumping
/// its counter never invalidates the line of a neighbour.
#[repr(C, align(64))]
pub struct PaddedCounter {
    value: AtomicU64,
    _padding: [u8; CACHE_LINE_SIZE - std::mem::size_of::<AtomicU64>()],
}

const_assert_eq!(std::mem::size_of::<PaddedCounter>(), CACHE_LINE_SIZE);
const_assert_eq!(std::mem::align_of::<PaddedCounter>(), CACHE_LINE_SIZE);
const_assert!(std::mem::size_of::<AtomicU64>() <= CACHE_LINE_SIZE);

impl PaddedCounter {
    /// Create a counter starting at zero
    pub const fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
            _padding: [0; CACHE_LINE_SIZE - std::mem::size_of::<AtomicU64>()],
        }
    }

    /// Read the current value
    ///
    /// Pairs with the release store in [`CounterHandle::increment`]: a reader
    /// that sees a value also sees everything its writer did before that
    /// increment.
    #[inline]
    pub fn read(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }
}

impl Default for PaddedCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PaddedCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PaddedCounter").field(&self.read()).finish()
    }
}

/// Exclusive write handle to one counter of a [`CounterSet`]
///
/// Not `Clone`: the set hands out each handle exactly once, which is what
/// makes the load/store increment below race-free.
#[derive(Debug)]
pub struct CounterHandle {
    counters: Arc<[PaddedCounter]>,
    index: usize,
}

impl CounterHandle {
    /// Increase the owned counter by one
    ///
    /// # Performance
    /// Plain load + release store, no read-modify-write on the hot path
    #[inline]
    pub fn increment(&self) {
        let counter: &PaddedCounter = &self.counters[self.index];
        let next: u64 = counter.value.load(Ordering::Relaxed).wrapping_add(1);
        counter.value.store(next, Ordering::Release);
    }

    /// Current value of the owned counter
    #[inline]
    pub fn read(&self) -> u64 {
        self.counters[self.index].read()
    }

    /// Position of this counter in its set
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A contiguous, padded array of counters, one per worker
#[derive(Debug, Clone)]
pub struct CounterSet {
    counters: Arc<[PaddedCounter]>,
}

impl CounterSet {
    /// Allocate `len` counters and the write handle for each of them
    pub fn new(len: usize) -> (Self, Vec<CounterHandle>) {
        let counters: Arc<[PaddedCounter]> = (0..len).map(|_| PaddedCounter::new()).collect();

        let handles: Vec<CounterHandle> = (0..len)
            .map(|index| CounterHandle {
                counters: Arc::clone(&counters),
                index,
            })
            .collect();

        (Self { counters }, handles)
    }

    /// Number of counters
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether the set holds no counters
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Read a single counter
    pub fn get(&self, index: usize) -> Option<u64> {
        self.counters.get(index).map(PaddedCounter::read)
    }

    /// Best-effort snapshot of the sum of all counters
    ///
    /// Not atomic across counters; workers keep incrementing while we read.
    pub fn sum(&self) -> u64 {
        self.counters
            .iter()
            .fold(0u64, |acc, c| acc.wrapping_add(c.read()))
    }
}
