//! Mutex + condition variable bounded queue
//!
//! The ring and the closed flag live under one lock, so FIFO order and the
//! capacity bound hold under any interleaving. Producers park on
//! `not_full`, consumers on `not_empty`; nobody spins.

use crate::queue::BlockingQueue;
use crate::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Blocking MPMC queue with fixed capacity
///
/// # Example
/// ```
/// use mpmc_bench::queue::{BlockingQueue, BoundedQueue};
///
/// let queue = BoundedQueue::<u64>::new(16)?;
///
/// // Producer thread
/// queue.put(42)?;
///
/// // Consumer thread
/// assert_eq!(queue.take()?, 42);
/// # Ok::<(), mpmc_bench::Error>(())
/// ```
pub struct BoundedQueue<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Create a new queue holding at most `capacity` items
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config(
                "Queue capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    /// Check if the queue is at capacity
    pub fn is_full(&self) -> bool {
        self.state.lock().items.len() == self.capacity
    }
}

impl<T: Send> BlockingQueue<T> for BoundedQueue<T> {
    fn put(&self, item: T) -> Result<()> {
        let mut state = self.state.lock();

        while state.items.len() == self.capacity && !state.closed {
            self.not_full.wait(&mut state);
        }

        if state.closed {
            return Err(Error::Cancelled);
        }

        state.items.push_back(item);
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    fn take(&self) -> Result<T> {
        let mut state = self.state.lock();

        while state.items.is_empty() && !state.closed {
            self.not_empty.wait(&mut state);
        }

        // Closed queues still hand out what is left
        let item: T = state.items.pop_front().ok_or(Error::Cancelled)?;
        drop(state);

        self.not_full.notify_one();
        Ok(item)
    }

    fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);

        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn name(&self) -> &str {
        "BoundedQueue"
    }
}
