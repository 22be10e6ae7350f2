//! Bounded blocking MPMC queues under test
//!
//! Every implementation honours the same contract:
//!
//! - `put` blocks while the queue is full, `take` blocks while it is empty
//! - one global FIFO order across all producers and consumers
//! - `close` wakes every blocked caller; further `put`s fail with
//!   [`Error::Cancelled`](crate::Error::Cancelled), `take` keeps draining
//!   and fails only once the queue is both closed and empty

mod bounded;
mod channel;

pub use bounded::BoundedQueue;
pub use channel::ChannelQueue;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Payload carried through the queue by the benchmark
///
/// Identity is irrelevant to the measurement; tests use sequence numbers.
pub type Token = u64;

/// Placeholder token every producer sends
pub const TOKEN: Token = 1;

/// Trait for bounded blocking queues
///
/// All queues must implement this trait to be driven by the workers
pub trait BlockingQueue<T>: Send + Sync {
    /// Insert at the tail, blocking while the queue is full
    fn put(&self, item: T) -> crate::Result<()>;

    /// Remove from the head, blocking while the queue is empty
    fn take(&self) -> crate::Result<T>;

    /// Reject further puts and wake every blocked caller. Idempotent.
    fn close(&self);

    /// Whether [`close`](Self::close) has been called
    fn is_closed(&self) -> bool;

    /// Number of items currently queued
    ///
    /// Note: a snapshot, may be stale by the time it is returned
    fn len(&self) -> usize;

    /// Check if the queue holds no items
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fixed capacity
    fn capacity(&self) -> usize;

    /// Get a queue name
    fn name(&self) -> &str;
}

/// Queue implementation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueueKind {
    /// Mutex-protected ring with two condition variables
    #[default]
    Bounded,

    /// Bounded crossbeam channel
    Channel,
}

impl QueueKind {
    /// Construct a queue of this kind
    pub fn build<T: Send + 'static>(
        self,
        capacity: usize,
    ) -> crate::Result<Arc<dyn BlockingQueue<T>>> {
        let queue: Arc<dyn BlockingQueue<T>> = match self {
            QueueKind::Bounded => Arc::new(BoundedQueue::new(capacity)?),
            QueueKind::Channel => Arc::new(ChannelQueue::new(capacity)?),
        };
        Ok(queue)
    }
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueKind::Bounded => f.write_str("BoundedQueue"),
            QueueKind::Channel => f.write_str("ChannelQueue"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::thread;
    use std::thread::JoinHandle;
    use std::time::Duration;

    fn kinds() -> [QueueKind; 2] {
        [QueueKind::Bounded, QueueKind::Channel]
    }

    #[test]
    fn test_build_rejects_zero_capacity() {
        for kind in kinds() {
            let result = kind.build::<Token>(0);
            assert!(matches!(result, Err(Error::Config(_))), "{kind}");
        }
    }

    #[test]
    fn test_contract_fifo_single_thread() {
        for kind in kinds() {
            let queue = kind.build::<Token>(8).unwrap();

            for i in 0..8 {
                queue.put(i).unwrap();
            }
            assert_eq!(queue.len(), 8);

            for i in 0..8 {
                assert_eq!(queue.take().unwrap(), i);
            }
            assert!(queue.is_empty(), "{}", queue.name());
        }
    }

    #[test]
    fn test_contract_close_drains_then_cancels() {
        for kind in kinds() {
            let queue = kind.build::<Token>(4).unwrap();
            queue.put(7).unwrap();
            queue.put(8).unwrap();

            queue.close();
            assert!(queue.is_closed());

            assert!(matches!(queue.put(9), Err(Error::Cancelled)));
            assert_eq!(queue.take().unwrap(), 7);
            assert_eq!(queue.take().unwrap(), 8);
            assert!(matches!(queue.take(), Err(Error::Cancelled)));
        }
    }

    #[test]
    fn test_contract_close_wakes_blocked_takers() {
        for kind in kinds() {
            let queue = kind.build::<Token>(2).unwrap();

            let takers: Vec<JoinHandle<bool>> = (0..3)
                .map(|_| {
                    let queue = Arc::clone(&queue);
                    thread::spawn(move || matches!(queue.take(), Err(Error::Cancelled)))
                })
                .collect();

            thread::sleep(Duration::from_millis(50));
            queue.close();

            for t in takers {
                assert!(t.join().unwrap(), "{kind}");
            }
        }
    }

    #[test]
    fn test_contract_close_wakes_blocked_putters() {
        for kind in kinds() {
            let queue = kind.build::<Token>(1).unwrap();
            queue.put(TOKEN).unwrap();

            let putters: Vec<JoinHandle<bool>> = (0..3)
                .map(|_| {
                    let queue = Arc::clone(&queue);
                    thread::spawn(move || matches!(queue.put(TOKEN), Err(Error::Cancelled)))
                })
                .collect();

            thread::sleep(Duration::from_millis(50));
            queue.close();

            for p in putters {
                assert!(p.join().unwrap(), "{kind}");
            }

            // The token queued before close is still there
            assert_eq!(queue.len(), 1);
            assert_eq!(queue.take().unwrap(), TOKEN);
        }
    }
}
