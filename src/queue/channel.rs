//! Bounded queue backed by a crossbeam channel
//!
//! Closing is two-step: first the close token fires, waking any producer
//! parked in `select!`; then the only `Sender` is dropped under the write
//! lock, which disconnects the channel. Crossbeam's receivers keep yielding
//! queued items after disconnection and report it only once empty, which is
//! exactly the drain-then-cancel contract.

use crate::queue::BlockingQueue;
use crate::utils::CancelToken;
use crate::{Error, Result};
use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use parking_lot::RwLock;

/// Blocking MPMC queue on top of `crossbeam::channel::bounded`
pub struct ChannelQueue<T> {
    tx: RwLock<Option<Sender<T>>>,
    rx: Receiver<T>,
    capacity: usize,
    closing: CancelToken,
}

impl<T> ChannelQueue<T> {
    /// Create a new queue holding at most `capacity` items
    ///
    /// Capacity 0 would make a rendezvous channel, which is not a bounded
    /// buffer, so it is rejected.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config(
                "Queue capacity must be at least 1".to_string(),
            ));
        }

        let (tx, rx) = channel::bounded::<T>(capacity);

        Ok(Self {
            tx: RwLock::new(Some(tx)),
            rx,
            capacity,
            closing: CancelToken::new(),
        })
    }
}

impl<T: Send> BlockingQueue<T> for ChannelQueue<T> {
    fn put(&self, item: T) -> Result<()> {
        // Held across the blocking send so close() cannot disconnect mid-send
        let guard = self.tx.read();
        let tx: &Sender<T> = (*guard).as_ref().ok_or(Error::Cancelled)?;

        if self.closing.is_cancelled() {
            return Err(Error::Cancelled);
        }

        select! {
            send(tx, item) -> res => res.map_err(|_| {
                Error::QueueFault("channel disconnected while sender alive".to_string())
            }),
            recv(self.closing.receiver()) -> _ => Err(Error::Cancelled),
        }
    }

    fn take(&self) -> Result<T> {
        self.rx.recv().map_err(|_| Error::Cancelled)
    }

    fn close(&self) {
        self.closing.cancel();
        self.tx.write().take();
    }

    fn is_closed(&self) -> bool {
        self.closing.is_cancelled()
    }

    fn len(&self) -> usize {
        self.rx.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn name(&self) -> &str {
        "ChannelQueue"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::thread::JoinHandle;

    #[test]
    fn test_capacity_and_len() {
        let queue: ChannelQueue<u64> = ChannelQueue::new(2).unwrap();

        assert_eq!(queue.capacity(), 2);
        queue.put(1).unwrap();
        queue.put(2).unwrap();
        assert_eq!(queue.len(), 2);

        queue.take().unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_mpsc_threaded() {
        let queue: Arc<ChannelQueue<u64>> = Arc::new(ChannelQueue::new(64).unwrap());

        let producers: Vec<JoinHandle<()>> = (0..4u64)
            .map(|thread_id| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..1_000 {
                        queue.put(thread_id * 1_000 + i).unwrap();
                    }
                })
            })
            .collect();

        let mut received: Vec<u64> = (0..4_000).map(|_| queue.take().unwrap()).collect();

        for p in producers {
            p.join().unwrap();
        }

        received.sort_unstable();
        assert_eq!(received, (0..4_000).collect::<Vec<u64>>());
    }

    #[test]
    fn test_close_disconnects_after_drain() {
        let queue: ChannelQueue<u64> = ChannelQueue::new(4).unwrap();
        queue.put(5).unwrap();

        queue.close();

        assert!(queue.tx.read().is_none());
        assert_eq!(queue.take().unwrap(), 5);
        assert!(matches!(queue.take(), Err(Error::Cancelled)));
    }
}
