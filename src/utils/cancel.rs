//! Cooperative cancellation shared between threads

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

struct Inner {
    cancelled: AtomicBool,
    /// Dropped on cancel, which disconnects `notify_rx` and wakes every select
    notify_tx: Mutex<Option<Sender<()>>>,
    notify_rx: Receiver<()>,
}

/// Cloneable cancellation flag
///
/// Hot loops poll [`is_cancelled`](Self::is_cancelled); sleeping threads
/// block on [`wait_timeout`](Self::wait_timeout) or select on
/// [`receiver`](Self::receiver) and wake as soon as the token fires.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Create a token that is not yet cancelled
    pub fn new() -> Self {
        let (notify_tx, notify_rx) = channel::bounded::<()>(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                notify_tx: Mutex::new(Some(notify_tx)),
                notify_rx,
            }),
        }
    }

    /// Fire the token. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.notify_tx.lock().take();
    }

    /// Whether [`cancel`](Self::cancel) has been called
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Channel that becomes ready (disconnected) once the token fires
    pub fn receiver(&self) -> &Receiver<()> {
        &self.inner.notify_rx
    }

    /// Sleep up to `timeout`, returning early if cancelled
    ///
    /// Returns `true` if the token fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        match self.inner.notify_rx.recv_timeout(timeout) {
            Err(channel::RecvTimeoutError::Timeout) => self.is_cancelled(),
            _ => true,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_cancel_is_visible_to_clones() {
        let token: CancelToken = CancelToken::new();
        let clone: CancelToken = token.clone();

        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());

        // Idempotent
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_wait_timeout_expires() {
        let token: CancelToken = CancelToken::new();
        assert!(!token.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_wait_timeout_wakes_on_cancel() {
        let token: CancelToken = CancelToken::new();
        let waiter: CancelToken = token.clone();

        let start: Instant = Instant::now();
        let handle = thread::spawn(move || waiter.wait_timeout(Duration::from_secs(30)));

        thread::sleep(Duration::from_millis(20));
        token.cancel();

        assert!(handle.join().unwrap());
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
