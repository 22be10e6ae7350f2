//! Producer and consumer hot loops
//!
//! Each loop touches exactly two shared things: the queue and its own
//! counter. No batching, no backoff.

use crate::Error;
use crate::queue::{BlockingQueue, TOKEN, Token};
use crate::utils::{CancelToken, CounterHandle};
use log::{debug, error};

/// Worker role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Producer,
    Consumer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Producer => f.write_str("producer"),
            Role::Consumer => f.write_str("consumer"),
        }
    }
}

/// How a worker loop ended
#[derive(Debug)]
pub enum WorkerExit {
    /// Token fired or the queue was closed; normal shutdown
    Cancelled,

    /// Queue reported something other than cancellation
    Faulted(Error),
}

impl WorkerExit {
    /// Whether the worker stopped on a fault
    pub fn is_fault(&self) -> bool {
        matches!(self, WorkerExit::Faulted(_))
    }
}

/// Put tokens until cancelled
pub fn run_producer<Q>(queue: &Q, counter: &CounterHandle, cancel: &CancelToken) -> WorkerExit
where
    Q: BlockingQueue<Token> + ?Sized,
{
    run(Role::Producer, counter, cancel, || queue.put(TOKEN))
}

/// Take and discard tokens until cancelled
pub fn run_consumer<Q>(queue: &Q, counter: &CounterHandle, cancel: &CancelToken) -> WorkerExit
where
    Q: BlockingQueue<Token> + ?Sized,
{
    run(Role::Consumer, counter, cancel, || queue.take().map(drop))
}

#[inline]
fn run<F>(role: Role, counter: &CounterHandle, cancel: &CancelToken, mut op: F) -> WorkerExit
where
    F: FnMut() -> crate::Result<()>,
{
    let id: usize = counter.index();

    while !cancel.is_cancelled() {
        match op() {
            Ok(()) => counter.increment(),
            Err(Error::Cancelled) => break,
            Err(e) => {
                error!(
                    "{} {} stopped after {} ops: {}",
                    role,
                    id,
                    counter.read(),
                    e
                );
                return WorkerExit::Faulted(e);
            }
        }
    }

    debug!("{} {} exiting after {} ops", role, id, counter.read());
    WorkerExit::Cancelled
}
