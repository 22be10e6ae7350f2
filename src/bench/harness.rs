use crate::bench::config::BenchConfig;
use crate::bench::reporter::{Reporter, TickReport};
use crate::bench::worker::{self, Role, WorkerExit};
use crate::queue::{BlockingQueue, Token};
use crate::utils::{CancelToken, CounterHandle, CounterSet};
use crate::{Error, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Outcome of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_send: u64,
    pub total_recv: u64,

    /// Tokens left in the queue after shutdown
    pub stranded: usize,

    /// Workers that stopped on a queue fault
    pub faulted_workers: usize,

    pub elapsed: Duration,

    /// The reporter's final tick
    pub last_report: Option<TickReport>,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Run Summary:")?;
        writeln!(f, "  Duration:         {:.2} s", self.elapsed.as_secs_f64())?;
        writeln!(f, "  Total Sent:       {}", self.total_send)?;
        writeln!(f, "  Total Received:   {}", self.total_recv)?;
        writeln!(f, "  Stranded Tokens:  {}", self.stranded)?;
        write!(f, "  Faulted Workers:  {}", self.faulted_workers)
    }
}

/// Running benchmark: queue, worker set, reporter
///
/// Dropping a harness that was not stopped aborts it.
pub struct Harness {
    config: BenchConfig,
    queue: Arc<dyn BlockingQueue<Token>>,

    send: CounterSet,
    recv: CounterSet,

    producer_cancel: CancelToken,
    consumer_cancel: CancelToken,
    reporter_cancel: CancelToken,

    producers: Vec<JoinHandle<WorkerExit>>,
    consumers: Vec<JoinHandle<WorkerExit>>,
    reporter: Option<JoinHandle<Option<TickReport>>>,

    started: Instant,
}

impl Harness {
    /// Start a benchmark reporting to stdout
    pub fn start(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        let queue: Arc<dyn BlockingQueue<Token>> = config.queue_kind.build(config.capacity)?;
        Self::start_with(config, queue, io::stdout())
    }

    /// Start a benchmark on a caller-supplied queue and report sink
    pub fn start_with<W>(
        config: BenchConfig,
        queue: Arc<dyn BlockingQueue<Token>>,
        sink: W,
    ) -> Result<Self>
    where
        W: Write + Send + 'static,
    {
        config.validate()?;

        let (send, send_handles) = CounterSet::new(config.producers);
        let (recv, recv_handles) = CounterSet::new(config.consumers);

        let reporter: Reporter =
            Reporter::new(send.clone(), recv.clone(), config.report_interval);

        let mut harness: Harness = Self {
            config,
            queue,
            send,
            recv,
            producer_cancel: CancelToken::new(),
            consumer_cancel: CancelToken::new(),
            reporter_cancel: CancelToken::new(),
            producers: Vec::new(),
            consumers: Vec::new(),
            reporter: None,
            started: Instant::now(),
        };

        if let Err(e) = harness.spawn_all(send_handles, recv_handles, reporter, sink) {
            error!("startup failed, tearing down: {}", e);
            let _ = harness.shutdown(false);
            return Err(e);
        }

        info!(
            "started {} producers and {} consumers on {}({})",
            harness.config.producers,
            harness.config.consumers,
            harness.queue.name(),
            harness.queue.capacity()
        );

        Ok(harness)
    }

    fn spawn_all<W>(
        &mut self,
        send_handles: Vec<CounterHandle>,
        recv_handles: Vec<CounterHandle>,
        reporter: Reporter,
        mut sink: W,
    ) -> Result<()>
    where
        W: Write + Send + 'static,
    {
        for counter in recv_handles {
            let handle = self.spawn_worker(Role::Consumer, counter, self.consumer_cancel.clone())?;
            self.consumers.push(handle);
        }

        for counter in send_handles {
            let handle = self.spawn_worker(Role::Producer, counter, self.producer_cancel.clone())?;
            self.producers.push(handle);
        }

        let cancel: CancelToken = self.reporter_cancel.clone();
        let handle = thread::Builder::new()
            .name("reporter".to_string())
            .spawn(move || reporter.run(&cancel, &mut sink))
            .map_err(|e| Error::Spawn(format!("reporter: {}", e)))?;
        self.reporter = Some(handle);

        Ok(())
    }

    fn spawn_worker(
        &self,
        role: Role,
        counter: CounterHandle,
        cancel: CancelToken,
    ) -> Result<JoinHandle<WorkerExit>> {
        let queue: Arc<dyn BlockingQueue<Token>> = Arc::clone(&self.queue);
        let name: String = format!("{}-{}", role, counter.index());

        thread::Builder::new()
            .name(name.clone())
            .spawn(move || match role {
                Role::Producer => worker::run_producer(&*queue, &counter, &cancel),
                Role::Consumer => worker::run_consumer(&*queue, &counter, &cancel),
            })
            .map_err(|e| Error::Spawn(format!("{}: {}", name, e)))
    }

    /// Get configuration
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Get the queue under test
    pub fn queue(&self) -> &dyn BlockingQueue<Token> {
        &*self.queue
    }

    /// Best-effort `(sent, received)` snapshot
    ///
    /// Received is read first, so it never runs ahead of sent by more than
    /// the producers still between `put` returning and their increment.
    pub fn totals(&self) -> (u64, u64) {
        let recv: u64 = self.recv.sum();
        let send: u64 = self.send.sum();
        (send, recv)
    }

    /// Time since start
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stop producers, let consumers drain the queue, then stop the reporter
    ///
    /// After a clean stop every sent token has been received.
    pub fn stop(mut self) -> Result<RunSummary> {
        self.shutdown(true)
    }

    /// Stop every thread immediately; queued tokens may be left behind
    pub fn abort(mut self) -> Result<RunSummary> {
        self.shutdown(false)
    }

    fn shutdown(&mut self, drain: bool) -> Result<RunSummary> {
        info!(
            "shutting down ({})",
            if drain { "drain" } else { "abort" }
        );

        self.producer_cancel.cancel();
        if !drain {
            self.consumer_cancel.cancel();
        }
        self.queue.close();

        let mut faulted_workers: usize = 0;
        let mut panicked: usize = 0;

        for handle in self.producers.drain(..).chain(self.consumers.drain(..)) {
            match handle.join() {
                Ok(exit) if exit.is_fault() => faulted_workers += 1,
                Ok(_) => {}
                Err(_) => panicked += 1,
            }
        }

        self.reporter_cancel.cancel();
        let last_report: Option<TickReport> = match self.reporter.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                panicked += 1;
                None
            }),
            None => None,
        };

        let (total_send, total_recv) = self.totals();
        let stranded: usize = self.queue.len();

        if stranded > 0 {
            warn!("{} tokens left in the queue", stranded);
        }

        if panicked > 0 {
            return Err(Error::InvalidState(format!(
                "{} benchmark threads panicked",
                panicked
            )));
        }

        Ok(RunSummary {
            total_send,
            total_recv,
            stranded,
            faulted_workers,
            elapsed: self.started.elapsed(),
            last_report,
        })
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if self.reporter.is_some() || !self.producers.is_empty() || !self.consumers.is_empty() {
            warn!("harness dropped while running, aborting");
            let _ = self.shutdown(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{BoundedQueue, QueueKind};

    fn quick_config(producers: usize, consumers: usize, capacity: usize) -> BenchConfig {
        BenchConfig {
            producers,
            consumers,
            capacity,
            report_interval: Duration::from_millis(20),
            queue_kind: QueueKind::Bounded,
        }
    }

    fn start_quiet(config: BenchConfig) -> Harness {
        let queue: Arc<dyn BlockingQueue<Token>> = config.queue_kind.build(config.capacity).unwrap();
        Harness::start_with(config, queue, io::sink()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let queue: Arc<dyn BlockingQueue<Token>> = Arc::new(BoundedQueue::new(4).unwrap());
        let result = Harness::start_with(quick_config(0, 1, 4), queue, io::sink());

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_stop_drains_queue() {
        let harness: Harness = start_quiet(quick_config(2, 2, 16));
        thread::sleep(Duration::from_millis(100));

        let summary: RunSummary = harness.stop().unwrap();

        assert!(summary.total_send > 0);
        assert_eq!(summary.total_send, summary.total_recv);
        assert_eq!(summary.stranded, 0);
        assert_eq!(summary.faulted_workers, 0);
        assert!(summary.last_report.is_some());
    }

    #[test]
    fn test_abort_returns_promptly() {
        let harness: Harness = start_quiet(quick_config(1, 1, 8));
        thread::sleep(Duration::from_millis(50));

        let start: Instant = Instant::now();
        let summary: RunSummary = harness.abort().unwrap();

        assert!(start.elapsed() < Duration::from_secs(5));
        // Nothing fabricated, nothing lost: what was not taken is still queued
        assert_eq!(summary.total_recv + summary.stranded as u64, summary.total_send);
    }

    #[test]
    fn test_drop_aborts_running_harness() {
        let harness: Harness = start_quiet(quick_config(1, 1, 8));
        let queue: Arc<dyn BlockingQueue<Token>> = Arc::clone(&harness.queue);

        drop(harness);

        assert!(queue.is_closed());
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            total_send: 10,
            total_recv: 10,
            stranded: 0,
            faulted_workers: 0,
            elapsed: Duration::from_secs(2),
            last_report: None,
        };

        let text: String = summary.to_string();
        assert!(text.contains("Total Sent:       10"));
        assert!(text.contains("Duration:         2.00 s"));
    }
}
