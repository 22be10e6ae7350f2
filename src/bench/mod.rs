//! Benchmark harness: configuration, worker loops and the reporter

mod config;
mod harness;
mod reporter;
mod worker;

pub use config::{BenchConfig, DEFAULT_CAPACITY, DEFAULT_REPORT_INTERVAL};
pub use harness::{Harness, RunSummary};
pub use reporter::{Reporter, ReporterState, TickReport};
pub use worker::{Role, WorkerExit, run_consumer, run_producer};
