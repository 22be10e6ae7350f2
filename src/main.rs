//! MPMC benchmark binary
//!
//! Usage: `mpmc-bench [producers [consumers]]`. Runs until Ctrl-C.

use anyhow::Context;
use log::{debug, error, info};
use mpmc_bench::*;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config: BenchConfig = match BenchConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mpmc-bench: {}", e);
            eprintln!("usage: mpmc-bench [producers [consumers]]");
            return ExitCode::from(2);
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: BenchConfig) -> anyhow::Result<()> {
    debug!("config: {}", serde_json::to_string(&config)?);

    println!(
        "==== mpmc-bench {}({}): {} sender, {} receiver ====",
        config.queue_kind, config.capacity, config.producers, config.consumers
    );

    let (stop_tx, stop_rx) = crossbeam::channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .context("failed to install signal handler")?;

    let harness: Harness = Harness::start(config).context("failed to start benchmark")?;

    // Blocks until the operator interrupts
    stop_rx
        .recv()
        .context("signal handler channel closed unexpectedly")?;
    info!("stop requested, draining queue");

    let summary: RunSummary = harness.stop().context("benchmark did not stop cleanly")?;

    println!("\n{}", "═".repeat(50));
    println!("{}", summary);

    Ok(())
}
