#![doc = include_str!("../README.md")]

mod config;
mod driver;
mod telemetry;

use std::io::{self, BufWriter};

use clap::Parser;
use config::{ClockKind, CliArgs, DriverConfig};
use idworker::{LockIdWorker, MonotonicClock, SystemClock};
use telemetry::init_telemetry;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = DriverConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let out = BufWriter::new(io::stdout());
    let minted = match config.clock {
        ClockKind::System => {
            let generator = LockIdWorker::new(config.worker, SystemClock);
            driver::run(&generator, &config, out)?
        }
        ClockKind::Monotonic => {
            let generator = LockIdWorker::new(config.worker, MonotonicClock::default());
            driver::run(&generator, &config, out)?
        }
    };

    tracing::info!(minted, "Done");
    Ok(())
}

fn log_startup_info(config: &DriverConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting id worker with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting id worker {}/{} on {} thread(s)",
            config.worker.datacenter_id(),
            config.worker.worker_id(),
            config.threads
        );
    }
}
