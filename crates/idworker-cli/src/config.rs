use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use idworker::WorkerConfig;

/// Which clock the generator reads.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// The OS wall clock. Can move backwards and trigger rollback errors.
    System,
    /// A ticker aligned to the wall clock at startup that never moves
    /// backwards.
    Monotonic,
}

/// Runtime configuration for the `idworker` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file in the working directory is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "idworker",
    version,
    about = "Mints Snowflake IDs in a tight loop and prints every Nth one"
)]
pub struct CliArgs {
    /// Epoch all timestamps are measured from, in milliseconds since
    /// 1970-01-01 UTC. Must be identical across every instance that shares an
    /// ID namespace.
    ///
    /// Environment variable: `EPOCH`
    #[arg(long, env = "EPOCH", default_value_t = 1_288_834_974_657)]
    pub epoch: u64,

    /// Worker ID of this instance within its datacenter (0..=31).
    ///
    /// Environment variable: `WORKER_ID`
    #[arg(long, env = "WORKER_ID", default_value_t = 1, allow_negative_numbers = true)]
    pub worker_id: i64,

    /// Datacenter ID of this instance (0..=31).
    ///
    /// Environment variable: `DATACENTER_ID`
    #[arg(long, env = "DATACENTER_ID", default_value_t = 1, allow_negative_numbers = true)]
    pub datacenter_id: i64,

    /// Print every Nth ID.
    ///
    /// Environment variable: `REPORT_EVERY`
    #[arg(long, env = "REPORT_EVERY", default_value_t = 10_000)]
    pub report_every: u64,

    /// Total number of IDs to mint. `0` runs until interrupted.
    ///
    /// Environment variable: `COUNT`
    #[arg(long, env = "COUNT", default_value_t = 0)]
    pub count: u64,

    /// Number of threads sharing one generator.
    ///
    /// Environment variable: `THREADS`
    #[arg(long, env = "THREADS", default_value_t = 1)]
    pub threads: usize,

    /// How many times a thread sleeps out a clock rollback and retries before
    /// giving up. `0` exits on the first rollback.
    ///
    /// Environment variable: `MAX_ROLLBACK_RETRIES`
    #[arg(long, env = "MAX_ROLLBACK_RETRIES", default_value_t = 0)]
    pub max_rollback_retries: u32,

    /// Clock to read timestamps from.
    ///
    /// Environment variable: `CLOCK`
    #[arg(long, env = "CLOCK", value_enum, default_value_t = ClockKind::System)]
    pub clock: ClockKind,
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub worker: WorkerConfig,
    pub report_every: u64,
    pub count: Option<u64>,
    pub threads: usize,
    pub max_rollback_retries: u32,
    pub clock: ClockKind,
}

impl TryFrom<CliArgs> for DriverConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.threads == 0 {
            bail!("THREADS must be greater than 0");
        }

        if args.report_every == 0 {
            bail!("REPORT_EVERY must be greater than 0");
        }

        let worker = WorkerConfig::new(
            Duration::from_millis(args.epoch),
            args.worker_id,
            args.datacenter_id,
        )
        .context("invalid generator identity")?;

        Ok(Self {
            worker,
            report_every: args.report_every,
            count: (args.count > 0).then_some(args.count),
            threads: args.threads,
            max_rollback_retries: args.max_rollback_retries,
            clock: args.clock,
        })
    }
}
