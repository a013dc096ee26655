use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use testdatagen::{BatchConfig, MAX_AGE};

/// Runtime configuration for the `testdatagen-server` binary.
///
/// Every value is read from a CLI flag or its environment variable (a `.env`
/// file is loaded first), and falls back to a default suitable for a shared
/// load-test environment.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "testdatagen-server",
    version,
    about = "An HTTP service serving synthetic Swedish persons for load testing"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Maximum `antal` accepted by `/RandomPerson`.
    ///
    /// Environment variable: `MAX_PERSONS`
    #[arg(long, env = "MAX_PERSONS", default_value_t = 25_000)]
    pub max_persons: usize,

    /// Maximum `antal` accepted by `/RandomUUID`.
    ///
    /// Environment variable: `MAX_UUIDS`
    #[arg(long, env = "MAX_UUIDS", default_value_t = 50_000)]
    pub max_uuids: usize,

    /// Upper bound on generator threads per batch. `0` uses the machine's
    /// available parallelism.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = 0)]
    pub num_workers: usize,

    /// Roughly how many persons each generator thread produces.
    ///
    /// Environment variable: `BATCH_SIZE_HINT`
    #[arg(long, env = "BATCH_SIZE_HINT", default_value_t = 100)]
    pub batch_size_hint: usize,

    /// Sampling attempts budgeted per requested person before a batch is
    /// reported incomplete.
    ///
    /// Environment variable: `ATTEMPTS_PER_ITEM`
    #[arg(long, env = "ATTEMPTS_PER_ITEM", default_value_t = 10)]
    pub attempts_per_item: usize,

    /// Youngest calendar-year age used when a request names no window.
    ///
    /// Environment variable: `DEFAULT_MIN_AGE`
    #[arg(long, env = "DEFAULT_MIN_AGE", default_value_t = 18)]
    pub default_min_age: i32,

    /// Oldest calendar-year age used when a request names no window.
    ///
    /// Environment variable: `DEFAULT_MAX_AGE`
    #[arg(long, env = "DEFAULT_MAX_AGE", default_value_t = 69)]
    pub default_max_age: i32,

    /// Batches allowed to run at the same time. Further requests wait.
    ///
    /// Environment variable: `MAX_CONCURRENT_BATCHES`
    #[arg(long, env = "MAX_CONCURRENT_BATCHES", default_value_t = 4)]
    pub max_concurrent_batches: usize,

    /// Seconds to wait for in-flight requests after a shutdown signal.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 5)]
    pub shutdown_timeout: u64,

    /// Base seed for reproducible output. Unset draws a fresh seed per
    /// request.
    ///
    /// Environment variable: `SEED`
    #[arg(long, env = "SEED")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub max_persons: usize,
    pub max_uuids: usize,
    pub default_min_age: i32,
    pub default_max_age: i32,
    pub max_concurrent_batches: usize,
    pub shutdown_timeout: Duration,
    pub seed: Option<u64>,
    pub batch: BatchConfig,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.batch_size_hint == 0 {
            bail!("BATCH_SIZE_HINT must be greater than 0");
        }

        if args.attempts_per_item == 0 {
            bail!("ATTEMPTS_PER_ITEM must be greater than 0");
        }

        if args.max_concurrent_batches == 0 {
            bail!("MAX_CONCURRENT_BATCHES must be greater than 0");
        }

        if !(0..=MAX_AGE).contains(&args.default_min_age)
            || !(0..=MAX_AGE).contains(&args.default_max_age)
        {
            bail!("DEFAULT_MIN_AGE and DEFAULT_MAX_AGE must lie within 0..={MAX_AGE}");
        }

        if args.default_min_age > args.default_max_age {
            bail!(
                "DEFAULT_MIN_AGE ({}) exceeds DEFAULT_MAX_AGE ({})",
                args.default_min_age,
                args.default_max_age
            );
        }

        Ok(Self {
            server_addr: args.server_addr,
            max_persons: args.max_persons,
            max_uuids: args.max_uuids,
            default_min_age: args.default_min_age,
            default_max_age: args.default_max_age,
            max_concurrent_batches: args.max_concurrent_batches,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            seed: args.seed,
            batch: BatchConfig {
                batch_size_hint: args.batch_size_hint,
                max_workers: args.num_workers,
                attempts_per_item: args.attempts_per_item,
                seed: args.seed,
            },
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_addr: String::from("0.0.0.0:8080"),
            max_persons: 25_000,
            max_uuids: 50_000,
            default_min_age: 18,
            default_max_age: 69,
            max_concurrent_batches: 4,
            shutdown_timeout: Duration::from_secs(5),
            seed: None,
            batch: BatchConfig::default(),
        }
    }
}
