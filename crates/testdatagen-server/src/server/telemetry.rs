//! # Logging
//!
//! Installs a `tracing` subscriber that prints spans and events as
//! human-readable output. The level is taken from `RUST_LOG` and defaults to
//! `info`.
//!
//! ```bash
//! RUST_LOG=testdatagen=debug,testdatagen_server=debug cargo run
//! ```
//!
//! The library crate emits its own events (batch partitioning, worker
//! shortfalls) because the server enables its `tracing` feature.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        )
        .try_init()?;
    Ok(())
}
