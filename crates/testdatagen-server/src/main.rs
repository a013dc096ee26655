#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use core::future::IntoFuture;
use server::config::{CliArgs, ServerConfig};
use server::handler::router;
use server::service::PersonService;
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry()?;

    let listener = TcpListener::bind(&config.server_addr).await?;
    log_startup_info(&config);

    let shutdown_timeout = config.shutdown_timeout;
    let service = PersonService::new(config);
    let stopping = service.shutdown_token();

    let server = axum::serve(listener, router(service.clone()))
        .with_graceful_shutdown(shutdown_signal(service))
        .into_future();

    tokio::select! {
        res = server => res?,
        () = async {
            stopping.cancelled().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!(
                "In-flight requests did not drain within {:?}, exiting",
                shutdown_timeout
            );
        }
    }

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting person service on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting person service on {} with up to {} concurrent batches",
            config.server_addr,
            config.max_concurrent_batches
        );
    }
}

async fn shutdown_signal(service: PersonService) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            core::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");

    // Aborts running batches; their requests answer 503.
    service.shutdown();
}
