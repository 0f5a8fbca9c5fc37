//! Gateway binary entry point.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse::config::{load_config, GatewayConfig};
use gatehouse::lifecycle::signals::wait_for_signal;
use gatehouse::{Gateway, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "gatehouse", about = "Dual-protocol RPC/JSON front door")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("gatehouse v0.1.0 starting");

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    tracing::info!(
        address = %config.listen_address,
        tls = config.tls.is_some(),
        request_timeout_secs = config.limits.request_timeout_secs,
        "configuration loaded"
    );

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let signal = wait_for_signal().await;
            tracing::info!(signal = signal, "shutdown signal received");
            shutdown.trigger();
        });
    }

    Gateway::new(config).start(shutdown).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
