//! Paral orchestrator server.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use paral_core::{load_dotenv, Config};
use paral_orchestrator::{build_router, Orchestrator};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paral-orchestrator")]
#[command(about = "Paral orchestrator - compiles expressions and leases tasks to agents", long_about = None)]
struct Cli {
    /// Address to bind (overrides ORCHESTRATOR_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides ORCHESTRATOR_PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    init_logging();

    let mut config = Config::from_env();
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.log_summary();

    let orchestrator = Arc::new(Orchestrator::from_config(&config));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper = orchestrator.spawn_reaper(shutdown_rx);

    let app = build_router(Arc::clone(&orchestrator));
    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    info!("Orchestrator listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    reaper.await?;
    Ok(())
}
