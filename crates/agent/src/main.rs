//! Paral computing agent.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use paral_agent::{spawn_workers, OrchestratorClient};
use paral_core::{load_dotenv, AgentConfig};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paral-agent")]
#[command(about = "Paral agent - computes tasks leased by the orchestrator", long_about = None)]
struct Cli {
    /// Orchestrator base URL (overrides ORCHESTRATOR_URL)
    #[arg(short, long)]
    url: Option<String>,

    /// Number of concurrent workers (overrides COMPUTING_POWER)
    #[arg(short, long)]
    workers: Option<usize>,
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

    let mut config = AgentConfig::from_env();
    if let Some(url) = cli.url {
        config.orchestrator_url = url;
    }
    if let Some(workers) = cli.workers {
        config.computing_power = workers.max(1);
    }

    let client = Arc::new(OrchestratorClient::new(&config.orchestrator_url)?);
    info!(
        "Agent starting {} worker(s) against {}",
        config.computing_power, config.orchestrator_url
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let workers = spawn_workers(client, config.computing_power, config.poll_interval, shutdown_rx);

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    let _ = shutdown_tx.send(true);

    for worker in workers {
        if let Err(e) = worker.await? {
            error!("worker exited with error: {:#}", e);
        }
    }
    Ok(())
}
