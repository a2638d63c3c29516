//! targetsync daemon
//!
//! Watches a Consul service and keeps a destination target set in step with
//! its passing instances. Only the replica holding the lock writes; the others
//! follow the locker and take over when it changes hands.
//!
//! Optional readiness probe on `--bind-address`: /ready, /health, /status.

#![cfg_attr(test, allow(clippy::unwrap_used))]

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod api;
mod cli;
mod server_utils;
mod state;

use cli::Cli;
use state::AppState;
use targetsync_core::consul::{ConsulLocker, ConsulSource};
use targetsync_core::modules::{load_config, MemoryDestination, StaticLocker};
use targetsync_core::{Locker, Syncer, TargetDestination};
use targetsync_types::{AppConfig, DestinationConfig, LockerConfig};

/// How long shutdown waits for the lock to be released in Consul.
const RELEASE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let result = run(cli).await;
    if let Err(e) = &result {
        tracing::error!("[Main] Error running targetsync: {:#}", e);
    }
    result
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .with_context(|| format!("Unknown log level {}", level))?;
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    info!("[Main] targetsync {} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli.config).context("Unable to load config")?;
    let collaborators = Collaborators::build(&config)?;

    let syncer = Syncer::new(
        config.syncer.clone(),
        Arc::clone(&collaborators.locker),
        collaborators.source,
        collaborators.destination,
    )
    .with_local_addr(cli.local_addr.unwrap_or_default());

    let shutdown = CancellationToken::new();

    if let Some(addr) = cli.bind_address {
        let state = AppState::new(syncer.subscribe_state());
        server_utils::spawn_probe_server(addr, state, shutdown.clone()).await?;
    }

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = server_utils::cancel_on_signal(shutdown.clone()).await {
                tracing::error!("[Main] Signal handling failed, stopping: {}", e);
                shutdown.cancel();
            }
        });
    }

    let result = syncer.run(shutdown.clone()).await;
    shutdown.cancel();

    if let Some(consul_locker) = &collaborators.consul_locker {
        if tokio::time::timeout(RELEASE_TIMEOUT, consul_locker.wait_released()).await.is_err() {
            tracing::warn!("[Main] Lock release did not finish in {:?}", RELEASE_TIMEOUT);
        }
    }

    result.context("Syncer stopped")?;
    info!("[Main] Stopped");
    Ok(())
}

struct Collaborators {
    source: Arc<ConsulSource>,
    destination: Arc<dyn TargetDestination>,
    locker: Arc<dyn Locker>,
    /// Kept to wait for the session cleanup on shutdown.
    consul_locker: Option<ConsulLocker>,
}

impl Collaborators {
    fn build(config: &AppConfig) -> Result<Self> {
        let source =
            ConsulSource::new(&config.consul).context("Error creating consul source")?;

        let destination: Arc<dyn TargetDestination> = match config.destination {
            DestinationConfig::Memory => Arc::new(MemoryDestination::new()),
        };

        let (locker, consul_locker): (Arc<dyn Locker>, Option<ConsulLocker>) = match config.locker
        {
            LockerConfig::Consul => {
                let locker =
                    ConsulLocker::new(&config.consul).context("Error creating consul locker")?;
                (Arc::new(locker.clone()), Some(locker))
            },
            LockerConfig::Static => (Arc::new(StaticLocker), None),
        };

        Ok(Self { source: Arc::new(source), destination, locker, consul_locker })
    }
}
