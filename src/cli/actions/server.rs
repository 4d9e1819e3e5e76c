use crate::{
    api,
    cli::telemetry,
    credentials::{
        Argon2Hasher, MemoryUserStore, PgUserStore, UserRepository, UserStore, WorkFactor,
    },
};
use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug)]
pub enum Backend {
    Postgres { dsn: String, max_connections: u32 },
    Memory,
}

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub backend: Backend,
    pub work_factor: WorkFactor,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store cannot be reached, the hasher parameters are
/// invalid, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let hasher = Argon2Hasher::new(args.work_factor)?;

    let store: Arc<dyn UserStore> = match args.backend {
        Backend::Postgres {
            dsn,
            max_connections,
        } => Arc::new(PgUserStore::connect(&dsn, max_connections).await?),
        Backend::Memory => {
            warn!("Using in-memory user store, users are lost on exit");
            Arc::new(MemoryUserStore::new())
        }
    };

    let repository = Arc::new(UserRepository::new(store, Arc::new(hasher)));

    let result = api::serve(args.port, repository, shutdown_signal()).await;

    telemetry::shutdown_tracer();

    result
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    info!("Gracefully shutdown");
}
