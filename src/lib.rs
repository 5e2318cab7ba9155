pub mod advisory;
pub mod api;
pub mod authorization;
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;
pub mod profiles;
pub mod seed;
pub mod session;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::advisory::{AdvisoryError, AdvisoryService, OllamaClient};
use crate::config::{AppConfig, ConfigError};
use crate::core_state::CoreState;
use crate::db::{MemoryProfileStore, ProfileStore, SqliteProfileStore, StoreError};
use crate::seed::SeedError;
use crate::session::{ProfileDefaults, TokenIdentityProvider};

/// Anything that stops the server from coming up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Profile store: {0}")]
    Store(#[from] StoreError),
    #[error("Demo roster: {0}")]
    Seed(#[from] SeedError),
    #[error("Advisory client: {0}")]
    Advisory(#[from] AdvisoryError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read configuration, open the store, and serve the API until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    let store = open_store(&config)?;

    let identities = Arc::new(TokenIdentityProvider::new());
    if config.seed_demo {
        for account in seed::populate_demo_roster(store.as_ref(), &identities)? {
            tracing::info!(
                email = %account.email,
                role = %account.role,
                created = account.created,
                token = %account.token,
                "Demo account ready"
            );
        }
    }

    // The blocking reqwest client owns a runtime of its own, so it is
    // built before ours starts.
    let client = OllamaClient::new(&config.ollama_url, config.ollama_timeout_secs)?;
    tracing::info!(url = client.base_url(), model = %config.model, "Advisory model configured");
    let advisory = AdvisoryService::new(Box::new(client), &config.model);
    match advisory.is_model_available() {
        Ok(true) => tracing::info!(model = %config.model, "Advisory model available"),
        Ok(false) => tracing::warn!(
            model = %config.model,
            "Advisory model not pulled; advisory requests will fail until it is"
        ),
        Err(e) => tracing::warn!(error = %e, "Advisory model unreachable; continuing without it"),
    }

    let defaults = ProfileDefaults {
        demo_data: config.demo_data,
        ..ProfileDefaults::default()
    };
    let core = Arc::new(CoreState::new(store, identities, advisory, defaults));

    // The last `CoreState` reference (and its blocking client) is dropped
    // here on the main thread, outside the runtime.
    let serving = Arc::clone(&core);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut server = api::start_api_server(serving, config.bind_addr).await?;
        tracing::info!(addr = %server.session.server_addr, "Listening");

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
        }
        server.shutdown();
        server.stopped().await;
        Ok::<(), StartupError>(())
    })?;

    drop(runtime);
    drop(core);
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}

fn open_store(config: &AppConfig) -> Result<Arc<dyn ProfileStore>, StartupError> {
    match &config.database_path {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            tracing::info!(path = %path.display(), "Opening SQLite profile store");
            Ok(Arc::new(SqliteProfileStore::open(path)?))
        }
        None => {
            tracing::warn!("No database path configured; profiles are kept in memory");
            Ok(Arc::new(MemoryProfileStore::new()))
        }
    }
}
