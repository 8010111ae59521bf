use std::sync::Arc;

use anyhow::{Context, Result};
use societas_completion::{CompletionClient, GeminiClient};
use societas_config::{AppConfig, StoreBackend};
use societas_identity::{FirebaseIdentity, IdentityProvider};
use societas_store::{DocumentStore, FirestoreStore, SqliteDocumentStore};
use tracing::{info, warn};

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::DEBUG)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Long-lived collaborators shared by every request.
#[derive(Clone)]
pub struct BackendServices {
    pub store: Arc<dyn DocumentStore>,
    /// Set when the embedded backend is active; used by the maintenance commands.
    pub sqlite: Option<SqliteDocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub completion: Arc<dyn CompletionClient>,
    pub system_instruction: String,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let (store, sqlite): (Arc<dyn DocumentStore>, Option<SqliteDocumentStore>) =
            match config.store.backend {
                StoreBackend::Sqlite => {
                    let sqlite = SqliteDocumentStore::connect(&config.store.sqlite)
                        .await
                        .context("failed to open sqlite document store")?;
                    info!(url = %config.store.sqlite.url, "sqlite document store ready");
                    (Arc::new(sqlite.clone()), Some(sqlite))
                }
                StoreBackend::Firestore => {
                    let firestore = FirestoreStore::new(&config.store.firestore)
                        .context("failed to configure firestore document store")?;
                    info!(
                        project = ?config.store.firestore.project_id,
                        emulator = ?config.store.firestore.emulator_host,
                        "firestore document store ready"
                    );
                    (Arc::new(firestore), None)
                }
            };

        let identity: Arc<dyn IdentityProvider> = Arc::new(FirebaseIdentity::new(&config.identity));

        let completion: Arc<dyn CompletionClient> = Arc::new(
            GeminiClient::new(&config.completion).context("failed to build completion client")?,
        );
        info!(model = %config.completion.model, "completion client ready");

        Ok(Self {
            store,
            sqlite,
            identity,
            completion,
            system_instruction: config.completion.system_instruction.clone(),
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
