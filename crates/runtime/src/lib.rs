use anyhow::{Context, Result};
use messenger_auth::Authenticator;
use messenger_chats::{ChatService, MessageService};
use messenger_config::AppConfig;
use messenger_database::{initialize_database, now_timestamp, SessionRepository};
use sqlx::SqlitePool;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    /// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
    pub chat_service: ChatService,
    pub message_service: MessageService,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .with_context(|| format!("failed to initialise database at {}", config.database.url))?;
        info!(url = %config.database.url, "database ready");

        let purged = SessionRepository::new(db_pool.clone())
            .delete_expired(&now_timestamp())
            .await
            .context("failed to purge expired sessions")?;
        if purged > 0 {
            info!(purged, "removed expired sessions");
        }

        let authenticator = Authenticator::new(db_pool.clone(), config.auth.clone());
        let chat_service = ChatService::new(db_pool.clone());
        let message_service = MessageService::new(db_pool.clone());

        Ok(Self {
            db_pool,
            authenticator,
            chat_service,
            message_service,
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
