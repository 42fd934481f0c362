//! Server setup and lifecycle management

use crate::api::{create_router, AppState};
use crate::config::{DaemonConfig, StorageConfig};
use crate::error::{DaemonError, DaemonResult};
use crate::service::CommitmentService;
use commits_credit::CreditEngine;
use commits_parser::PromiseParser;
use commits_storage::{CommitmentStore, InMemoryCommitmentStore};
use std::sync::Arc;
use tokio::net::TcpListener;

/// commitsd server
pub struct Server {
    config: DaemonConfig,
    service: Arc<CommitmentService>,
}

impl Server {
    /// Build the store, parser and credit engine described by `config`
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        config.validate()?;

        let store = open_store(&config.storage).await?;
        let parser = PromiseParser::natural(&config.parser)
            .map_err(|e| DaemonError::Config(format!("parser: {e}")))?;
        let credit = CreditEngine::new(config.credit)
            .map_err(|e| DaemonError::Config(format!("credit: {e}")))?;

        let service = Arc::new(CommitmentService::new(store, Arc::new(parser), credit));
        Ok(Self { config, service })
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = create_router(AppState::new(self.service), &self.config.server);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "commitsd listening");

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("commitsd shutting down");
        Ok(())
    }
}

async fn open_store(storage: &StorageConfig) -> DaemonResult<Arc<dyn CommitmentStore>> {
    match storage {
        StorageConfig::Memory => {
            tracing::info!("using in-memory commitment store");
            Ok(Arc::new(InMemoryCommitmentStore::new()))
        }
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres {
            url,
            max_connections,
            connect_timeout_secs,
        } => {
            let store = commits_storage::postgres::PostgresCommitmentStore::connect_with_options(
                url,
                *max_connections,
                *connect_timeout_secs,
            )
            .await?;
            tracing::info!(max_connections, "using postgres commitment store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StorageConfig::Postgres { .. } => Err(DaemonError::Config(
            "postgres storage requires building commitsd with the `postgres` feature".to_string(),
        )),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_with_default_config() {
        assert!(Server::new(DaemonConfig::default()).await.is_ok());
    }

    #[cfg(not(feature = "postgres"))]
    #[tokio::test]
    async fn postgres_without_feature_is_config_error() {
        let config = DaemonConfig {
            storage: StorageConfig::Postgres {
                url: "postgres://localhost/commits".into(),
                max_connections: 1,
                connect_timeout_secs: 1,
            },
            ..Default::default()
        };
        assert!(matches!(
            Server::new(config).await,
            Err(DaemonError::Config(_))
        ));
    }
}
