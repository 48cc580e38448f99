use crate::auth::StaticTenants;
use crate::config::Config;
use crate::routes::{router, AppState};
use anyhow::{Context, Result};
use noticeboard_persistence::MessageStore;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Gateway service - wires configuration, store and HTTP surface together
pub struct GatewayService {
    config: Config,
}

impl GatewayService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until Ctrl+C
    pub async fn run(self) -> Result<()> {
        let logging = &self.config.logging;
        let _guard = noticeboard_logging::init_logging(
            &logging.level,
            logging.directory.as_deref().map(Path::new),
            logging.json,
        )?;
        info!("Starting Noticeboard Gateway Service");

        let tenants = StaticTenants::new(&self.config.auth.tenants)
            .context("invalid tenant id in auth.tenants")?;
        if tenants.is_empty() {
            warn!("No tenants configured; every request except /ping will be rejected");
        } else {
            info!("Loaded credentials for {} tenant(s)", tenants.len());
        }

        let store = MessageStore::connect(&self.config.database)
            .await?
            .with_page_size(self.config.api.page_size);
        info!("Message store ready (page size {})", store.page_size());

        let app = router(AppState {
            store,
            resolver: Arc::new(tenants),
        });

        let address = self.config.server.address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind {}", address))?;
        info!("Listening on {}", address);

        let shutdown = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
            }
            info!("Received shutdown signal");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Gateway service stopped");
        Ok(())
    }
}
