use std::sync::Arc;

use crate::config::Config;
use crate::engine::registry::SessionRegistry;
use crate::error::Result;
use crate::store::memory::MemoryStore;
use crate::store::{ResponseStore, postgres};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The durable response store.
    pub store: Arc<dyn ResponseStore>,
    /// The owner of every live quiz session.
    pub registry: SessionRegistry,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Creates a new `AppState`. Falls back to the in-memory store when no
    /// database is configured.
    pub fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn ResponseStore> = match config.database_url {
            Some(ref url) => {
                let pool = postgres::create_pool(url)?;
                tracing::info!("✅ PostgreSQL response store initialized");
                Arc::new(postgres::PgStore::new(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; responses will not survive a restart");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(AppState {
            store,
            registry: SessionRegistry::new(config.session_ttl()),
            config: config.clone(),
        })
    }

    /// State backed by a caller-supplied store. Used by tests.
    pub fn with_store(config: Config, store: Arc<dyn ResponseStore>) -> Self {
        AppState {
            store,
            registry: SessionRegistry::new(config.session_ttl()),
            config,
        }
    }
}
