use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{AppConfig, StoreKind};
use crate::memory_store::MemoryStore;
use crate::store::{MarketStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = match config.store {
            StoreKind::Postgres => {
                let pg = PgStore::connect(&config.db).await?;
                info!(schema = %config.db.schema, "connected to postgres");
                Arc::new(pg) as Arc<dyn MarketStore>
            }
            StoreKind::Memory => {
                warn!("using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new()) as Arc<dyn MarketStore>
            }
        };
        Ok(Self::from_parts(store, Arc::new(config)))
    }

    pub fn from_parts(store: Arc<dyn MarketStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// Fresh state over an empty in-memory store.
    #[cfg(test)]
    pub fn memory() -> Self {
        let config = Arc::new(AppConfig {
            store: StoreKind::Memory,
            db: crate::config::DbConfig {
                url: None,
                schema: "public".into(),
                max_connections: 1,
                connect_timeout: std::time::Duration::from_secs(1),
            },
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::from_parts(Arc::new(MemoryStore::new()), config)
    }
}
