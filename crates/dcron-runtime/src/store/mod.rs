mod memory;
mod redis_zset;

pub use memory::MemoryStore;
pub use redis_zset::RedisStore;

use std::sync::Arc;

use dcron_core::config::{StoreBackend, StoreConfig};
use dcron_core::store::SortedSetStore;
use dcron_core::Result;

/// Build the store selected by a configuration section.
pub async fn from_config(config: &StoreConfig) -> Result<Arc<dyn SortedSetStore>> {
    let store: Arc<dyn SortedSetStore> = match config.backend {
        StoreBackend::Redis | StoreBackend::RedisCluster => {
            Arc::new(RedisStore::from_config(config).await?)
        }
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::debug!(backend = store.backend_name(), "Store ready");
    Ok(store)
}
