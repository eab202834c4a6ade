use std::sync::Arc;

use bayline_db::store::Stores;
use bayline_db::DbPool;
use bayline_queue::{EnforcementJob, MaintenanceManager, QueueManager, SettingsProvider};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool. `None` when running on the in-process store.
    pub pool: Option<DbPool>,
    pub config: Arc<ServerConfig>,
    pub settings: Arc<SettingsProvider>,
    pub queue: Arc<QueueManager>,
    pub items: Arc<MaintenanceManager>,
    pub enforcement: Arc<EnforcementJob>,
}

impl AppState {
    /// Wire the queue services onto `stores`.
    pub fn new(config: ServerConfig, stores: &Stores, pool: Option<DbPool>) -> Self {
        let settings = Arc::new(SettingsProvider::new(
            Arc::clone(&stores.settings),
            config.settings_cache_ttl(),
        ));

        Self {
            pool,
            queue: Arc::new(QueueManager::new(stores, Arc::clone(&settings))),
            items: Arc::new(MaintenanceManager::new(stores)),
            enforcement: Arc::new(EnforcementJob::new(stores, Arc::clone(&settings))),
            settings,
            config: Arc::new(config),
        }
    }
}
