use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::calculate::StatsSettings;
use crate::config::{AppConfig, ConfigError};
use crate::models::SeasonTable;
use crate::normalize::QueueNames;
use crate::storage::RecordStore;

/// Router-level options that are not part of the data.
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    pub cors_origin: String,
    pub static_dir: Option<PathBuf>,
    pub access_log: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<RecordStore>>,
    pub seasons: Arc<SeasonTable>,
    pub queues: Arc<QueueNames>,
    pub stats: Arc<StatsSettings>,
    pub http: Arc<HttpOptions>,
}

impl AppState {
    pub fn new(store: RecordStore, config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            store: Arc::new(RwLock::new(store)),
            seasons: Arc::new(config.season_table()?),
            queues: Arc::new(config.queue_names()),
            stats: Arc::new(config.stats_settings()),
            http: Arc::new(HttpOptions {
                cors_origin: config.server.cors_origin.clone(),
                static_dir: config.server.static_dir.clone(),
                access_log: false,
            }),
        })
    }

    pub fn with_access_log(mut self, enabled: bool) -> Self {
        let mut http = (*self.http).clone();
        http.access_log = enabled;
        self.http = Arc::new(http);
        self
    }
}
