use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::storage::StorageConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<StorageConfig>,
    /// Held across read-modify-write cycles on the JSONL files
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let storage = StorageConfig::new(config.data_dir.clone());
        Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}
