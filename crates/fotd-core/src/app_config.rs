use std::path::PathBuf;

use crate::stores::UpdateInterval;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: String,
    pub stores_path: PathBuf,
    pub http_timeout_secs: u64,
    pub http_connect_timeout_secs: u64,
    pub user_agent: String,
    /// Poll interval for store entries that do not set their own.
    pub default_update_interval: UpdateInterval,
}
