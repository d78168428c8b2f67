use std::net::SocketAddr;
use std::path::PathBuf;

use crate::types::notification::Permission;

pub const DEFAULT_APP_NAME: &str = "Eventify";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub api_base_url: String,
    /// JSON file holding the persisted `token` and `user` entries.
    pub state_path: PathBuf,
    pub worker_addr: SocketAddr,
    /// Permission state before any prompt has been answered.
    pub permission: Permission,
    pub desktop_notifications: bool,
}

/// `<data dir>/eventify/session.json`, or a relative path when the platform
/// has no data directory.
pub fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("eventify")
        .join("session.json")
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            api_base_url: crate::api::DEFAULT_BASE_URL.to_string(),
            state_path: std::env::temp_dir().join("eventify-test").join("session.json"),
            worker_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            permission: Permission::Granted,
            desktop_notifications: false,
        }
    }
}
