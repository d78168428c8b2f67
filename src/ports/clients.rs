use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientWindow {
    pub id: u64,
    pub url: String,
}

/// Open application windows as seen from the worker.
pub trait Clients: Clone + Send + Sync + 'static {
    fn match_all(&self) -> Vec<ClientWindow>;
    fn focus(&self, id: u64) -> bool;
    /// `None` when the platform cannot open windows.
    fn open_window(&self, url: &str) -> Option<ClientWindow>;
}
