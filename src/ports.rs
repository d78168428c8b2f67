pub mod clients;
pub mod notify;
pub mod reminders;
pub mod storage;
pub mod time;

pub use clients::{ClientWindow, Clients};
pub use notify::{Notifier, PermissionPrompt};
pub use reminders::PendingReminders;
pub use storage::KeyValueStore;
pub use time::TimeProvider;
