use crate::config::AppConfig;
use crate::notifications::ActiveNotifications;
use crate::reminders::ReminderRegistry;
use crate::worker::WorkerHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub worker: WorkerHandle,
    pub active: ActiveNotifications,
    pub scheduled: ReminderRegistry,
}
