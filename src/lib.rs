pub mod adapters;
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod notifications;
pub mod ports;
pub mod reminders;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

use std::net::SocketAddr;

use tracing::info;

pub use app::app;

use crate::adapters::{
    ConsolePrompt, EmptyPendingReminders, SystemNotifier, TokioTimeProvider, WindowRegistry,
};
use crate::notifications::{NotificationCenter, NotificationService};

pub type SystemCenter = NotificationCenter<SystemNotifier, ConsolePrompt>;
pub type SystemNotificationService =
    NotificationService<TokioTimeProvider, SystemNotifier, ConsolePrompt>;

/// Notification center backed by the terminal prompt and the system notifier.
pub fn system_center(config: &config::AppConfig) -> SystemCenter {
    NotificationCenter::new(
        SystemNotifier::new(&config.app_name, config.desktop_notifications),
        ConsolePrompt::new(config.permission, &config.app_name),
    )
}

pub fn notification_service(config: &config::AppConfig) -> SystemNotificationService {
    NotificationService::new(
        api::ApiClient::new(&config.api_base_url),
        TokioTimeProvider,
        system_center(config),
    )
}

/// Starts the worker with the production adapters and returns the state the
/// HTTP intake serves from.
pub fn worker_state(config: config::AppConfig) -> state::AppState {
    let center = system_center(&config);
    let active = center.active_handle();
    let scheduled = reminders::new_registry();
    let worker = worker::ServiceWorker::new(
        TokioTimeProvider,
        center,
        WindowRegistry::default(),
        EmptyPendingReminders,
        scheduled.clone(),
    )
    .spawn();
    state::AppState {
        config,
        worker,
        active,
        scheduled,
    }
}

pub async fn serve(state: state::AppState) -> std::io::Result<()> {
    let addr: SocketAddr = state.config.worker_addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("worker listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
