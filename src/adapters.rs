use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::ports::{self, ClientWindow};
use crate::types::notification::{Notification, Permission};
use crate::types::reminder::PendingReminder;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

/// Key-value entries kept as one JSON object on disk. Every write rewrites
/// the whole file; there is no locking between processes.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl ports::KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Logs every notification and, when enabled, raises a desktop notification.
#[derive(Debug, Clone)]
pub struct SystemNotifier {
    app_name: String,
    desktop: bool,
}

impl SystemNotifier {
    pub fn new(app_name: &str, desktop: bool) -> Self {
        Self {
            app_name: app_name.to_string(),
            desktop,
        }
    }
}

impl ports::Notifier for SystemNotifier {
    type Error = String;

    fn display(&self, notification: &Notification) -> Result<(), Self::Error> {
        info!(
            tag = %notification.tag,
            body = notification.body.as_deref().unwrap_or(""),
            "notification: {}",
            notification.title
        );
        if !self.desktop {
            return Ok(());
        }
        notify_rust::Notification::new()
            .summary(&notification.title)
            .body(notification.body.as_deref().unwrap_or(""))
            .appname(&self.app_name)
            .show()
            .map(|_| ())
            .map_err(|err| format!("desktop notification failed: {err}"))
    }
}

/// Permission state held in memory. A prompt from `default` asks on the
/// terminal; `granted` and `denied` are final.
#[derive(Debug, Clone)]
pub struct ConsolePrompt {
    state: Arc<Mutex<Permission>>,
    app_name: String,
}

impl ConsolePrompt {
    pub fn new(initial: Permission, app_name: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial)),
            app_name: app_name.to_string(),
        }
    }
}

impl ports::PermissionPrompt for ConsolePrompt {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Permission> + Send + 'a>>
    where
        Self: 'a;

    fn current(&self) -> Permission {
        *self.state.lock().expect("permission lock")
    }

    fn request<'a>(&'a self) -> Self::Fut<'a> {
        Box::pin(async move {
            let current = self.current();
            if current != Permission::Default {
                return current;
            }
            let question = format!("Allow {} to show notifications? [y/N] ", self.app_name);
            let answer = tokio::task::spawn_blocking(move || ask(&question)).await;
            let permission = match answer {
                Ok(true) => Permission::Granted,
                Ok(false) => Permission::Denied,
                Err(err) => {
                    warn!("permission prompt failed: {err}");
                    return current;
                }
            };
            *self.state.lock().expect("permission lock") = permission;
            permission
        })
    }
}

fn ask(question: &str) -> bool {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "{question}");
    let _ = stdout.flush();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

/// In-process stand-in for the set of open application windows.
#[derive(Debug, Clone, Default)]
pub struct WindowRegistry {
    windows: Arc<Mutex<Vec<ClientWindow>>>,
    next_id: Arc<AtomicU64>,
}

impl ports::Clients for WindowRegistry {
    fn match_all(&self) -> Vec<ClientWindow> {
        self.windows.lock().expect("windows lock").clone()
    }

    fn focus(&self, id: u64) -> bool {
        let windows = self.windows.lock().expect("windows lock");
        match windows.iter().find(|window| window.id == id) {
            Some(window) => {
                info!(url = %window.url, "focusing window {id}");
                true
            }
            None => false,
        }
    }

    fn open_window(&self, url: &str) -> Option<ClientWindow> {
        let window = ClientWindow {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            url: url.to_string(),
        };
        info!(url, "opening window {}", window.id);
        self.windows
            .lock()
            .expect("windows lock")
            .push(window.clone());
        Some(window)
    }
}

/// No durable reminder store exists yet, so there is never anything pending.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyPendingReminders;

impl ports::PendingReminders for EmptyPendingReminders {
    type PendingFut<'a>
        = std::future::Ready<Vec<PendingReminder>>
    where
        Self: 'a;
    type RemoveFut<'a>
        = std::future::Ready<()>
    where
        Self: 'a;

    fn pending<'a>(&'a self) -> Self::PendingFut<'a> {
        debug!("pending reminder store is empty");
        std::future::ready(Vec::new())
    }

    fn remove<'a>(&'a self, _id: &'a str) -> Self::RemoveFut<'a> {
        std::future::ready(())
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::ports::{Clients, KeyValueStore, PendingReminders, PermissionPrompt};

    fn temp_path(name: &str) -> PathBuf {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        std::env::temp_dir().join(format!("eventify-{name}-{nanos}")).join("session.json")
    }

    #[test]
    fn file_store__should_persist_across_instances() {
        // Given
        let path = temp_path("persist");
        let store = FileStore::new(&path);

        // When
        store.set("token", "t1").expect("set token");
        store.set("user", r#"{"username":"a"}"#).expect("set user");

        // Then
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("token").expect("get"), Some("t1".to_string()));
        assert_eq!(
            reopened.get("user").expect("get"),
            Some(r#"{"username":"a"}"#.to_string())
        );

        let _ = std::fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn file_store__should_treat_missing_file_as_empty() {
        let store = FileStore::new(temp_path("missing"));

        assert_eq!(store.get("token").expect("get"), None);
        store.remove("token").expect("remove");
    }

    #[test]
    fn file_store__should_remove_entries() {
        // Given
        let path = temp_path("remove");
        let store = FileStore::new(&path);
        store.set("token", "t1").expect("set");

        // When
        store.remove("token").expect("remove");

        // Then
        assert_eq!(store.get("token").expect("get"), None);

        let _ = std::fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn file_store__should_report_corrupt_file() {
        // Given
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "not json").expect("write");

        // When
        let result = FileStore::new(&path).get("token");

        // Then
        assert!(matches!(result, Err(StoreError::Json(_))));

        let _ = std::fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[tokio::test]
    async fn console_prompt__should_not_ask_once_decided() {
        let prompt = ConsolePrompt::new(Permission::Denied, "Eventify");

        assert_eq!(prompt.request().await, Permission::Denied);
        assert_eq!(prompt.current(), Permission::Denied);
    }

    #[test]
    fn window_registry__should_focus_only_open_windows() {
        // Given
        let windows = WindowRegistry::default();

        // When
        let opened = windows.open_window("/events/4").expect("opened");

        // Then
        assert_eq!(opened.id, 1);
        assert_eq!(windows.match_all(), vec![opened.clone()]);
        assert!(windows.focus(opened.id));
        assert!(!windows.focus(99));
    }

    #[tokio::test]
    async fn empty_pending_reminders__should_have_nothing_pending() {
        assert!(EmptyPendingReminders.pending().await.is_empty());
    }
}
