//! Fakes shared by the unit tests.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use axum::Router;
use time::OffsetDateTime;
use tokio::sync::oneshot;

use crate::error::StoreError;
use crate::ports::{self, ClientWindow};
use crate::types::notification::{Notification, Permission};
use crate::types::reminder::PendingReminder;

#[derive(Clone)]
pub struct TestTime {
    now: OffsetDateTime,
    sleeps: Arc<Mutex<Vec<oneshot::Sender<()>>>>,
    durations: Arc<Mutex<Vec<Duration>>>,
}

impl TestTime {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now,
            sleeps: Arc::new(Mutex::new(Vec::new())),
            durations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sleep_durations(&self) -> Vec<Duration> {
        self.durations.lock().expect("durations lock").clone()
    }

    pub fn trigger_all(&self) {
        let mut sends = self.sleeps.lock().expect("sleeps lock");
        for sender in sends.drain(..) {
            let _ = sender.send(());
        }
    }
}

pub struct ManualSleep {
    receiver: oneshot::Receiver<()>,
}

impl Future for ManualSleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(_) => Poll::Ready(()),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl ports::TimeProvider for TestTime {
    type Sleep<'a>
        = ManualSleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        self.now
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        let (sender, receiver) = oneshot::channel();
        self.durations
            .lock()
            .expect("durations lock")
            .push(duration);
        self.sleeps.lock().expect("sleeps lock").push(sender);
        ManualSleep { receiver }
    }
}

#[derive(Debug)]
pub struct TestDisplayError;

impl std::fmt::Display for TestDisplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("test display error")
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    shown: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().expect("shown lock").clone()
    }
}

impl ports::Notifier for RecordingNotifier {
    type Error = TestDisplayError;

    fn display(&self, notification: &Notification) -> Result<(), Self::Error> {
        self.shown
            .lock()
            .expect("shown lock")
            .push(notification.clone());
        Ok(())
    }
}

/// Permission state that the test controls. A prompt moves a `default`
/// state to the configured answer.
#[derive(Debug, Clone)]
pub struct FixedPermission {
    state: Arc<Mutex<Permission>>,
    answer: Permission,
}

impl FixedPermission {
    pub fn new(permission: Permission) -> Self {
        Self {
            state: Arc::new(Mutex::new(permission)),
            answer: permission,
        }
    }

    pub fn answering(answer: Permission) -> Self {
        Self {
            state: Arc::new(Mutex::new(Permission::Default)),
            answer,
        }
    }

    pub fn set(&self, permission: Permission) {
        *self.state.lock().expect("permission lock") = permission;
    }
}

impl ports::PermissionPrompt for FixedPermission {
    type Fut<'a>
        = std::future::Ready<Permission>
    where
        Self: 'a;

    fn current(&self) -> Permission {
        *self.state.lock().expect("permission lock")
    }

    fn request<'a>(&'a self) -> Self::Fut<'a> {
        let mut state = self.state.lock().expect("permission lock");
        if *state == Permission::Default {
            *state = self.answer;
        }
        std::future::ready(*state)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    rejected: Option<&'static str>,
}

impl MemoryStore {
    /// A store whose writes to `key` fail as if the disk were full.
    pub fn rejecting(key: &'static str) -> Self {
        Self {
            rejected: Some(key),
            ..Self::default()
        }
    }
}

impl ports::KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().expect("store lock").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.rejected.is_some_and(|rejected| rejected == key) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.entries
            .lock()
            .expect("store lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().expect("store lock").remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPending {
    entries: Arc<Mutex<Vec<PendingReminder>>>,
}

impl MemoryPending {
    pub fn with(entries: Vec<PendingReminder>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("pending lock")
            .iter()
            .map(|entry| entry.id.clone())
            .collect()
    }
}

impl ports::PendingReminders for MemoryPending {
    type PendingFut<'a>
        = std::future::Ready<Vec<PendingReminder>>
    where
        Self: 'a;
    type RemoveFut<'a>
        = std::future::Ready<()>
    where
        Self: 'a;

    fn pending<'a>(&'a self) -> Self::PendingFut<'a> {
        std::future::ready(self.entries.lock().expect("pending lock").clone())
    }

    fn remove<'a>(&'a self, id: &'a str) -> Self::RemoveFut<'a> {
        self.entries
            .lock()
            .expect("pending lock")
            .retain(|entry| entry.id != id);
        std::future::ready(())
    }
}

/// Client windows with scripted focus and open behaviour.
#[derive(Debug, Clone)]
pub struct TestClients {
    windows: Arc<Mutex<Vec<ClientWindow>>>,
    focused: Arc<Mutex<Vec<u64>>>,
    opened: Arc<Mutex<Vec<String>>>,
    can_open: bool,
}

impl TestClients {
    pub fn new(urls: &[&str]) -> Self {
        let windows = urls
            .iter()
            .enumerate()
            .map(|(index, url)| ClientWindow {
                id: index as u64 + 1,
                url: url.to_string(),
            })
            .collect();
        Self {
            windows: Arc::new(Mutex::new(windows)),
            focused: Arc::new(Mutex::new(Vec::new())),
            opened: Arc::new(Mutex::new(Vec::new())),
            can_open: true,
        }
    }

    pub fn without_open(mut self) -> Self {
        self.can_open = false;
        self
    }

    pub fn focused(&self) -> Vec<u64> {
        self.focused.lock().expect("focused lock").clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("opened lock").clone()
    }
}

impl ports::Clients for TestClients {
    fn match_all(&self) -> Vec<ClientWindow> {
        self.windows.lock().expect("windows lock").clone()
    }

    fn focus(&self, id: u64) -> bool {
        let known = self
            .windows
            .lock()
            .expect("windows lock")
            .iter()
            .any(|window| window.id == id);
        if known {
            self.focused.lock().expect("focused lock").push(id);
        }
        known
    }

    fn open_window(&self, url: &str) -> Option<ClientWindow> {
        if !self.can_open {
            return None;
        }
        self.opened.lock().expect("opened lock").push(url.to_string());
        let mut windows = self.windows.lock().expect("windows lock");
        let window = ClientWindow {
            id: windows.len() as u64 + 1,
            url: url.to_string(),
        };
        windows.push(window.clone());
        Some(window)
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind backend");
    let addr = listener.local_addr().expect("backend addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve backend");
    });
    format!("http://{addr}")
}
