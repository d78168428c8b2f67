//! Background worker: receives pushes, notification clicks, sync requests and
//! page messages, one at a time, for as long as the process lives.

mod payload;

pub use payload::push_notification;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::notifications::NotificationCenter;
use crate::ports::{self, ClientWindow};
use crate::reminders::{ReminderRegistry, ReminderScheduler};
use crate::types::reminder::Reminder;

pub const REMINDER_SYNC_TAG: &str = "eventify-reminder-sync";

const MAILBOX_CAPACITY: usize = 64;

/// Messages a page posts to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "SCHEDULE_REMINDER")]
    ScheduleReminder { reminder: Reminder },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Push(Option<Vec<u8>>),
    NotificationClick { tag: String, action: Option<String> },
    NotificationClose { tag: String },
    Sync { tag: String },
    Message(WorkerMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WorkerOutcome {
    Displayed { tag: String },
    Ignored,
    Focused(ClientWindow),
    Opened(ClientWindow),
    Closed,
    Synced { delivered: usize },
    Scheduled { armed: bool },
}

#[derive(Error, Debug)]
#[error("worker is not running")]
pub struct WorkerGone;

pub struct ServiceWorker<T, N, P, C, R> {
    center: NotificationCenter<N, P>,
    scheduler: ReminderScheduler<T, N, P>,
    clients: C,
    pending: R,
    scheduled: ReminderRegistry,
}

impl<T, N, P, C, R> ServiceWorker<T, N, P, C, R>
where
    T: ports::TimeProvider,
    N: ports::Notifier,
    P: ports::PermissionPrompt,
    C: ports::Clients,
    R: ports::PendingReminders,
{
    pub fn new(
        time: T,
        center: NotificationCenter<N, P>,
        clients: C,
        pending: R,
        scheduled: ReminderRegistry,
    ) -> Self {
        let scheduler = ReminderScheduler::new(time, center.clone());
        Self {
            center,
            scheduler,
            clients,
            pending,
            scheduled,
        }
    }

    pub async fn handle(&self, event: WorkerEvent) -> WorkerOutcome {
        match event {
            WorkerEvent::Push(data) => self.on_push(data.as_deref()),
            WorkerEvent::NotificationClick { tag, action } => {
                self.on_click(&tag, action.as_deref())
            }
            WorkerEvent::NotificationClose { tag } => {
                info!(tag, "notification closed");
                self.center.close(&tag);
                WorkerOutcome::Closed
            }
            WorkerEvent::Sync { tag } => self.on_sync(&tag).await,
            WorkerEvent::Message(message) => self.on_message(message),
        }
    }

    fn on_push(&self, data: Option<&[u8]>) -> WorkerOutcome {
        let Some(notification) = push_notification(data) else {
            debug!("empty push ignored");
            return WorkerOutcome::Ignored;
        };
        let tag = notification.tag.clone();
        if self.center.show(notification) {
            WorkerOutcome::Displayed { tag }
        } else {
            WorkerOutcome::Ignored
        }
    }

    fn on_click(&self, tag: &str, action: Option<&str>) -> WorkerOutcome {
        let closed = self.center.close(tag);
        match action {
            Some("view") => {
                let url = closed
                    .and_then(|notification| notification.data.url)
                    .unwrap_or_else(|| "/".to_string());
                let existing = self
                    .clients
                    .match_all()
                    .into_iter()
                    .find(|client| client.url == url);
                if let Some(client) = existing
                    && self.clients.focus(client.id)
                {
                    return WorkerOutcome::Focused(client);
                }
                self.open(&url)
            }
            Some("dismiss") => {
                info!(tag, "notification dismissed");
                WorkerOutcome::Closed
            }
            _ => {
                if let Some(client) = self.clients.match_all().into_iter().next()
                    && self.clients.focus(client.id)
                {
                    return WorkerOutcome::Focused(client);
                }
                self.open("/")
            }
        }
    }

    fn open(&self, url: &str) -> WorkerOutcome {
        match self.clients.open_window(url) {
            Some(client) => WorkerOutcome::Opened(client),
            None => {
                warn!(url, "cannot open a window");
                WorkerOutcome::Ignored
            }
        }
    }

    async fn on_sync(&self, tag: &str) -> WorkerOutcome {
        if tag != REMINDER_SYNC_TAG {
            debug!(tag, "unknown sync tag ignored");
            return WorkerOutcome::Ignored;
        }
        let now = self.scheduler.now();
        let mut delivered = 0;
        for pending in self.pending.pending().await {
            if !pending.is_due(now) {
                continue;
            }
            if self.center.show(pending.reminder.notification()) {
                delivered += 1;
            }
            self.pending.remove(&pending.id).await;
        }
        info!(delivered, "reminder sync finished");
        WorkerOutcome::Synced { delivered }
    }

    fn on_message(&self, message: WorkerMessage) -> WorkerOutcome {
        match message {
            WorkerMessage::ScheduleReminder { reminder } => {
                let Some(handle) = self.scheduler.schedule(reminder) else {
                    return WorkerOutcome::Scheduled { armed: false };
                };
                let mut scheduled = self.scheduled.lock().expect("scheduled reminders lock");
                scheduled.retain(|handle| !handle.is_finished());
                scheduled.push(handle);
                WorkerOutcome::Scheduled { armed: true }
            }
            WorkerMessage::Unknown => {
                debug!("unknown worker message ignored");
                WorkerOutcome::Ignored
            }
        }
    }

    /// Starts the worker on its own task. Events are handled in arrival order.
    pub fn spawn(self) -> WorkerHandle {
        let (sender, mut receiver) = mpsc::channel::<Envelope>(MAILBOX_CAPACITY);
        tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                let outcome = self.handle(envelope.event).await;
                if let Some(reply) = envelope.reply {
                    let _ = reply.send(outcome);
                }
            }
            debug!("worker mailbox closed");
        });
        WorkerHandle { sender }
    }
}

struct Envelope {
    event: WorkerEvent,
    reply: Option<oneshot::Sender<WorkerOutcome>>,
}

/// Page-side handle to a running worker.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    sender: mpsc::Sender<Envelope>,
}

impl WorkerHandle {
    /// Queues an event without waiting for it to be handled.
    pub async fn post(&self, event: WorkerEvent) -> Result<(), WorkerGone> {
        self.sender
            .send(Envelope { event, reply: None })
            .await
            .map_err(|_| WorkerGone)
    }

    /// Queues an event and waits for its outcome.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<WorkerOutcome, WorkerGone> {
        let (reply, outcome) = oneshot::channel();
        self.sender
            .send(Envelope {
                event,
                reply: Some(reply),
            })
            .await
            .map_err(|_| WorkerGone)?;
        outcome.await.map_err(|_| WorkerGone)
    }
}
