use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::ports::{Notifier, PermissionPrompt};
use crate::types::notification::{Notification, Permission};

/// Notifications currently on screen, shared with debug views.
pub type ActiveNotifications = Arc<Mutex<Vec<Notification>>>;

/// The platform side of notifications: permission state plus the set of
/// displayed notifications. Showing a notification whose tag is already on
/// screen replaces the old one.
#[derive(Debug, Clone)]
pub struct NotificationCenter<N, P> {
    notifier: N,
    permissions: P,
    active: ActiveNotifications,
}

impl<N, P> NotificationCenter<N, P>
where
    N: Notifier,
    P: PermissionPrompt,
{
    pub fn new(notifier: N, permissions: P) -> Self {
        Self {
            notifier,
            permissions,
            active: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn permission(&self) -> Permission {
        self.permissions.current()
    }

    pub async fn request_permission(&self) -> Permission {
        self.permissions.request().await
    }

    /// Returns whether the notification was displayed. Without a granted
    /// permission this is a silent no-op.
    pub fn show(&self, notification: Notification) -> bool {
        let permission = self.permission();
        if !permission.is_granted() {
            debug!(%permission, tag = %notification.tag, "notification suppressed");
            return false;
        }

        {
            let mut active = self.active.lock().expect("active notifications lock");
            active.retain(|existing| existing.tag != notification.tag);
            active.push(notification.clone());
        }

        if let Err(err) = self.notifier.display(&notification) {
            warn!("notification display error: {err} (tag {})", notification.tag);
        }
        true
    }

    pub fn close(&self, tag: &str) -> Option<Notification> {
        let mut active = self.active.lock().expect("active notifications lock");
        let index = active.iter().position(|existing| existing.tag == tag)?;
        Some(active.remove(index))
    }

    pub fn active(&self) -> Vec<Notification> {
        self.active.lock().expect("active notifications lock").clone()
    }

    pub fn active_handle(&self) -> ActiveNotifications {
        Arc::clone(&self.active)
    }
}
