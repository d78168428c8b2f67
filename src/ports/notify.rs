use crate::types::notification::{Notification, Permission};

/// Display sink for system notifications.
pub trait Notifier: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;

    fn display(&self, notification: &Notification) -> Result<(), Self::Error>;
}

/// The platform's permission state and consent prompt.
pub trait PermissionPrompt: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = Permission> + Send + 'a
    where
        Self: 'a;

    fn current(&self) -> Permission;
    fn request<'a>(&'a self) -> Self::Fut<'a>;
}
