pub mod event;
pub mod notification;
pub mod preferences;
pub mod reminder;
pub mod session;
