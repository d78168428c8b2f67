//! Single-shot event reminders, shared by the page-side helper and the worker.
//!
//! Reminders live only as spawned timer tasks. Nothing is persisted and
//! nothing is deduplicated: scheduling the same event twice arms two timers.

mod scheduler;

use std::sync::{Arc, Mutex};

pub use scheduler::{ReminderScheduler, ScheduledReminderHandle};

/// Reminders armed so far, shared with debug views.
pub type ReminderRegistry = Arc<Mutex<Vec<ScheduledReminderHandle>>>;

pub fn new_registry() -> ReminderRegistry {
    Arc::new(Mutex::new(Vec::new()))
}
