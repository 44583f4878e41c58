//! User-facing notifications (toasts).
//!
//! A non-blocking side channel: producers push and move on, the UI drains
//! whatever accumulated since its last frame. The buffer is bounded; the
//! oldest entries are dropped first.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationLevel::Success => write!(f, "SUCCESS"),
            NotificationLevel::Info => write!(f, "INFO"),
            NotificationLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Where a notification originated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSource {
    Session,
    Query,
    Mutation,
}

impl fmt::Display for NotificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationSource::Session => write!(f, "SESSION"),
            NotificationSource::Query => write!(f, "QUERY"),
            NotificationSource::Mutation => write!(f, "MUTATION"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub timestamp: DateTime<Utc>,
    pub level: NotificationLevel,
    pub source: NotificationSource,
    pub message: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.level,
            self.source,
            self.message
        )
    }
}

/// Shared, bounded notification buffer. Clones share the same buffer.
#[derive(Debug, Clone)]
pub struct Notifier {
    entries: Arc<Mutex<VecDeque<Notification>>>,
    max_entries: usize,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Notifier {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            max_entries: max_entries.max(1),
        }
    }

    pub fn push(&self, level: NotificationLevel, source: NotificationSource, message: impl Into<String>) {
        let entry = Notification {
            timestamp: Utc::now(),
            level,
            source,
            message: message.into(),
        };

        match level {
            NotificationLevel::Error => tracing::warn!("{}", entry),
            _ => tracing::info!("{}", entry),
        }

        if let Ok(mut entries) = self.entries.lock() {
            entries.push_back(entry);
            while entries.len() > self.max_entries {
                entries.pop_front();
            }
        }
    }

    pub fn success(&self, source: NotificationSource, message: impl Into<String>) {
        self.push(NotificationLevel::Success, source, message);
    }

    pub fn info(&self, source: NotificationSource, message: impl Into<String>) {
        self.push(NotificationLevel::Info, source, message);
    }

    pub fn error(&self, source: NotificationSource, message: impl Into<String>) {
        self.push(NotificationLevel::Error, source, message);
    }

    /// Take every pending notification, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .map(|mut e| e.drain(..).collect())
            .unwrap_or_default()
    }

    /// Copy of the pending notifications without consuming them
    pub fn pending(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }
}
