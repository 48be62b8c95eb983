//! Synchronous notification delivery from accounts to their subscribers.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// Receives notification events; called in subscription order on the mutating thread.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

impl<F> NotificationSink for F
where
    F: Fn(&str, Severity) + Send + Sync,
{
    fn notify(&self, message: &str, severity: Severity) {
        self(message, severity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

/// Sink that keeps every event in memory, for hosts that poll and for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Returns and clears the recorded events.
    pub fn drain(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, message: &str, severity: Severity) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(Notification {
                message: message.to_string(),
                severity,
            });
        }
    }
}

/// Ordered subscriber set keyed by subscriber id.
#[derive(Clone, Default)]
pub struct Subscribers {
    entries: Vec<(String, Arc<dyn NotificationSink>)>,
}

impl Subscribers {
    /// Adds the subscriber unless one with the same id is already present.
    pub fn subscribe(&mut self, id: impl Into<String>, sink: Arc<dyn NotificationSink>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.entries.push((id, sink));
        true
    }

    pub fn unsubscribe(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| existing != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn broadcast(&self, message: &str, severity: Severity) {
        for (_, sink) in &self.entries {
            sink.notify(message, severity);
        }
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}
