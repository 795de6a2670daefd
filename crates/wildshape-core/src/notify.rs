//! User-visible notifications (host toasts).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

/// A single toast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

/// Where notifications go (host toast API, terminal, test buffer)
pub trait Notifier {
    fn notify(&mut self, message: &str, severity: Severity);
}

/// Keeps every notification in order; handy for tests and headless hosts
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub seen: Vec<Notification>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.seen.last()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, message: &str, severity: Severity) {
        self.seen.push(Notification {
            message: message.to_string(),
            severity,
        });
    }
}
