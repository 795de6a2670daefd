//! Terminal notifier: the CLI's stand-in for host toasts.

use std::io::Write;

use wildshape_core::{Notifier, Severity};

/// Writes each notification to stderr and mirrors it into the log
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    errors: usize,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of error-level notifications shown so far
    pub fn errors(&self) -> usize {
        self.errors
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => tracing::info!(target: "wildshape::notify", "{}", message),
            Severity::Warning => tracing::warn!(target: "wildshape::notify", "{}", message),
            Severity::Error => {
                self.errors += 1;
                tracing::error!(target: "wildshape::notify", "{}", message);
            }
        }
        let _ = writeln!(std::io::stderr(), "[{}] {}", severity.label(), message);
    }
}
