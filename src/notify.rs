use std::fmt;
use std::io::Write;
use std::time::{Duration, Instant};

pub const TRIP_ADDED: &str = "Trip added successfully!";
pub const TRIP_EDITED: &str = "Trip edited successfully!";
pub const TRIP_DELETED: &str = "Successfully deleted trip!";

pub fn trip_add_failed(reason: impl fmt::Display) -> String {
    format!("Failed to add trip: {reason}")
}

pub fn trip_edit_failed(reason: impl fmt::Display) -> String {
    format!("Failed to edit trip!: {reason}")
}

pub fn trip_delete_failed(reason: impl fmt::Display) -> String {
    format!("Failed to delete trip: {reason}")
}

pub fn overstay_message(days: i64) -> String {
    format!("You have exceeded the number of days by {days}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Success => "✓",
            Severity::Error => "✗",
            Severity::Info => "ℹ",
            Severity::Warning => "⚠",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Sink for transient user messages.
pub trait Notifier {
    fn notify(&mut self, message: &str, severity: Severity);

    fn success(&mut self, message: &str) {
        self.notify(message, Severity::Success);
    }

    fn error(&mut self, message: &str) {
        self.notify(message, Severity::Error);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub severity: Severity,
    pub expires_at: Instant,
}

/// On-screen notifications, each dismissed after a fixed time to live.
#[derive(Debug)]
pub struct ToastQueue {
    ttl: Duration,
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        ToastQueue {
            ttl,
            toasts: Vec::new(),
        }
    }

    pub fn push_at(&mut self, message: &str, severity: Severity, now: Instant) {
        self.toasts.push(Toast {
            message: message.to_string(),
            severity,
            expires_at: now + self.ttl,
        });
    }

    /// Drops every toast whose time is up.
    pub fn prune(&mut self, now: Instant) {
        self.toasts.retain(|t| t.expires_at > now);
    }

    pub fn active(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

impl Notifier for ToastQueue {
    fn notify(&mut self, message: &str, severity: Severity) {
        self.push_at(message, severity, Instant::now());
    }
}

/// Writes one line per notification, used by the non-interactive commands.
pub struct ConsoleNotifier<W: Write> {
    out: W,
}

impl<W: Write> ConsoleNotifier<W> {
    pub fn new(out: W) -> Self {
        ConsoleNotifier { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for ConsoleNotifier<W> {
    fn notify(&mut self, message: &str, severity: Severity) {
        let _ = writeln!(self.out, "{} {}", severity.icon(), message);
    }
}
