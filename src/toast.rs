// Transient success/error notifications

use std::time::{Duration, Instant};

/// How long a toast stays visible
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub posted_at: Instant,
}

/// Single-slot notification area; a new toast replaces the old one
#[derive(Debug, Clone)]
pub struct Notifier {
    current: Option<Toast>,
    ttl: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self { current: None, ttl }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.post(ToastKind::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.post(ToastKind::Error, message.into());
    }

    fn post(&mut self, kind: ToastKind, message: String) {
        self.current = Some(Toast {
            message,
            kind,
            posted_at: Instant::now(),
        });
    }

    /// The toast still visible at `now`, if any
    pub fn visible_at(&self, now: Instant) -> Option<&Toast> {
        self.current
            .as_ref()
            .filter(|toast| now.saturating_duration_since(toast.posted_at) < self.ttl)
    }

    /// Most recent toast regardless of age
    pub fn latest(&self) -> Option<&Toast> {
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
