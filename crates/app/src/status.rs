//! Presentation state for operation outcomes: one current status plus a
//! queue of toasts that expire after a fixed time.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default toast lifetime.
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_millis(2_800);

/// Severity of a status or toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusLevel {
    /// Nothing happened yet.
    #[default]
    Idle,
    /// An operation is in flight.
    Loading,
    /// Last operation succeeded.
    Ok,
    /// Succeeded with a caveat, or a check came back negative.
    Warning,
    /// Last operation failed.
    Error,
}

impl StatusLevel {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Current status with its display text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    /// Severity.
    pub level: StatusLevel,
    /// Display text.
    pub text: String,
}

/// A transient message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Severity.
    pub level: StatusLevel,
    /// Display text.
    pub text: String,
    /// Instant after which the toast is dismissed.
    pub expires_at: Instant,
}

/// Holds the current status and pending toasts.
#[derive(Debug, Clone)]
pub struct StatusNotifier {
    current: Status,
    toasts: VecDeque<Toast>,
    ttl: Duration,
}

impl Default for StatusNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}

impl StatusNotifier {
    /// Notifier whose toasts live for `ttl`.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            current: Status {
                level: StatusLevel::Idle,
                text: String::new(),
            },
            toasts: VecDeque::new(),
            ttl,
        }
    }

    /// Toast lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current status.
    #[must_use]
    pub const fn current(&self) -> &Status {
        &self.current
    }

    /// Replace the current status.
    pub fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.current = Status {
            level,
            text: text.into(),
        };
    }

    /// Queue a toast that expires `ttl` after `now`.
    pub fn toast(&mut self, level: StatusLevel, text: impl Into<String>, now: Instant) {
        self.toasts.push_back(Toast {
            level,
            text: text.into(),
            expires_at: now + self.ttl,
        });
    }

    /// Drop expired toasts and return the ones still showing, oldest first.
    pub fn active_toasts(&mut self, now: Instant) -> Vec<Toast> {
        self.toasts.retain(|toast| toast.expires_at > now);
        self.toasts.iter().cloned().collect()
    }

    /// Remove and return every queued toast, expired or not.
    pub fn drain_toasts(&mut self) -> Vec<Toast> {
        self.toasts.drain(..).collect()
    }

    /// Back to idle with no toasts.
    pub fn clear(&mut self) {
        self.current = Status::default();
        self.toasts.clear();
    }
}
