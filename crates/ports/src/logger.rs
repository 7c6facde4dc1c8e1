//! Structured logging boundary contract.

use config_console_shared::ErrorEnvelope;
use std::collections::BTreeMap;

/// Log level, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warn.
    Warn,
    /// Error.
    Error,
}

impl LogLevel {
    /// Parse a lowercase level name (`debug`, `info`, `warn`, `error`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Lowercase level name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Additional event fields.
pub type LogFields = BTreeMap<Box<str>, serde_json::Value>;

/// Build [`LogFields`] from key/value pairs.
#[must_use]
pub fn log_fields<const N: usize>(pairs: [(&str, serde_json::Value); N]) -> LogFields {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_owned().into_boxed_str(), value))
        .collect()
}

/// Structured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Stable event name, e.g. `console.save.completed`.
    pub event: Box<str>,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message (safe, redacted).
    pub message: Box<str>,
    /// Optional structured fields.
    pub fields: Option<LogFields>,
    /// Optional error payload.
    pub error: Option<serde_json::Value>,
}

impl LogEvent {
    /// Build an event without fields or error payload.
    #[must_use]
    pub fn new(event: &str, level: LogLevel, message: &str) -> Self {
        Self {
            event: event.to_owned().into_boxed_str(),
            level,
            message: message.to_owned().into_boxed_str(),
            fields: None,
            error: None,
        }
    }

    /// Attach structured fields.
    #[must_use]
    pub fn with_fields(mut self, fields: Option<LogFields>) -> Self {
        self.fields = fields;
        self
    }

    /// Attach an error envelope as the event's error payload.
    #[must_use]
    pub fn with_error(mut self, error: &ErrorEnvelope) -> Self {
        self.error = serde_json::to_value(error).ok();
        self
    }
}

/// Boundary contract for structured logging.
pub trait LoggerPort: Send + Sync {
    /// Emit a structured event.
    fn log(&self, event: LogEvent);

    /// Create a child logger with base fields applied to every event.
    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort>;

    /// Convenience: debug event.
    fn debug(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent::new(event, LogLevel::Debug, message).with_fields(fields));
    }

    /// Convenience: info event.
    fn info(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent::new(event, LogLevel::Info, message).with_fields(fields));
    }

    /// Convenience: warn event.
    fn warn(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent::new(event, LogLevel::Warn, message).with_fields(fields));
    }

    /// Convenience: error event.
    fn error(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent::new(event, LogLevel::Error, message).with_fields(fields));
    }

    /// Convenience: failure event carrying the error envelope.
    fn failure(&self, event: &str, error: &ErrorEnvelope, fields: Option<LogFields>) {
        let level = if matches!(error.kind, config_console_shared::ErrorKind::Expected) {
            LogLevel::Warn
        } else {
            LogLevel::Error
        };
        self.log(
            LogEvent::new(event, level, &error.message)
                .with_fields(fields)
                .with_error(error),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_console_shared::ErrorCode;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<LogEvent>>,
    }

    impl LoggerPort for Recording {
        fn log(&self, event: LogEvent) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
        }

        fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
            Box::new(Self::default())
        }
    }

    #[test]
    fn levels_parse_and_order() {
        assert_eq!(LogLevel::parse(" WARN "), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("trace"), None);
        assert!(LogLevel::Debug < LogLevel::Error);
        assert_eq!(LogLevel::Info.as_str(), "info");
    }

    #[test]
    fn failure_level_follows_error_kind() {
        let logger = Recording::default();
        logger.failure(
            "console.save.failed",
            &ErrorEnvelope::server_rejected("bad port"),
            None,
        );
        logger.failure(
            "console.load.failed",
            &ErrorEnvelope::invariant(ErrorCode::internal(), "boom"),
            Some(log_fields([("section", serde_json::json!("llm"))])),
        );

        let events = logger.events.lock().map(|events| events.clone()).unwrap_or_default();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].level, LogLevel::Warn);
        assert_eq!(&*events[0].message, "bad port");
        assert!(events[0].error.is_some());
        assert_eq!(events[1].level, LogLevel::Error);
        assert!(events[1].fields.as_ref().is_some_and(|fields| fields.contains_key("section")));
    }
}
