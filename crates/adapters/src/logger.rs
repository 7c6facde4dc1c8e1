//! Structured logger adapter writing one line per event.

use crate::log_sink::LogSink;
use config_console_config::{LogConfig, LogFormatSetting, LogLevelSetting};
use config_console_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use config_console_shared::{REDACTED, is_secret_key};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Line encoding used by [`JsonLogger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// `level event: message key=value ...`
    Text,
}

/// Logger emitting one redacted line per event.
#[derive(Clone)]
pub struct JsonLogger {
    sink: Arc<dyn LogSink>,
    base_fields: LogFields,
    min_level: LogLevel,
    format: LineFormat,
}

impl JsonLogger {
    /// Create a JSON logger backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            base_fields: LogFields::new(),
            min_level: LogLevel::Info,
            format: LineFormat::Json,
        }
    }

    /// Create a logger configured from the console log settings.
    #[must_use]
    pub fn from_log_config(sink: Arc<dyn LogSink>, config: &LogConfig) -> Self {
        let format = match config.format {
            LogFormatSetting::Json => LineFormat::Json,
            LogFormatSetting::Text => LineFormat::Text,
        };
        Self::new(sink)
            .with_min_level(level_from_setting(config.level))
            .with_format(format)
    }

    /// Set base fields applied to every event.
    #[must_use]
    pub fn with_base_fields(mut self, fields: LogFields) -> Self {
        self.base_fields = fields;
        self
    }

    /// Set the minimum log level.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Set the line encoding.
    #[must_use]
    pub const fn with_format(mut self, format: LineFormat) -> Self {
        self.format = format;
        self
    }

    fn render_json(event: &LogEvent, fields: LogFields, error: Option<Value>) -> String {
        let mut payload = serde_json::Map::new();
        payload.insert("timestamp_ms".to_string(), Value::from(now_epoch_ms()));
        payload.insert(
            "level".to_string(),
            Value::String(event.level.as_str().to_string()),
        );
        payload.insert("event".to_string(), Value::String(event.event.to_string()));
        payload.insert(
            "message".to_string(),
            Value::String(event.message.to_string()),
        );
        if !fields.is_empty() {
            payload.insert("fields".to_string(), fields_to_json(fields));
        }
        if let Some(error) = error {
            payload.insert("error".to_string(), error);
        }

        serde_json::to_string(&Value::Object(payload)).map_or_else(
            |_| {
                "{\"timestamp_ms\":0,\"level\":\"error\",\"event\":\"logger.serialize_failed\",\"message\":\"log serialization failed\"}\n"
                    .to_string()
            },
            |mut encoded| {
                encoded.push('\n');
                encoded
            },
        )
    }

    fn render_text(event: &LogEvent, fields: &LogFields, error: Option<&Value>) -> String {
        let mut line = format!(
            "{:<5} {}: {}",
            event.level.as_str(),
            event.event,
            event.message
        );
        for (key, value) in fields {
            let _ = write!(line, " {key}={}", text_value(value));
        }
        if let Some(code) = error.and_then(error_code_text) {
            let _ = write!(line, " error_code={code}");
        }
        line.push('\n');
        line
    }
}

impl LoggerPort for JsonLogger {
    fn log(&self, event: LogEvent) {
        if event.level < self.min_level {
            return;
        }

        let mut fields = self.base_fields.clone();
        if let Some(extra) = event.fields.clone() {
            fields.extend(extra);
        }
        redact_fields(&mut fields);

        let mut error = event.error.clone();
        if let Some(ref mut value) = error {
            redact_value(value);
        }

        let line = match self.format {
            LineFormat::Json => Self::render_json(&event, fields, error),
            LineFormat::Text => Self::render_text(&event, &fields, error.as_ref()),
        };
        self.sink.write_line(&line);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            base_fields: merged,
            ..self.clone()
        })
    }
}

/// Map the config level setting onto the port level.
#[must_use]
pub const fn level_from_setting(level: LogLevelSetting) -> LogLevel {
    match level {
        LogLevelSetting::Error => LogLevel::Error,
        LogLevelSetting::Warn => LogLevel::Warn,
        LogLevelSetting::Info => LogLevel::Info,
        LogLevelSetting::Debug => LogLevel::Debug,
    }
}

fn text_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// `namespace:code` from a serialized error envelope.
fn error_code_text(error: &Value) -> Option<String> {
    let code = error.get("code")?;
    let namespace = code.get("namespace").and_then(Value::as_str)?;
    let name = code.get("code").and_then(Value::as_str)?;
    Some(format!("{namespace}:{name}"))
}

fn fields_to_json(fields: LogFields) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key.into_string(), value))
            .collect(),
    )
}

fn redact_fields(fields: &mut LogFields) {
    for (key, value) in fields.iter_mut() {
        if is_secret_key(key) {
            *value = Value::String(REDACTED.to_string());
        } else {
            redact_value(value);
        }
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map.iter_mut() {
                if is_secret_key(key) {
                    *nested = Value::String(REDACTED.to_string());
                } else {
                    redact_value(nested);
                }
            }
        },
        Value::Array(items) => {
            for item in items {
                redact_value(item);
            }
        },
        _ => {},
    }
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}
