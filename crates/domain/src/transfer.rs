//! Raw JSON text handling for the advanced editor and import/export.

use crate::document::json_type_name;
use crate::secrets::SecretReconciler;
use config_console_shared::ErrorEnvelope;
use serde_json::{Map, Value};

/// Parse raw JSON text that must hold an object.
///
/// Blank text is an empty object. Anything else that is not a JSON object is a
/// parse failure naming `source` (e.g. `advanced editor`, `import`).
pub fn parse_object_text(source: &str, text: &str) -> Result<Map<String, Value>, ErrorEnvelope> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Map::new());
    }

    let parsed: Value = serde_json::from_str(trimmed).map_err(|error| {
        ErrorEnvelope::parse_failed(format!("{source} JSON parse failed: {error}"))
            .with_metadata("source", source)
    })?;

    match parsed {
        Value::Object(map) => Ok(map),
        other => Err(ErrorEnvelope::parse_failed(format!(
            "{source} must be a JSON object, got {}",
            json_type_name(&other)
        ))
        .with_metadata("source", source)),
    }
}

/// Accept both a bare document and a `{"config": {...}}` envelope.
#[must_use]
pub fn unwrap_config_envelope(mut document: Map<String, Value>) -> Map<String, Value> {
    match document.remove("config") {
        Some(Value::Object(inner)) => inner,
        Some(other) => {
            document.insert("config".to_owned(), other);
            document
        },
        None => document,
    }
}

/// Drop withheld secrets from each section of an import document.
///
/// Returns the cleaned document and the `section.key` paths that were dropped.
#[must_use]
pub fn strip_withheld_secrets(document: Map<String, Value>) -> (Map<String, Value>, Vec<String>) {
    let mut withheld = Vec::new();
    let cleaned = document
        .into_iter()
        .map(|(section, value)| match value {
            Value::Object(body) => {
                let reconciled = SecretReconciler::reconcile(body);
                withheld.extend(
                    reconciled
                        .withheld
                        .into_iter()
                        .map(|key| format!("{section}.{key}")),
                );
                (section, Value::Object(reconciled.body))
            },
            other => (section, other),
        })
        .collect();
    (cleaned, withheld)
}

/// Text shown for an export payload.
///
/// A `yaml` string in the payload is shown as-is; otherwise the payload is
/// pretty-printed JSON.
#[must_use]
pub fn export_display_text(payload: &Value) -> String {
    if let Some(yaml) = payload.get("yaml").and_then(Value::as_str) {
        return yaml.to_owned();
    }
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
}
