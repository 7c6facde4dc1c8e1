//! Config documents, section names, and outgoing section patches.

use config_console_shared::{ErrorCode, ErrorEnvelope, REDACTED, is_secret_field_key};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Validation failures for documents and section names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Section name is empty after trimming.
    EmptySectionName,
    /// A config document must be a JSON object keyed by section.
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },
}

impl DocumentError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptySectionName => ErrorCode::new("domain", "invalid_section_name"),
            Self::NotAnObject { .. } => ErrorCode::new("domain", "invalid_document"),
        }
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySectionName => formatter.write_str("section name must be non-empty"),
            Self::NotAnObject { found } => {
                write!(formatter, "config document must be a JSON object, got {found}")
            },
        }
    }
}

impl std::error::Error for DocumentError {}

impl From<DocumentError> for ErrorEnvelope {
    fn from(error: DocumentError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            DocumentError::EmptySectionName => envelope,
            DocumentError::NotAnObject { found } => envelope.with_metadata("found", found),
        }
    }
}

/// Name of a top-level config section (e.g. `llm`, `gateway`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionName(Box<str>);

impl SectionName {
    /// Parse a section name from user input.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, DocumentError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DocumentError::EmptySectionName);
        }
        Ok(Self(trimmed.to_owned().into_boxed_str()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SectionName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A config document keyed by section name.
///
/// The console only ever caches the masked view of this document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    sections: Map<String, Value>,
}

impl ConfigDocument {
    /// Wrap a JSON value, rejecting anything that is not an object.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(sections) => Ok(Self { sections }),
            other => Err(DocumentError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }

    /// Value stored for a section, if any.
    #[must_use]
    pub fn section(&self, name: &SectionName) -> Option<&Value> {
        self.sections.get(name.as_str())
    }

    /// Value stored for one field of a section, if any.
    #[must_use]
    pub fn field(&self, section: &SectionName, key: &str) -> Option<&Value> {
        self.section(section)?.get(key)
    }

    /// Section names in document order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Number of sections in the document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns true when the document holds no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Borrow the underlying section map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.sections
    }

    /// Convert back into a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.sections)
    }
}

/// A partial update for exactly one section.
///
/// `Debug` redacts secret field values so patches can be logged.
#[derive(Clone, PartialEq)]
pub struct SectionPatch {
    section: SectionName,
    body: Map<String, Value>,
}

impl SectionPatch {
    /// Build a patch from a section name and its changed fields.
    #[must_use]
    pub const fn new(section: SectionName, body: Map<String, Value>) -> Self {
        Self { section, body }
    }

    /// Target section.
    #[must_use]
    pub const fn section(&self) -> &SectionName {
        &self.section
    }

    /// Changed fields.
    #[must_use]
    pub const fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Returns true when the patch carries a value for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.body.contains_key(key)
    }

    /// Returns true when no field is changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Consume the patch into its JSON body.
    #[must_use]
    pub fn into_body(self) -> Value {
        Value::Object(self.body)
    }
}

impl fmt::Debug for SectionPatch {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = formatter.debug_map();
        for (key, value) in &self.body {
            if is_secret_field_key(key) {
                map.entry(key, &REDACTED);
            } else {
                map.entry(key, value);
            }
        }
        map.finish()?;
        write!(formatter, " @ {}", self.section)
    }
}

/// Human-readable JSON type name used in error messages.
#[must_use]
pub const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn section_name_is_trimmed_and_non_empty() {
        assert!(matches!(
            SectionName::parse("   "),
            Err(DocumentError::EmptySectionName)
        ));
        let name = SectionName::parse(" llm ");
        assert!(matches!(name, Ok(ref name) if name.as_str() == "llm"));
    }

    #[test]
    fn document_rejects_non_objects() {
        let error = ConfigDocument::from_value(json!([1, 2])).err();
        assert_eq!(error, Some(DocumentError::NotAnObject { found: "array" }));

        let envelope = ErrorEnvelope::from(DocumentError::NotAnObject { found: "array" });
        assert_eq!(envelope.metadata_value("found"), Some("array"));
    }

    #[test]
    fn document_keeps_section_order_and_field_access() {
        let document = ConfigDocument::from_value(json!({
            "llm": {"model": "m", "api_key": "****"},
            "gateway": {"port": 8788},
        }));
        assert!(document.is_ok());
        let Ok(document) = document else { return };

        let names: Vec<&str> = document.section_names().collect();
        assert_eq!(names, vec!["llm", "gateway"]);

        let Ok(gateway) = SectionName::parse("gateway") else {
            return;
        };
        assert_eq!(document.field(&gateway, "port"), Some(&json!(8788)));
        assert_eq!(document.field(&gateway, "missing"), None);
    }

    #[test]
    fn patch_debug_redacts_secret_fields() {
        let Ok(section) = SectionName::parse("llm") else {
            return;
        };
        let mut body = Map::new();
        body.insert("api_key".to_owned(), json!("sk-live-123"));
        body.insert("model".to_owned(), json!("m"));
        let patch = SectionPatch::new(section, body);

        let rendered = format!("{patch:?}");
        assert!(!rendered.contains("sk-live-123"));
        assert!(rendered.contains(REDACTED));
        assert!(rendered.contains("\"m\""));
        assert!(rendered.ends_with("@ llm"));
    }
}
