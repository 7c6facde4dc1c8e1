//! Field description and collection.
//!
//! [`describe_field`] turns a resolved schema node and the current masked value
//! into a [`FieldDescriptor`] with an initial [`WidgetValue`]. [`collect_field`]
//! is its inverse: it reads a widget back into a typed JSON value.

use crate::document::{SectionName, json_type_name};
use crate::metadata::field_metadata;
use crate::resolver::ResolutionFailure;
use crate::schema::{SchemaNode, SchemaType};
use config_console_shared::{
    ErrorCode, ErrorEnvelope, MASK_SENTINEL, is_secret_field_key, is_withheld_secret_text,
};
use serde_json::{Number, Value};
use std::fmt;

/// Placeholder for secret inputs with no table entry.
pub const SECRET_PLACEHOLDER: &str = "leave blank to keep current value";
/// Placeholder for `format: uri` strings with no table entry.
pub const URI_PLACEHOLDER: &str = "https://...";

/// How a field is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderHint {
    /// On/off toggle.
    Boolean,
    /// Numeric input; blank means null.
    Numeric,
    /// Raw JSON text holding an array.
    ArrayJson,
    /// Raw JSON text holding an object.
    ObjectJson,
    /// Maskable text input that never shows the stored value.
    SecretText,
    /// Plain text input.
    PlainText,
}

impl RenderHint {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Numeric => "numeric",
            Self::ArrayJson => "array-json",
            Self::ObjectJson => "object-json",
            Self::SecretText => "secret-text",
            Self::PlainText => "plain-text",
        }
    }
}

impl fmt::Display for RenderHint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Editable state of one widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetValue {
    /// Toggle state.
    Toggle(bool),
    /// Text content.
    Text(String),
}

impl WidgetValue {
    /// Convenience constructor for text widgets.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

/// `section.key` path naming one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    /// Section the field belongs to.
    pub section: SectionName,
    /// Field key inside the section.
    pub key: String,
}

impl FieldPath {
    /// Build a path.
    pub fn new(section: SectionName, key: impl Into<String>) -> Self {
        Self {
            section,
            key: key.into(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}", self.section, self.key)
    }
}

/// Per-field failure while collecting a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// Array/object text is not valid JSON.
    InvalidJson {
        /// Offending field.
        field: FieldPath,
        /// Parser message.
        reason: String,
    },
    /// Array/object text parsed to the wrong JSON type.
    UnexpectedJsonType {
        /// Offending field.
        field: FieldPath,
        /// Type the schema declares.
        expected: SchemaType,
        /// Type that was parsed.
        found: &'static str,
    },
    /// Numeric text does not parse to the declared numeric type.
    InvalidNumber {
        /// Offending field.
        field: FieldPath,
        /// Type the schema declares.
        expected: SchemaType,
        /// Raw input.
        input: String,
    },
    /// Boolean text is not a recognised truth value.
    InvalidBoolean {
        /// Offending field.
        field: FieldPath,
        /// Raw input.
        input: String,
    },
    /// A toggle was supplied for a text field.
    WidgetMismatch {
        /// Offending field.
        field: FieldPath,
        /// Hint of the field.
        hint: RenderHint,
    },
}

impl CollectionError {
    /// Field the error concerns.
    #[must_use]
    pub const fn field(&self) -> &FieldPath {
        match self {
            Self::InvalidJson { field, .. }
            | Self::UnexpectedJsonType { field, .. }
            | Self::InvalidNumber { field, .. }
            | Self::InvalidBoolean { field, .. }
            | Self::WidgetMismatch { field, .. } => field,
        }
    }

    fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidJson { .. } | Self::UnexpectedJsonType { .. } => {
                ErrorCode::new("form", "invalid_json")
            },
            Self::InvalidNumber { .. } => ErrorCode::new("form", "invalid_number"),
            Self::InvalidBoolean { .. } => ErrorCode::new("form", "invalid_boolean"),
            Self::WidgetMismatch { .. } => ErrorCode::new("form", "widget_mismatch"),
        }
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson { field, reason } => {
                write!(formatter, "field {field} JSON parse failed: {reason}")
            },
            Self::UnexpectedJsonType {
                field,
                expected,
                found,
            } => write!(formatter, "field {field} expects a JSON {expected}, got {found}"),
            Self::InvalidNumber {
                field,
                expected,
                input,
            } => write!(formatter, "field {field} expects {expected}, got `{input}`"),
            Self::InvalidBoolean { field, input } => {
                write!(formatter, "field {field} expects true or false, got `{input}`")
            },
            Self::WidgetMismatch { field, hint } => {
                write!(formatter, "field {field} is {hint} and takes text input")
            },
        }
    }
}

impl std::error::Error for CollectionError {}

impl From<CollectionError> for ErrorEnvelope {
    fn from(error: CollectionError) -> Self {
        Self::expected(error.error_code(), error.to_string())
            .with_metadata("field", error.field().to_string())
    }
}

/// Outcome of collecting one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Collected {
    /// Submit this value.
    Set(Value),
    /// Leave the stored value untouched; the key is omitted from the patch.
    Keep,
}

/// Everything needed to render and collect one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// `section.key` of the field.
    pub path: FieldPath,
    /// Resolved schema, or `None` when resolution failed.
    pub schema: Option<SchemaNode>,
    /// Why resolution failed, for degraded fields.
    pub resolution_error: Option<ResolutionFailure>,
    /// Current masked value (`Null` when absent).
    pub value: Value,
    /// Secret fields never display or resubmit their stored value.
    pub is_secret: bool,
    /// Widget kind.
    pub hint: RenderHint,
    /// Display label.
    pub label: String,
    /// Help text.
    pub help: Option<String>,
    /// Input placeholder.
    pub placeholder: Option<String>,
    /// Initial widget state.
    pub widget: WidgetValue,
}

impl FieldDescriptor {
    /// Returns true when the field could not be resolved and cannot be edited.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.schema.is_none()
    }

    /// Declared type of the resolved schema.
    #[must_use]
    pub fn schema_type(&self) -> Option<SchemaType> {
        self.schema.as_ref().and_then(SchemaNode::schema_type)
    }

    /// Collect a widget back into a value for this field.
    pub fn collect(&self, widget: &WidgetValue) -> Result<Collected, CollectionError> {
        match &self.schema {
            Some(schema) => collect_field(&self.path, schema, widget),
            None => Ok(Collected::Keep),
        }
    }
}

/// Returns true when a field is secret by key name or `writeOnly`.
#[must_use]
pub fn is_secret_field(key: &str, schema: Option<&SchemaNode>) -> bool {
    is_secret_field_key(key) || schema.is_some_and(SchemaNode::is_write_only)
}

/// Widget kind for a resolved node.
#[must_use]
pub fn render_hint(schema_type: Option<SchemaType>, is_secret: bool) -> RenderHint {
    match schema_type {
        Some(SchemaType::Boolean) => RenderHint::Boolean,
        Some(SchemaType::Integer | SchemaType::Number) => RenderHint::Numeric,
        Some(SchemaType::Array) => RenderHint::ArrayJson,
        Some(SchemaType::Object) => RenderHint::ObjectJson,
        Some(SchemaType::String | SchemaType::Null) | None => {
            if is_secret {
                RenderHint::SecretText
            } else {
                RenderHint::PlainText
            }
        },
    }
}

/// Describe one field from its resolved schema and current masked value.
#[must_use]
pub fn describe_field(
    section: &SectionName,
    key: &str,
    schema: SchemaNode,
    current: Option<&Value>,
) -> FieldDescriptor {
    let value = current.cloned().unwrap_or(Value::Null);
    let is_secret = is_secret_field(key, Some(&schema));
    let hint = render_hint(schema.schema_type(), is_secret);
    let widget = initial_widget(hint, &value);
    let metadata = field_metadata(section.as_str(), key);

    let label = metadata.map_or_else(|| key.to_owned(), |entry| entry.label.to_owned());
    let help = metadata
        .map(|entry| entry.hint)
        .filter(|hint| !hint.is_empty())
        .or_else(|| schema.description())
        .map(ToOwned::to_owned);
    let placeholder = metadata
        .map(|entry| entry.placeholder)
        .filter(|placeholder| !placeholder.is_empty())
        .or_else(|| is_secret.then_some(SECRET_PLACEHOLDER))
        .or_else(|| (schema.format() == Some("uri")).then_some(URI_PLACEHOLDER))
        .map(ToOwned::to_owned);

    FieldDescriptor {
        path: FieldPath::new(section.clone(), key),
        schema: Some(schema),
        resolution_error: None,
        value,
        is_secret,
        hint,
        label,
        help,
        placeholder,
        widget,
    }
}

/// Describe a field whose schema could not be resolved.
///
/// The field renders empty and is skipped on collect.
#[must_use]
pub fn describe_degraded_field(
    section: &SectionName,
    key: &str,
    failure: ResolutionFailure,
    current: Option<&Value>,
) -> FieldDescriptor {
    let is_secret = is_secret_field_key(key);
    let metadata = field_metadata(section.as_str(), key);
    FieldDescriptor {
        path: FieldPath::new(section.clone(), key),
        schema: None,
        help: Some(failure.to_string()),
        resolution_error: Some(failure),
        value: current.cloned().unwrap_or(Value::Null),
        is_secret,
        hint: if is_secret {
            RenderHint::SecretText
        } else {
            RenderHint::PlainText
        },
        label: metadata.map_or_else(|| key.to_owned(), |entry| entry.label.to_owned()),
        placeholder: None,
        widget: WidgetValue::Text(String::new()),
    }
}

/// Initial widget state for a value.
///
/// Secret widgets always start empty, even when the stored value is the sentinel.
#[must_use]
pub fn initial_widget(hint: RenderHint, value: &Value) -> WidgetValue {
    match hint {
        RenderHint::Boolean => WidgetValue::Toggle(is_truthy(value)),
        RenderHint::Numeric => WidgetValue::Text(match value {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }),
        RenderHint::ArrayJson => {
            let array = if value.is_array() {
                value.clone()
            } else {
                Value::Array(Vec::new())
            };
            WidgetValue::Text(pretty_json(&array))
        },
        RenderHint::ObjectJson => {
            let object = if value.is_null() {
                Value::Object(serde_json::Map::new())
            } else {
                value.clone()
            };
            WidgetValue::Text(pretty_json(&object))
        },
        RenderHint::SecretText => WidgetValue::Text(match value {
            Value::String(text) if text != MASK_SENTINEL => text.clone(),
            _ => String::new(),
        }),
        RenderHint::PlainText => WidgetValue::Text(match value {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }),
    }
}

/// Collect one widget into a typed value for a resolved field.
pub fn collect_field(
    path: &FieldPath,
    schema: &SchemaNode,
    widget: &WidgetValue,
) -> Result<Collected, CollectionError> {
    let is_secret = is_secret_field(&path.key, Some(schema));
    let hint = render_hint(schema.schema_type(), is_secret);

    match (hint, widget) {
        (RenderHint::Boolean, WidgetValue::Toggle(on)) => Ok(Collected::Set(Value::Bool(*on))),
        (RenderHint::Boolean, WidgetValue::Text(text)) => parse_boolean(path, text),
        (_, WidgetValue::Toggle(_)) => Err(CollectionError::WidgetMismatch {
            field: path.clone(),
            hint,
        }),
        (RenderHint::Numeric, WidgetValue::Text(text)) => {
            let expected = schema.schema_type().unwrap_or(SchemaType::Number);
            parse_numeric(path, expected, text)
        },
        (RenderHint::ArrayJson, WidgetValue::Text(text)) => {
            parse_json_text(path, SchemaType::Array, text)
        },
        (RenderHint::ObjectJson, WidgetValue::Text(text)) => {
            parse_json_text(path, SchemaType::Object, text)
        },
        (RenderHint::SecretText, WidgetValue::Text(text)) => {
            if is_withheld_secret_text(text) {
                Ok(Collected::Keep)
            } else {
                Ok(Collected::Set(Value::String(text.trim().to_owned())))
            }
        },
        (RenderHint::PlainText, WidgetValue::Text(text)) => {
            Ok(Collected::Set(Value::String(text.clone())))
        },
    }
}

fn parse_boolean(path: &FieldPath, text: &str) -> Result<Collected, CollectionError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Collected::Set(Value::Bool(true))),
        "false" | "0" | "no" | "off" | "" => Ok(Collected::Set(Value::Bool(false))),
        _ => Err(CollectionError::InvalidBoolean {
            field: path.clone(),
            input: text.to_owned(),
        }),
    }
}

fn parse_numeric(
    path: &FieldPath,
    expected: SchemaType,
    text: &str,
) -> Result<Collected, CollectionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Collected::Set(Value::Null));
    }

    let number = if expected == SchemaType::Integer {
        parse_integer(trimmed)
    } else {
        parse_number(trimmed)
    };

    number
        .map(|number| Collected::Set(Value::Number(number)))
        .ok_or_else(|| CollectionError::InvalidNumber {
            field: path.clone(),
            expected,
            input: text.to_owned(),
        })
}

/// Integers accept a zero fractional part (`30.0`) but never a real fraction.
fn parse_integer(text: &str) -> Option<Number> {
    let whole = match text.split_once('.') {
        Some((whole, fraction)) if fraction.chars().all(|ch| ch == '0') => whole,
        Some(_) => return None,
        None => text,
    };
    if let Ok(value) = whole.parse::<i64>() {
        return Some(Number::from(value));
    }
    whole.parse::<u64>().ok().map(Number::from)
}

fn parse_number(text: &str) -> Option<Number> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(Number::from(value));
    }
    if let Ok(value) = text.parse::<u64>() {
        return Some(Number::from(value));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn parse_json_text(
    path: &FieldPath,
    expected: SchemaType,
    text: &str,
) -> Result<Collected, CollectionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Collected::Set(if expected == SchemaType::Array {
            Value::Array(Vec::new())
        } else {
            Value::Object(serde_json::Map::new())
        }));
    }

    let parsed: Value =
        serde_json::from_str(trimmed).map_err(|error| CollectionError::InvalidJson {
            field: path.clone(),
            reason: error.to_string(),
        })?;

    let matches = match expected {
        SchemaType::Array => parsed.is_array(),
        _ => parsed.is_object(),
    };
    if !matches {
        return Err(CollectionError::UnexpectedJsonType {
            field: path.clone(),
            expected,
            found: json_type_name(&parsed),
        });
    }
    Ok(Collected::Set(parsed))
}

/// Truthiness used to seed toggles from arbitrary stored values.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
