//! JSON-Schema documents and concrete schema node views.
//!
//! The schema is kept as a dynamic [`Value`] tree. Field types are decided at
//! runtime from each node's `type`, so new config sections need no new Rust types.

use crate::document::SectionName;
use serde_json::Value;
use std::fmt;

/// Primitive type declared by a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    /// `"boolean"`
    Boolean,
    /// `"integer"`
    Integer,
    /// `"number"`
    Number,
    /// `"string"`
    String,
    /// `"array"`
    Array,
    /// `"object"`
    Object,
    /// `"null"`
    Null,
}

impl SchemaType {
    /// Parse a JSON-Schema type keyword.
    #[must_use]
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// JSON-Schema keyword for this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Returns the effective type a raw schema value declares.
///
/// A `type` array (`["integer", "null"]`) yields its first non-null entry.
#[must_use]
pub fn declared_type(node: &Value) -> Option<SchemaType> {
    match node.get("type")? {
        Value::String(keyword) => SchemaType::parse(keyword),
        Value::Array(keywords) => {
            let parsed: Vec<SchemaType> = keywords
                .iter()
                .filter_map(Value::as_str)
                .filter_map(SchemaType::parse)
                .collect();
            parsed
                .iter()
                .copied()
                .find(|kind| *kind != SchemaType::Null)
                .or_else(|| parsed.first().copied())
        },
        _ => None,
    }
}

/// Returns true when a schema value only admits `null`.
#[must_use]
pub fn is_null_typed(node: &Value) -> bool {
    declared_type(node) == Some(SchemaType::Null)
}

/// A whole schema document, as served by the config API.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    root: Value,
}

impl SchemaDocument {
    /// Wrap a schema root value.
    #[must_use]
    pub const fn new(root: Value) -> Self {
        Self { root }
    }

    /// Borrow the root value.
    #[must_use]
    pub const fn root(&self) -> &Value {
        &self.root
    }

    /// Top-level section names in property declaration order.
    ///
    /// Names that are blank are skipped.
    #[must_use]
    pub fn section_names(&self) -> Vec<SectionName> {
        self.root
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .keys()
                    .filter_map(|key| SectionName::parse(key).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Raw (unresolved) schema for a top-level section.
    #[must_use]
    pub fn section_schema(&self, section: &SectionName) -> Option<&Value> {
        self.root.get("properties")?.get(section.as_str())
    }
}

/// A concrete schema node: no `$ref`, `anyOf` or `allOf` left to follow,
/// unless resolution ran out of steps.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    value: Value,
}

impl SchemaNode {
    /// Wrap a raw node without resolving it.
    #[must_use]
    pub const fn from_value(value: Value) -> Self {
        Self { value }
    }

    /// Borrow the raw node.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.value
    }

    /// Effective declared type, if any.
    #[must_use]
    pub fn schema_type(&self) -> Option<SchemaType> {
        declared_type(&self.value)
    }

    /// `format` keyword (e.g. `uri`).
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        self.value.get("format").and_then(Value::as_str)
    }

    /// `description` keyword.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.value.get("description").and_then(Value::as_str)
    }

    /// `title` keyword.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.value.get("title").and_then(Value::as_str)
    }

    /// Returns true when the node declares `writeOnly: true`.
    #[must_use]
    pub fn is_write_only(&self) -> bool {
        self.value.get("writeOnly").and_then(Value::as_bool) == Some(true)
    }

    /// `default` keyword, if present.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.value.get("default")
    }

    /// Declared properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.value
            .get("properties")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|properties| properties.iter().map(|(key, node)| (key.as_str(), node)))
    }

    /// Returns true when the node still carries an indirection keyword.
    #[must_use]
    pub fn has_indirection(&self) -> bool {
        has_indirection(&self.value)
    }
}

pub(crate) fn has_indirection(node: &Value) -> bool {
    node.get("$ref").is_some_and(Value::is_string)
        || node
            .get("anyOf")
            .and_then(Value::as_array)
            .is_some_and(|alternatives| !alternatives.is_empty())
        || node
            .get("allOf")
            .and_then(Value::as_array)
            .is_some_and(|parts| !parts.is_empty())
}
