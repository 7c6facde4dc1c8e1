//! Schema indirection resolution (`$ref`, nullable `anyOf`, `allOf`).
//!
//! Resolution walks at most [`MAX_RESOLUTION_STEPS`] indirections. A cycle,
//! a pointer that leads nowhere, or a reference outside the document is a
//! terminal [`ResolutionFailure`] for that node only. Running out of steps is
//! not a failure: the node reached so far is returned as-is.

use crate::schema::{SchemaDocument, SchemaNode, has_indirection, is_null_typed};
use config_console_shared::{ErrorCode, ErrorEnvelope};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Upper bound on indirections followed for one node.
pub const MAX_RESOLUTION_STEPS: usize = 16;

/// Terminal failure while resolving one schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// A `#/...` pointer segment does not exist in the document.
    UnresolvablePointer {
        /// The full `$ref` value.
        reference: String,
        /// Decoded segment that could not be found.
        segment: String,
    },
    /// A `$ref` points outside the current document.
    ExternalReference {
        /// The full `$ref` value.
        reference: String,
    },
    /// A `$ref` was seen twice while resolving the same node.
    ReferenceCycle {
        /// The repeated `$ref` value.
        reference: String,
    },
}

impl ResolutionFailure {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnresolvablePointer { .. } => ErrorCode::new("schema", "unresolvable_pointer"),
            Self::ExternalReference { .. } => ErrorCode::new("schema", "external_reference"),
            Self::ReferenceCycle { .. } => ErrorCode::new("schema", "reference_cycle"),
        }
    }

    /// The `$ref` value that failed.
    #[must_use]
    pub fn reference(&self) -> &str {
        match self {
            Self::UnresolvablePointer { reference, .. }
            | Self::ExternalReference { reference }
            | Self::ReferenceCycle { reference } => reference,
        }
    }
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvablePointer { reference, segment } => {
                write!(formatter, "schema pointer {reference} has no segment `{segment}`")
            },
            Self::ExternalReference { reference } => {
                write!(formatter, "schema reference {reference} is outside the document")
            },
            Self::ReferenceCycle { reference } => {
                write!(formatter, "schema reference {reference} is cyclic")
            },
        }
    }
}

impl std::error::Error for ResolutionFailure {}

impl From<ResolutionFailure> for ErrorEnvelope {
    fn from(error: ResolutionFailure) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string())
            .with_metadata("reference", error.reference());
        match error {
            ResolutionFailure::UnresolvablePointer { segment, .. } => {
                envelope.with_metadata("segment", segment)
            },
            ResolutionFailure::ExternalReference { .. }
            | ResolutionFailure::ReferenceCycle { .. } => envelope,
        }
    }
}

/// Decode one JSON pointer token (`~1` → `/`, then `~0` → `~`).
#[must_use]
pub fn decode_pointer_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Resolves schema nodes against one [`SchemaDocument`].
#[derive(Debug, Clone, Copy)]
pub struct SchemaResolver<'a> {
    document: &'a SchemaDocument,
    max_steps: usize,
}

impl<'a> SchemaResolver<'a> {
    /// Create a resolver with the default step bound.
    #[must_use]
    pub const fn new(document: &'a SchemaDocument) -> Self {
        Self {
            document,
            max_steps: MAX_RESOLUTION_STEPS,
        }
    }

    /// Override the step bound.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Follow a `#/...` pointer inside the document.
    pub fn pointer(&self, reference: &str) -> Result<&'a Value, ResolutionFailure> {
        let Some(path) = reference.strip_prefix('#') else {
            return Err(ResolutionFailure::ExternalReference {
                reference: reference.to_owned(),
            });
        };
        if !path.is_empty() && !path.starts_with('/') {
            return Err(ResolutionFailure::ExternalReference {
                reference: reference.to_owned(),
            });
        }

        let mut current = self.document.root();
        for raw in path.split('/').filter(|token| !token.is_empty()) {
            let segment = decode_pointer_token(raw);
            let next = match current {
                Value::Object(map) => map.get(&segment),
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index)),
                _ => None,
            };
            let Some(next) = next else {
                return Err(ResolutionFailure::UnresolvablePointer {
                    reference: reference.to_owned(),
                    segment,
                });
            };
            current = next;
        }

        Ok(current)
    }

    /// Resolve a node into a concrete [`SchemaNode`].
    ///
    /// When an indirection wrapper carries a `description` and the node it
    /// leads to has none, the nearest wrapper's description is kept.
    pub fn resolve(&self, node: &Value) -> Result<SchemaNode, ResolutionFailure> {
        let mut current = node;
        let mut carried_description: Option<&Value> = None;
        let mut seen: HashSet<&str> = HashSet::new();

        for _ in 0..self.max_steps {
            if !has_indirection(current) {
                break;
            }
            if let Some(description) = current.get("description") {
                carried_description = Some(description);
            }

            if let Some(reference) = current.get("$ref").and_then(Value::as_str) {
                if !seen.insert(reference) {
                    return Err(ResolutionFailure::ReferenceCycle {
                        reference: reference.to_owned(),
                    });
                }
                current = self.pointer(reference)?;
                continue;
            }

            if let Some(alternatives) = non_empty_array(current, "anyOf") {
                current = alternatives
                    .iter()
                    .find(|alternative| !is_null_typed(alternative))
                    .or_else(|| alternatives.first())
                    .unwrap_or(current);
                continue;
            }

            if let Some(first) = non_empty_array(current, "allOf").and_then(|parts| parts.first())
            {
                current = first;
            }
        }

        Ok(finish(current, carried_description))
    }

    /// Resolve the schema of a top-level section.
    ///
    /// Returns `Ok(None)` when the schema declares no such section.
    pub fn resolve_section(
        &self,
        section: &crate::SectionName,
    ) -> Result<Option<SchemaNode>, ResolutionFailure> {
        self.document
            .section_schema(section)
            .map(|node| self.resolve(node))
            .transpose()
    }
}

fn non_empty_array<'v>(node: &'v Value, keyword: &str) -> Option<&'v Vec<Value>> {
    node.get(keyword)
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
}

fn finish(node: &Value, carried_description: Option<&Value>) -> SchemaNode {
    let mut resolved = node.clone();
    if let (Some(description), Value::Object(map)) = (carried_description, &mut resolved)
        && !map.contains_key("description")
    {
        map.insert("description".to_owned(), description.clone());
    }
    SchemaNode::from_value(resolved)
}
