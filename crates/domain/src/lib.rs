//! # config-console-domain
//!
//! Pure model of the schema-driven config editor.
//!
//! This crate contains the editing rules with no infrastructure dependencies:
//!
//! - **Schema** - `SchemaDocument`, `SchemaNode`, `SchemaType`
//! - **Resolver** - `$ref` / `anyOf` / `allOf` resolution with a step bound
//! - **Field** - field descriptors, widget state, and collection back to JSON
//! - **Form** - one section's descriptors plus live widgets
//! - **Secrets** - the masking-aware merge rule for outgoing patches
//! - **Transfer** - raw JSON text for the advanced editor and import/export
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

// Re-export shared types for convenience
pub use config_console_shared::shared_crate_version;

// =============================================================================
// DOMAIN MODULES
// =============================================================================

pub mod document;
pub mod field;
pub mod form;
pub mod metadata;
pub mod resolver;
pub mod schema;
pub mod secrets;
pub mod transfer;

pub use document::{ConfigDocument, DocumentError, SectionName, SectionPatch, json_type_name};
pub use field::{
    Collected, CollectionError, FieldDescriptor, FieldPath, RenderHint, SECRET_PLACEHOLDER,
    URI_PLACEHOLDER, WidgetValue, collect_field, describe_degraded_field, describe_field,
    initial_widget, is_secret_field, is_truthy, render_hint,
};
pub use form::SectionForm;
pub use metadata::{FieldMetadata, field_metadata, section_label};
pub use resolver::{MAX_RESOLUTION_STEPS, ResolutionFailure, SchemaResolver, decode_pointer_token};
pub use schema::{SchemaDocument, SchemaNode, SchemaType, declared_type, is_null_typed};
pub use secrets::{Reconciled, SecretReconciler};
pub use transfer::{
    export_display_text, parse_object_text, strip_withheld_secrets, unwrap_config_envelope,
};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_crate_compiles() {
        let version = domain_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn domain_depends_on_shared() {
        let shared_version = shared_crate_version();
        assert!(!shared_version.is_empty());
    }
}
