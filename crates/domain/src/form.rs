//! Per-section form model: descriptors plus live widget state.

use crate::document::{ConfigDocument, SectionName, SectionPatch};
use crate::field::{
    Collected, CollectionError, FieldDescriptor, WidgetValue, describe_degraded_field,
    describe_field,
};
use crate::resolver::{ResolutionFailure, SchemaResolver};
use crate::schema::SchemaDocument;
use crate::secrets::SecretReconciler;
use serde_json::{Map, Value};

/// The editable form for one section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionForm {
    section: SectionName,
    fields: Vec<FieldDescriptor>,
    widgets: Vec<WidgetValue>,
    section_error: Option<ResolutionFailure>,
}

impl SectionForm {
    /// Build one descriptor per declared property, in declaration order.
    ///
    /// A property whose schema cannot be resolved degrades to an uneditable
    /// field. If the section schema itself cannot be resolved the form is
    /// empty and the failure is kept in [`SectionForm::section_error`].
    #[must_use]
    pub fn build(schema: &SchemaDocument, section: &SectionName, masked: &ConfigDocument) -> Self {
        let resolver = SchemaResolver::new(schema);
        let section_node = match resolver.resolve_section(section) {
            Ok(node) => node,
            Err(failure) => {
                return Self {
                    section: section.clone(),
                    fields: Vec::new(),
                    widgets: Vec::new(),
                    section_error: Some(failure),
                };
            },
        };

        let fields: Vec<FieldDescriptor> = section_node
            .iter()
            .flat_map(|node| node.properties())
            .map(|(key, property)| {
                let current = masked.field(section, key);
                match resolver.resolve(property) {
                    Ok(resolved) => describe_field(section, key, resolved, current),
                    Err(failure) => describe_degraded_field(section, key, failure, current),
                }
            })
            .collect();
        let widgets = fields.iter().map(|field| field.widget.clone()).collect();

        Self {
            section: section.clone(),
            fields,
            widgets,
            section_error: None,
        }
    }

    /// Section this form edits.
    #[must_use]
    pub const fn section(&self) -> &SectionName {
        &self.section
    }

    /// Field descriptors in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Current widget states, parallel to [`SectionForm::fields`].
    #[must_use]
    pub fn widgets(&self) -> &[WidgetValue] {
        &self.widgets
    }

    /// Failure resolving the section schema itself, if any.
    #[must_use]
    pub const fn section_error(&self) -> Option<&ResolutionFailure> {
        self.section_error.as_ref()
    }

    /// Descriptor and widget for a key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<(&FieldDescriptor, &WidgetValue)> {
        let index = self.index_of(key)?;
        Some((self.fields.get(index)?, self.widgets.get(index)?))
    }

    /// Replace the widget state for a key. Returns false for unknown keys.
    pub fn set_widget(&mut self, key: &str, value: WidgetValue) -> bool {
        let Some(slot) = self.index_of(key).and_then(|index| self.widgets.get_mut(index)) else {
            return false;
        };
        *slot = value;
        true
    }

    /// Reset every widget to the value it was described with.
    pub fn reset(&mut self) {
        self.widgets = self.fields.iter().map(|field| field.widget.clone()).collect();
    }

    /// Collect every field into a patch for this section.
    ///
    /// Any single [`CollectionError`] aborts the whole collection. Kept secrets
    /// and degraded fields are omitted, and the result passes through the
    /// secret reconciler.
    pub fn collect(&self) -> Result<SectionPatch, CollectionError> {
        let mut body = Map::new();
        for (field, widget) in self.fields.iter().zip(&self.widgets) {
            if let Collected::Set(value) = field.collect(widget)? {
                body.insert(field.path.key.clone(), value);
            }
        }
        let reconciled = SecretReconciler::reconcile(body);
        Ok(SectionPatch::new(self.section.clone(), reconciled.body))
    }

    /// The stored section value as pretty JSON, for the advanced editor.
    #[must_use]
    pub fn stored_json(masked: &ConfigDocument, section: &SectionName) -> String {
        let value = masked
            .section(section)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.path.key == key)
    }
}
