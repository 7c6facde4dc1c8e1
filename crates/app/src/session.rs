//! Edit-session state: the cached schema, the masked document, and the
//! active section with its form and advanced buffer.

use config_console_domain::{ConfigDocument, SchemaDocument, SectionForm, SectionName};
use config_console_shared::{ErrorCode, ErrorEnvelope};

/// Primary lifecycle of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// Nothing fetched yet, or the last load failed from an empty session.
    #[default]
    Unloaded,
    /// A load is in flight.
    Loading,
    /// Schema and masked document are cached.
    Loaded,
}

/// How the active section is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Per-field widgets.
    #[default]
    Form,
    /// Raw JSON for the whole section.
    Advanced,
}

impl EditMode {
    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Form => Self::Advanced,
            Self::Advanced => Self::Form,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::Advanced => "advanced",
        }
    }
}

/// Single-owner session state.
///
/// The masked document is the only cached copy of the config; unmasked values
/// exist only inside an outgoing patch. A save or import replaces the whole
/// masked document rather than editing it in place.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    phase: LoadPhase,
    schema: Option<SchemaDocument>,
    masked_config: ConfigDocument,
    navigation: Vec<SectionName>,
    active_section: Option<SectionName>,
    edit_mode: EditMode,
    form: Option<SectionForm>,
    advanced_buffer: String,
}

impl SessionState {
    /// Empty, unloaded session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// True once schema and document are cached.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.phase == LoadPhase::Loaded
    }

    /// Cached schema.
    #[must_use]
    pub const fn schema(&self) -> Option<&SchemaDocument> {
        self.schema.as_ref()
    }

    /// Cached masked document.
    #[must_use]
    pub const fn masked_config(&self) -> &ConfigDocument {
        &self.masked_config
    }

    /// Section names in schema declaration order.
    #[must_use]
    pub fn navigation(&self) -> &[SectionName] {
        &self.navigation
    }

    /// Section being edited.
    #[must_use]
    pub const fn active_section(&self) -> Option<&SectionName> {
        self.active_section.as_ref()
    }

    /// Current edit mode.
    #[must_use]
    pub const fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    /// Form for the active section.
    #[must_use]
    pub const fn form(&self) -> Option<&SectionForm> {
        self.form.as_ref()
    }

    /// Raw JSON buffer for advanced editing of the active section.
    #[must_use]
    pub fn advanced_buffer(&self) -> &str {
        &self.advanced_buffer
    }

    /// Discard everything and return to [`LoadPhase::Unloaded`].
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn begin_loading(&mut self) -> Self {
        let previous = self.clone();
        self.phase = LoadPhase::Loading;
        previous
    }

    pub(crate) fn install(&mut self, schema: SchemaDocument, masked_config: ConfigDocument) {
        self.navigation = schema.section_names();
        self.schema = Some(schema);
        self.masked_config = masked_config;
        self.active_section = None;
        self.edit_mode = EditMode::Form;
        self.form = None;
        self.advanced_buffer.clear();
        self.phase = LoadPhase::Loaded;
    }

    pub(crate) fn replace_masked_config(&mut self, masked_config: ConfigDocument) {
        self.masked_config = masked_config;
    }

    /// Make `section` active in form mode, rebuilding widgets and the
    /// advanced buffer from the masked document.
    pub(crate) fn activate(&mut self, section: SectionName) {
        self.active_section = Some(section);
        self.edit_mode = EditMode::Form;
        self.rerender();
    }

    pub(crate) fn set_edit_mode(&mut self, mode: EditMode) {
        self.edit_mode = mode;
    }

    /// Rebuild the active section's form and buffer from stored values.
    /// Unsaved widget and buffer edits are dropped.
    pub(crate) fn rerender(&mut self) {
        let (Some(schema), Some(section)) = (self.schema.as_ref(), self.active_section.as_ref())
        else {
            self.form = None;
            self.advanced_buffer.clear();
            return;
        };
        self.form = Some(SectionForm::build(schema, section, &self.masked_config));
        self.advanced_buffer = SectionForm::stored_json(&self.masked_config, section);
    }

    pub(crate) fn form_mut(&mut self) -> Option<&mut SectionForm> {
        self.form.as_mut()
    }

    pub(crate) fn set_advanced_buffer(&mut self, text: String) {
        self.advanced_buffer = text;
    }

    pub(crate) fn require_loaded(&self) -> Result<(), ErrorEnvelope> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(ErrorEnvelope::expected(
                ErrorCode::new("console", "not_loaded"),
                "config is not loaded",
            ))
        }
    }

    pub(crate) fn require_active_section(&self) -> Result<SectionName, ErrorEnvelope> {
        self.require_loaded()?;
        self.active_section.clone().ok_or_else(|| {
            ErrorEnvelope::expected(
                ErrorCode::new("console", "no_active_section"),
                "no section is selected",
            )
        })
    }

    pub(crate) fn find_section(&self, name: &str) -> Result<SectionName, ErrorEnvelope> {
        self.navigation
            .iter()
            .find(|section| section.as_str() == name.trim())
            .cloned()
            .ok_or_else(|| {
                ErrorEnvelope::expected(
                    ErrorCode::new("console", "unknown_section"),
                    format!("unknown section `{}`", name.trim()),
                )
                .with_metadata("section", name.trim())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loaded() -> SessionState {
        let schema = SchemaDocument::new(json!({
            "properties": {
                "gateway": {"type": "object", "properties": {"port": {"type": "integer"}}},
                "llm": {"type": "object", "properties": {"model": {"type": "string"}}},
            }
        }));
        let masked = ConfigDocument::from_value(json!({"gateway": {"port": 8788}}))
            .unwrap_or_default();
        let mut session = SessionState::new();
        session.install(schema, masked);
        session
    }

    #[test]
    fn install_builds_navigation_in_declaration_order() {
        let session = loaded();
        let names: Vec<&str> = session.navigation().iter().map(SectionName::as_str).collect();
        assert_eq!(names, vec!["gateway", "llm"]);
        assert!(session.is_loaded());
        assert!(session.active_section().is_none());
    }

    #[test]
    fn activate_renders_form_and_buffer() {
        let mut session = loaded();
        let gateway = session.find_section("gateway");
        assert!(gateway.is_ok());
        let Ok(gateway) = gateway else { return };

        session.set_edit_mode(EditMode::Advanced);
        session.activate(gateway);
        assert_eq!(session.edit_mode(), EditMode::Form);
        assert!(session.form().is_some());
        assert!(session.advanced_buffer().contains("\"port\": 8788"));
    }

    #[test]
    fn preconditions_report_stable_codes() {
        let session = SessionState::new();
        let error = session.require_active_section().err();
        assert!(matches!(error, Some(ref error) if error.code == ErrorCode::new("console", "not_loaded")));

        let session = loaded();
        let error = session.require_active_section().err();
        assert!(matches!(error, Some(ref error) if error.code == ErrorCode::new("console", "no_active_section")));

        let error = session.find_section("memory").err();
        assert!(matches!(error, Some(ref error) if error.metadata_value("section") == Some("memory")));
    }

    #[test]
    fn reset_discards_cache() {
        let mut session = loaded();
        session.reset();
        assert_eq!(session.phase(), LoadPhase::Unloaded);
        assert!(session.schema().is_none());
        assert!(session.navigation().is_empty());
    }
}
