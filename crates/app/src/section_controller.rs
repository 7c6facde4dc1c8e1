//! The config editor: load, section selection, mode switching, save, and
//! connectivity tests over one [`SessionState`].

use crate::session::{EditMode, LoadPhase, SessionState};
use crate::status::{StatusLevel, StatusNotifier};
use config_console_domain::{
    ConfigDocument, SchemaDocument, SecretReconciler, SectionName, SectionPatch, WidgetValue,
    parse_object_text,
};
use config_console_ports::{ConfigApiPort, ConnectivityReport, LogFields, LoggerPort};
use config_console_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result, ResultExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Dependencies required by the editor.
#[derive(Clone)]
pub struct ConfigEditorDeps {
    /// Config API adapter.
    pub api: Arc<dyn ConfigApiPort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    /// Section that was patched.
    pub section: SectionName,
    /// The exact patch submitted.
    pub patch: SectionPatch,
    /// Server message, if any.
    pub message: Option<String>,
    /// False when the follow-up refetch failed and the cache may be stale.
    pub refreshed: bool,
}

/// Schema-driven config editor.
///
/// Every operation takes `&mut self`, so one editor runs one operation at a
/// time and a save's refetch can never race another save.
pub struct ConfigEditor {
    deps: ConfigEditorDeps,
    session: SessionState,
    status: StatusNotifier,
}

impl ConfigEditor {
    /// Editor with an empty session and default toast lifetime.
    #[must_use]
    pub fn new(deps: ConfigEditorDeps) -> Self {
        Self {
            deps,
            session: SessionState::new(),
            status: StatusNotifier::default(),
        }
    }

    /// Override the toast lifetime.
    #[must_use]
    pub fn with_toast_ttl(mut self, ttl: Duration) -> Self {
        self.status = StatusNotifier::new(ttl);
        self
    }

    /// Session state.
    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    /// Status and toasts.
    #[must_use]
    pub const fn status(&self) -> &StatusNotifier {
        &self.status
    }

    /// Mutable status, for draining toasts.
    pub const fn status_mut(&mut self) -> &mut StatusNotifier {
        &mut self.status
    }

    /// Discard the cached session.
    pub fn reset(&mut self) {
        self.session.reset();
        self.status.clear();
    }

    /// Fetch schema and masked document, build navigation, and select the
    /// first section.
    ///
    /// On failure the session is restored to what it was before the call.
    pub async fn load(&mut self, ctx: &RequestContext) -> Result<()> {
        let started_at = Instant::now();
        self.log_start("console.load.start", "Config load started", None);
        let previous = self.session.begin_loading();
        self.status.set_status(StatusLevel::Loading, "loading");

        let fetched = self.fetch_session(ctx).await;
        match fetched {
            Ok((schema, masked)) => {
                self.session.install(schema, masked);
                if let Some(first) = self.session.navigation().first().cloned() {
                    self.session.activate(first);
                }
                self.status.set_status(StatusLevel::Ok, "loaded");
                let mut fields = duration_fields(started_at);
                fields.insert(
                    "sections".into(),
                    Value::from(self.session.navigation().len()),
                );
                self.log_info("console.load.completed", "Config load completed", fields);
                Ok(())
            },
            Err(cause) => {
                self.session = previous;
                let error = load_failed(&cause);
                self.status.set_status(StatusLevel::Error, "load failed");
                self.status
                    .toast(StatusLevel::Error, error.message.clone(), Instant::now());
                self.log_failure("console.load.failed", &error, duration_fields(started_at));
                Err(error)
            },
        }
    }

    async fn fetch_session(
        &self,
        ctx: &RequestContext,
    ) -> Result<(SchemaDocument, ConfigDocument)> {
        let schema = self.deps.api.fetch_schema(ctx).await?;
        let masked = self.deps.api.fetch_config(ctx, true).await?;
        Ok((schema, masked))
    }

    /// Make `name` the active section in form mode.
    ///
    /// Returns `Ok(false)` without touching state when nothing is loaded.
    pub fn select_section(&mut self, name: &str) -> Result<bool> {
        if self.session.phase() != LoadPhase::Loaded {
            return Ok(false);
        }
        let section = self.session.find_section(name)?;
        self.session.activate(section);
        Ok(true)
    }

    /// Flip between form and advanced editing.
    ///
    /// Both the form widgets and the advanced buffer are rebuilt from the
    /// stored values, so unsaved edits in either mode are discarded.
    pub fn toggle_mode(&mut self) -> Result<EditMode> {
        self.session.require_active_section()?;
        let mode = self.session.edit_mode().toggled();
        self.session.rerender();
        self.session.set_edit_mode(mode);
        Ok(mode)
    }

    /// Update one form widget of the active section.
    pub fn set_widget(&mut self, key: &str, value: WidgetValue) -> Result<()> {
        let section = self.session.require_active_section()?;
        let updated = self
            .session
            .form_mut()
            .is_some_and(|form| form.set_widget(key, value));
        if updated {
            Ok(())
        } else {
            Err(ErrorEnvelope::expected(
                ErrorCode::new("console", "unknown_field"),
                format!("section `{section}` has no field `{key}`"),
            )
            .with_metadata("section", section.as_str())
            .with_metadata("field", key))
        }
    }

    /// Replace the advanced JSON buffer of the active section.
    ///
    /// The text is kept verbatim; it is parsed on save.
    pub fn set_advanced_buffer(&mut self, text: impl Into<String>) -> Result<()> {
        self.session.require_active_section()?;
        self.session.set_advanced_buffer(text.into());
        Ok(())
    }

    /// Collect the active section and PATCH it, then refetch the masked
    /// document.
    ///
    /// A collection or parse failure aborts before any request is made. A
    /// rejected patch leaves the session untouched. A failed refetch after
    /// an accepted patch still reports success with `refreshed: false`.
    pub async fn save(&mut self, ctx: &RequestContext) -> Result<SaveReport> {
        let section = self.session.require_active_section()?;
        let started_at = Instant::now();
        let mode = self.session.edit_mode();
        let mut fields = section_fields(&section);
        fields.insert("mode".into(), Value::from(mode.as_str()));
        self.log_start("console.save.start", "Config save started", Some(fields.clone()));

        let result = self.submit(ctx, &section, mode).await;
        fields.extend(duration_fields(started_at));
        match result {
            Ok(report) => {
                fields.insert("refreshed".into(), Value::Bool(report.refreshed));
                self.log_info("console.save.completed", "Config save completed", fields);
                Ok(report)
            },
            Err(error) => {
                let error = error.with_metadata("section", section.as_str());
                self.status.set_status(StatusLevel::Error, "save failed");
                self.status.toast(
                    StatusLevel::Error,
                    format!("save failed: {}", error.message),
                    Instant::now(),
                );
                self.log_failure("console.save.failed", &error, fields);
                Err(error)
            },
        }
    }

    async fn submit(
        &mut self,
        ctx: &RequestContext,
        section: &SectionName,
        mode: EditMode,
    ) -> Result<SaveReport> {
        let patch = self.collect_patch(section, mode)?;
        let outcome = self
            .deps
            .api
            .patch_section(ctx, patch.clone())
            .await
            .with_operation("save")?;

        let refreshed = match self.deps.api.fetch_config(ctx, true).await {
            Ok(masked) => {
                self.session.replace_masked_config(masked);
                self.session.rerender();
                self.session.set_edit_mode(mode);
                self.status.set_status(StatusLevel::Ok, "saved");
                self.status
                    .toast(StatusLevel::Ok, format!("`{section}` saved"), Instant::now());
                true
            },
            Err(error) => {
                self.session.rerender();
                self.session.set_edit_mode(mode);
                self.status
                    .set_status(StatusLevel::Warning, "saved; refresh failed");
                self.status.toast(
                    StatusLevel::Warning,
                    format!("`{section}` saved but reload failed: {}", error.message),
                    Instant::now(),
                );
                self.log_failure(
                    "console.save.refresh_failed",
                    &error,
                    section_fields(section),
                );
                false
            },
        };

        Ok(SaveReport {
            section: section.clone(),
            patch,
            message: outcome.message,
            refreshed,
        })
    }

    fn collect_patch(&self, section: &SectionName, mode: EditMode) -> Result<SectionPatch> {
        match mode {
            EditMode::Advanced => {
                let body = parse_object_text("advanced editor", self.session.advanced_buffer())?;
                let reconciled = SecretReconciler::reconcile(body);
                Ok(SectionPatch::new(section.clone(), reconciled.body))
            },
            EditMode::Form => {
                let form = self.session.form().ok_or_else(|| {
                    ErrorEnvelope::invariant(ErrorCode::internal(), "active section has no form")
                })?;
                form.collect().map_err(ErrorEnvelope::from)
            },
        }
    }

    /// Run the connectivity test for `section`, or the active section.
    ///
    /// Never mutates the session; the outcome only reaches the status.
    pub async fn test_connection(
        &mut self,
        ctx: &RequestContext,
        section: Option<&str>,
    ) -> Result<ConnectivityReport> {
        let section = match section {
            Some(name) => {
                self.session.require_loaded()?;
                self.session.find_section(name)?
            },
            None => self.session.require_active_section()?,
        };
        let started_at = Instant::now();
        self.log_start(
            "console.test.start",
            "Connectivity test started",
            Some(section_fields(&section)),
        );

        let mut fields = section_fields(&section);
        match self.deps.api.test_section(ctx, &section).await {
            Ok(report) => {
                let (level, text) = connectivity_text(&section, &report);
                self.status.set_status(level, text.clone());
                self.status.toast(level, text, Instant::now());
                fields.insert("ok".into(), Value::Bool(report.ok));
                if let Some(status_code) = report.status_code {
                    fields.insert("status_code".into(), Value::from(status_code));
                }
                fields.extend(duration_fields(started_at));
                self.log_info("console.test.completed", "Connectivity test completed", fields);
                Ok(report)
            },
            Err(error) => {
                let error = error.with_metadata("section", section.as_str());
                self.status.set_status(StatusLevel::Error, "test failed");
                self.status.toast(
                    StatusLevel::Error,
                    format!("test failed: {}", error.message),
                    Instant::now(),
                );
                fields.extend(duration_fields(started_at));
                self.log_failure("console.test.failed", &error, fields);
                Err(error)
            },
        }
    }

    pub(crate) const fn deps(&self) -> &ConfigEditorDeps {
        &self.deps
    }

    pub(crate) const fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub(crate) fn log_start(&self, event: &str, message: &str, fields: Option<LogFields>) {
        if let Some(logger) = self.deps.logger.as_ref() {
            logger.debug(event, message, fields);
        }
    }

    pub(crate) fn log_info(&self, event: &str, message: &str, fields: LogFields) {
        if let Some(logger) = self.deps.logger.as_ref() {
            logger.info(event, message, Some(fields));
        }
    }

    pub(crate) fn log_failure(&self, event: &str, error: &ErrorEnvelope, fields: LogFields) {
        if let Some(logger) = self.deps.logger.as_ref() {
            logger.failure(event, error, Some(fields));
        }
    }
}

/// Status text for a connectivity report.
#[must_use]
pub fn connectivity_text(section: &SectionName, report: &ConnectivityReport) -> (StatusLevel, String) {
    if report.ok {
        let status = report
            .status_code
            .map_or_else(|| "-".to_owned(), |code| code.to_string());
        (
            StatusLevel::Ok,
            format!("`{section}` reachable (HTTP {status})"),
        )
    } else {
        let message = report
            .message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or("error");
        (
            StatusLevel::Warning,
            format!("`{section}` unreachable: {message}"),
        )
    }
}

fn load_failed(cause: &ErrorEnvelope) -> ErrorEnvelope {
    let mut error = ErrorEnvelope::expected_with_class(
        ErrorCode::load_failed(),
        format!("config load failed: {}", cause.message),
        cause.class,
    );
    error.metadata.extend(cause.metadata.clone());
    error.with_metadata("cause_code", cause.code.to_string())
}

pub(crate) fn section_fields(section: &SectionName) -> LogFields {
    let mut fields = BTreeMap::new();
    fields.insert("section".into(), Value::from(section.as_str()));
    fields
}

pub(crate) fn duration_fields(started_at: Instant) -> LogFields {
    let duration_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut fields = BTreeMap::new();
    fields.insert("duration_ms".into(), Value::from(duration_ms));
    fields
}
