//! Whole-document backup and restore.

use crate::section_controller::{ConfigEditor, duration_fields};
use crate::status::StatusLevel;
use config_console_domain::{
    export_display_text, parse_object_text, strip_withheld_secrets, unwrap_config_envelope,
};
use config_console_shared::{RequestContext, Result, ResultExt};
use serde_json::Value;
use std::time::Instant;

/// Export payload and the text to show for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportView {
    /// Payload as returned by the config API.
    pub payload: Value,
    /// Display text (`yaml` when present, otherwise pretty JSON).
    pub text: String,
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Server message, if any.
    pub message: Option<String>,
    /// Top-level sections submitted.
    pub sections: Vec<String>,
    /// `section.key` secrets dropped because they carried no new value.
    pub withheld: Vec<String>,
    /// False when no refetch ran (unloaded session) or the refetch failed.
    pub refreshed: bool,
}

impl ConfigEditor {
    /// Fetch the masked export. The session is never touched.
    pub async fn export(&mut self, ctx: &RequestContext) -> Result<ExportView> {
        let started_at = Instant::now();
        self.log_start("console.export.start", "Config export started", None);

        match self.deps().api.export_config(ctx).await {
            Ok(payload) => {
                let text = export_display_text(&payload);
                self.log_info(
                    "console.export.completed",
                    "Config export completed",
                    duration_fields(started_at),
                );
                Ok(ExportView { payload, text })
            },
            Err(error) => {
                self.status_mut()
                    .toast(StatusLevel::Error, "export failed", Instant::now());
                self.log_failure("console.export.failed", &error, duration_fields(started_at));
                Err(error)
            },
        }
    }

    /// Import a whole document from raw JSON text.
    ///
    /// Accepts a bare document or a `{"config": {...}}` envelope. Withheld
    /// secrets are stripped per section before submission. On success a loaded
    /// session refetches the masked document and re-renders the active
    /// section; any failure leaves the session as it was.
    pub async fn import(&mut self, ctx: &RequestContext, raw_text: &str) -> Result<ImportReport> {
        let started_at = Instant::now();
        self.log_start("console.import.start", "Config import started", None);

        let result = self.submit_import(ctx, raw_text).await;
        let mut fields = duration_fields(started_at);
        match result {
            Ok(report) => {
                fields.insert("sections".into(), Value::from(report.sections.len()));
                fields.insert("withheld".into(), Value::from(report.withheld.len()));
                fields.insert("refreshed".into(), Value::Bool(report.refreshed));
                self.log_info("console.import.completed", "Config import completed", fields);
                Ok(report)
            },
            Err(error) => {
                self.status_mut()
                    .set_status(StatusLevel::Error, "import failed");
                self.status_mut().toast(
                    StatusLevel::Error,
                    format!("import failed: {}", error.message),
                    Instant::now(),
                );
                self.log_failure("console.import.failed", &error, fields);
                Err(error)
            },
        }
    }

    async fn submit_import(&mut self, ctx: &RequestContext, raw_text: &str) -> Result<ImportReport> {
        let document = unwrap_config_envelope(parse_object_text("import", raw_text)?);
        let (document, withheld) = strip_withheld_secrets(document);
        let sections = document.keys().cloned().collect();

        let outcome = self
            .deps()
            .api
            .import_config(ctx, document)
            .await
            .with_operation("import")?;

        if !self.session().is_loaded() {
            self.status_mut()
                .set_status(StatusLevel::Ok, "import succeeded");
            return Ok(ImportReport {
                message: outcome.message,
                sections,
                withheld,
                refreshed: false,
            });
        }

        let refreshed = match self.deps().api.fetch_config(ctx, true).await {
            Ok(masked) => {
                let mode = self.session().edit_mode();
                let session = self.session_mut();
                session.replace_masked_config(masked);
                session.rerender();
                session.set_edit_mode(mode);
                self.status_mut()
                    .set_status(StatusLevel::Ok, "import succeeded");
                self.status_mut()
                    .toast(StatusLevel::Ok, "import succeeded", Instant::now());
                true
            },
            Err(error) => {
                let mode = self.session().edit_mode();
                let session = self.session_mut();
                session.rerender();
                session.set_edit_mode(mode);
                self.status_mut()
                    .set_status(StatusLevel::Warning, "imported; refresh failed");
                self.status_mut().toast(
                    StatusLevel::Warning,
                    format!("import succeeded but reload failed: {}", error.message),
                    Instant::now(),
                );
                false
            },
        };

        Ok(ImportReport {
            message: outcome.message,
            sections,
            withheld,
            refreshed,
        })
    }
}
