//! Save command handler.

use crate::console::{ConsoleArgs, block_on, drain_toasts, load_section, open_editor};
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, log_info, to_pretty_json_line};
use config_console_app::{ConfigEditor, SaveReport};
use config_console_domain::WidgetValue;
use config_console_shared::{ErrorEnvelope, RequestContext};
use serde_json::json;

/// Where the edits for a save come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveSource {
    /// `key=value` assignments applied to form widgets; untouched fields keep
    /// their stored values.
    Fields(Vec<(String, String)>),
    /// Raw JSON for the whole section, submitted through the advanced editor.
    Json(String),
}

/// Run the save command.
pub fn run_save(
    mode: OutputMode,
    console: ConsoleArgs<'_>,
    section: &str,
    source: &SaveSource,
) -> Result<CliOutput, CliError> {
    let mut editor = match open_editor(console, mode) {
        Ok(editor) => editor,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let ctx = RequestContext::new_operation();
    let saved = block_on(async {
        load_section(&mut editor, &ctx, section).await?;
        apply_source(&mut editor, source)?;
        editor.save(&ctx).await
    })?;

    let mut stderr = String::new();
    drain_toasts(&mut editor, &mut stderr, mode.no_progress);
    let report = match saved {
        Ok(report) => report,
        Err(error) => {
            let mut output = format_error_output(mode, &error);
            output.stderr.insert_str(0, &stderr);
            return Ok(output);
        },
    };
    log_info(&mut stderr, "save completed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "save", Some(report_json(&report)))
    } else if mode.is_json() {
        let mut payload = report_json(&report);
        if let Some(map) = payload.as_object_mut() {
            map.insert("status".to_owned(), json!("ok"));
        }
        to_pretty_json_line(&payload)?
    } else {
        format_report_text(&report)
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn apply_source(editor: &mut ConfigEditor, source: &SaveSource) -> Result<(), ErrorEnvelope> {
    match source {
        SaveSource::Fields(assignments) => {
            for (key, value) in assignments {
                editor.set_widget(key, WidgetValue::text(value.as_str()))?;
            }
            Ok(())
        },
        SaveSource::Json(text) => {
            editor.toggle_mode()?;
            editor.set_advanced_buffer(text.as_str())
        },
    }
}

/// Only submitted keys are reported; patch values may carry a new secret.
fn report_json(report: &SaveReport) -> serde_json::Value {
    json!({
        "section": report.section.as_str(),
        "submitted": report.patch.body().keys().collect::<Vec<_>>(),
        "message": report.message,
        "refreshed": report.refreshed,
    })
}

fn format_report_text(report: &SaveReport) -> String {
    let mut out = format!("status: ok\nsection: {}\nsubmitted:", report.section);
    if report.patch.is_empty() {
        out.push_str(" []");
    }
    out.push('\n');
    for key in report.patch.body().keys() {
        out.push_str("  - ");
        out.push_str(key);
        out.push('\n');
    }
    if let Some(message) = report.message.as_deref() {
        out.push_str("message: ");
        out.push_str(message);
        out.push('\n');
    }
    out.push_str("refreshed: ");
    out.push_str(if report.refreshed { "true" } else { "false" });
    out.push('\n');
    out
}
