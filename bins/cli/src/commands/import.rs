//! Import command handler.

use crate::console::{ConsoleArgs, block_on, drain_toasts, open_editor};
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, log_info, to_pretty_json_line};
use config_console_app::ImportReport;
use config_console_shared::RequestContext;
use serde_json::json;

/// Run the import command with the raw document text.
pub fn run_import(
    mode: OutputMode,
    console: ConsoleArgs<'_>,
    raw_text: &str,
) -> Result<CliOutput, CliError> {
    let mut editor = match open_editor(console, mode) {
        Ok(editor) => editor,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let ctx = RequestContext::new_operation();
    let imported = block_on(editor.import(&ctx, raw_text))?;

    let mut stderr = String::new();
    drain_toasts(&mut editor, &mut stderr, mode.no_progress);
    let report = match imported {
        Ok(report) => report,
        Err(error) => {
            let mut output = format_error_output(mode, &error);
            output.stderr.insert_str(0, &stderr);
            return Ok(output);
        },
    };
    log_info(&mut stderr, "import completed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "import", Some(report_json(&report)))
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

fn report_json(report: &ImportReport) -> serde_json::Value {
    json!({
        "sections": report.sections,
        "withheld": report.withheld,
        "message": report.message,
    })
}

fn format_report_text(report: &ImportReport) -> String {
    let mut out = String::from("status: ok\n");
    out.push_str("sections: ");
    out.push_str(&report.sections.join(", "));
    out.push('\n');
    if !report.withheld.is_empty() {
        out.push_str("kept stored secrets: ");
        out.push_str(&report.withheld.join(", "));
        out.push('\n');
    }
    if let Some(message) = report.message.as_deref() {
        out.push_str("message: ");
        out.push_str(message);
        out.push('\n');
    }
    out
}
