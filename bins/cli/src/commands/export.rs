//! Export command handler.

use crate::console::{ConsoleArgs, block_on, drain_toasts, open_editor};
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, log_info, to_pretty_json_line};
use config_console_shared::RequestContext;
use serde_json::json;
use std::path::Path;

/// Run the export command.
///
/// Text mode prints the export as-is so it can be piped into a file and
/// imported later.
pub fn run_export(
    mode: OutputMode,
    console: ConsoleArgs<'_>,
    out: Option<&Path>,
) -> Result<CliOutput, CliError> {
    let mut editor = match open_editor(console, mode) {
        Ok(editor) => editor,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let ctx = RequestContext::new_operation();
    let exported = block_on(editor.export(&ctx))?;

    let mut stderr = String::new();
    drain_toasts(&mut editor, &mut stderr, mode.no_progress);
    let view = match exported {
        Ok(view) => view,
        Err(error) => {
            let mut output = format_error_output(mode, &error);
            output.stderr.insert_str(0, &stderr);
            return Ok(output);
        },
    };

    if let Some(path) = out {
        std::fs::write(path, view.text.as_bytes())?;
        log_info(
            &mut stderr,
            &format!("export written to {}", path.display()),
            mode.no_progress,
        );
    } else {
        log_info(&mut stderr, "export completed", mode.no_progress);
    }
    let written = out.map(|path| path.display().to_string());

    let stdout = if mode.is_ndjson() {
        let extra = if written.is_some() {
            json!({ "path": written })
        } else {
            json!({ "export": view.payload })
        };
        format_ndjson_summary("ok", "export", Some(extra))
    } else if mode.is_json() {
        let export = if written.is_some() {
            serde_json::Value::Null
        } else {
            view.payload
        };
        to_pretty_json_line(&json!({
            "status": "ok",
            "path": written,
            "export": export,
        }))?
    } else if let Some(path) = written {
        format!("status: ok\npath: {path}\n")
    } else {
        let mut text = view.text;
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}
