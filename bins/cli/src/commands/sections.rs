//! Sections command handler.

use crate::console::{ConsoleArgs, block_on, drain_toasts, open_editor};
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, log_info, to_pretty_json_line};
use config_console_domain::section_label;
use config_console_shared::RequestContext;
use serde_json::{Value, json};

/// Run the sections command.
pub fn run_sections(mode: OutputMode, console: ConsoleArgs<'_>) -> Result<CliOutput, CliError> {
    let mut editor = match open_editor(console, mode) {
        Ok(editor) => editor,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let ctx = RequestContext::new_operation();
    if let Err(error) = block_on(editor.load(&ctx))? {
        return Ok(format_error_output(mode, &error));
    }

    let mut stderr = String::new();
    drain_toasts(&mut editor, &mut stderr, mode.no_progress);
    log_info(&mut stderr, "sections loaded", mode.no_progress);

    let sections: Vec<Value> = editor
        .session()
        .navigation()
        .iter()
        .map(|section| {
            json!({
                "name": section.as_str(),
                "label": section_label(section.as_str()),
            })
        })
        .collect();

    let stdout = if mode.is_ndjson() {
        let mut out = String::new();
        for section in &sections {
            let mut line = serde_json::to_string(&json!({
                "type": "section",
                "name": section["name"],
                "label": section["label"],
            }))?;
            line.push('\n');
            out.push_str(&line);
        }
        out.push_str(&format_ndjson_summary(
            "ok",
            "sections",
            Some(json!({ "count": sections.len() })),
        ));
        out
    } else if mode.is_json() {
        to_pretty_json_line(&json!({
            "status": "ok",
            "sections": sections,
        }))?
    } else {
        let mut out = String::from("status: ok\nsections:\n");
        for section in editor.session().navigation() {
            out.push_str("  ");
            out.push_str(section.as_str());
            let label = section_label(section.as_str());
            if label != section.as_str() {
                out.push_str(" (");
                out.push_str(label);
                out.push(')');
            }
            out.push('\n');
        }
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}
