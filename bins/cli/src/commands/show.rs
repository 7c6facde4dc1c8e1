//! Show command handler.

use crate::console::{ConsoleArgs, block_on, drain_toasts, load_section, open_editor};
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, log_info, to_pretty_json_line};
use config_console_shared::RequestContext;
use serde_json::{Map, Value, json};

/// Run the show command.
pub fn run_show(
    mode: OutputMode,
    console: ConsoleArgs<'_>,
    section: &str,
) -> Result<CliOutput, CliError> {
    let mut editor = match open_editor(console, mode) {
        Ok(editor) => editor,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let ctx = RequestContext::new_operation();
    let section = match block_on(load_section(&mut editor, &ctx, section))? {
        Ok(section) => section,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let mut stderr = String::new();
    drain_toasts(&mut editor, &mut stderr, mode.no_progress);
    log_info(&mut stderr, "show completed", mode.no_progress);

    let values = editor
        .session()
        .masked_config()
        .section(&section)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary(
            "ok",
            "show",
            Some(json!({ "section": section.as_str(), "values": values })),
        )
    } else if mode.is_json() {
        to_pretty_json_line(&json!({
            "status": "ok",
            "section": section.as_str(),
            "values": values,
        }))?
    } else {
        let yaml = serde_yaml_ng::to_string(&values)?;
        let mut out = format!("status: ok\nsection: {section}\nvalues:\n");
        for line in yaml.lines() {
            out.push_str("  ");
            out.push_str(line);
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
