//! Client config command handlers.

use crate::console::{ConsoleArgs, load_config};
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, log_info, to_pretty_json_line};
use config_console_config::{console_config_schema, to_pretty_json, to_pretty_toml};
use serde_json::json;

/// Show the effective client config after defaults, file, env, and flags.
pub fn run_config_show(mode: OutputMode, console: ConsoleArgs<'_>) -> Result<CliOutput, CliError> {
    let config = match load_config(console) {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config show completed", mode.no_progress);

    let rendered = if mode.is_json() || mode.is_ndjson() {
        to_pretty_json(config.as_ref())
    } else {
        to_pretty_toml(config.as_ref())
    };
    let rendered = match rendered {
        Ok(rendered) => rendered,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let stdout = if mode.is_ndjson() {
        let effective: serde_json::Value = serde_json::from_str(rendered.trim())?;
        format_ndjson_summary("ok", "config", Some(json!({ "effectiveConfig": effective })))
    } else if mode.is_json() {
        let effective: serde_json::Value = serde_json::from_str(rendered.trim())?;
        to_pretty_json_line(&json!({
            "status": "ok",
            "configPath": config_path_text(console),
            "effectiveConfig": effective,
        }))?
    } else {
        let mut out = String::from("status: ok\nconfig:\n");
        out.push_str(&rendered);
        if !out.ends_with('\n') {
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

/// Print the JSON Schema of the client config file.
pub fn run_config_schema(mode: OutputMode) -> Result<CliOutput, CliError> {
    let schema = serde_json::to_value(console_config_schema())?;

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "config_schema", Some(json!({ "schema": schema })))
    } else {
        to_pretty_json_line(&schema)?
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

/// Validate config loading and overrides.
pub fn run_config_validate(
    mode: OutputMode,
    console: ConsoleArgs<'_>,
) -> Result<CliOutput, CliError> {
    if let Err(error) = load_config(console) {
        return Ok(format_error_output(mode, &error));
    }

    let mut stderr = String::new();
    log_info(&mut stderr, "config validate completed", mode.no_progress);

    let path = config_path_text(console);
    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "config", Some(json!({ "configPath": path })))
    } else if mode.is_json() {
        to_pretty_json_line(&json!({
            "status": "ok",
            "configPath": path,
        }))?
    } else {
        path.map_or_else(
            || "status: ok\nconfig: ok\n".to_string(),
            |path| format!("status: ok\nconfig: ok\npath: {path}\n"),
        )
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn config_path_text(console: ConsoleArgs<'_>) -> Option<String> {
    console
        .config_path
        .map(|path| path.to_string_lossy().to_string())
}
