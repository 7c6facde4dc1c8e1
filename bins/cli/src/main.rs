//! CLI binary entrypoint.

mod commands;
mod console;
mod error;
mod format;

use clap::{Parser, Subcommand};
use commands::{
    SaveSource, run_config_schema, run_config_show, run_config_validate, run_export, run_fields,
    run_import, run_info, run_save, run_sections, run_show, run_test,
};
use config_console_shared::{ErrorEnvelope, is_secret_key};
use console::ConsoleArgs;
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "ccon",
    version,
    about = "Schema-driven config console",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    /// Client config file (JSON/TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Config API base URL; overrides the config file and env.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List config sections in schema order.
    Sections,
    /// Show the stored values of a section (secrets masked).
    Show {
        /// Section name.
        section: String,
    },
    /// Describe the form fields of a section.
    Fields {
        /// Section name.
        section: String,
    },
    /// Save one section from field assignments or raw JSON.
    Save {
        /// Section name.
        section: String,
        /// Field assignment; repeatable. Blank or `****` keeps a stored secret.
        #[arg(long = "set", value_name = "KEY=VALUE", conflicts_with_all = ["json", "json_file"])]
        set: Vec<String>,
        /// Whole-section JSON object.
        #[arg(long, conflicts_with = "json_file")]
        json: Option<String>,
        /// File holding a whole-section JSON object.
        #[arg(long)]
        json_file: Option<PathBuf>,
    },
    /// Run the connectivity test for a section.
    Test {
        /// Section name.
        section: String,
    },
    /// Export the whole config with secrets masked.
    Export {
        /// Write the export text to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import a whole config document.
    Import {
        /// File holding the document (bare or `{"config": {...}}`).
        #[arg(long, conflicts_with = "json")]
        file: Option<PathBuf>,
        /// The document as inline JSON.
        #[arg(long)]
        json: Option<String>,
    },
    /// Client config commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Show build and version details.
    Info,
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Show the effective client config.
    Show,
    /// Print the JSON Schema of the client config.
    Schema,
    /// Validate config loading and overrides.
    Validate,
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);

    match run(&cli, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(cli: &Cli, mode: OutputMode) -> Result<CliOutput, CliError> {
    let console = ConsoleArgs {
        config_path: cli.config.as_deref(),
        base_url: cli.base_url.as_deref(),
    };

    match &cli.command {
        Commands::Sections => run_sections(mode, console),
        Commands::Show { section } => run_show(mode, console, section),
        Commands::Fields { section } => run_fields(mode, console, section),
        Commands::Save {
            section,
            set,
            json,
            json_file,
        } => {
            let source = resolve_save_source(set, json.as_deref(), json_file.as_deref())?;
            run_save(mode, console, section, &source)
        },
        Commands::Test { section } => run_test(mode, console, section),
        Commands::Export { out } => run_export(mode, console, out.as_deref()),
        Commands::Import { file, json } => {
            let text = resolve_import_text(file.as_deref(), json.as_deref())?;
            run_import(mode, console, &text)
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => run_config_show(mode, console),
            ConfigCommands::Schema => run_config_schema(mode),
            ConfigCommands::Validate => run_config_validate(mode, console),
        },
        Commands::Info => run_info(mode),
    }
}

fn resolve_save_source(
    assignments: &[String],
    json: Option<&str>,
    json_file: Option<&Path>,
) -> Result<SaveSource, CliError> {
    if let Some(text) = json {
        return Ok(SaveSource::Json(text.to_owned()));
    }
    if let Some(path) = json_file {
        return read_input_file(path).map(SaveSource::Json);
    }
    if assignments.is_empty() {
        return Err(CliError::InvalidInput(
            "save needs --set KEY=VALUE or --json/--json-file".to_owned(),
        ));
    }
    parse_assignments(assignments).map(SaveSource::Fields)
}

fn parse_assignments(assignments: &[String]) -> Result<Vec<(String, String)>, CliError> {
    assignments
        .iter()
        .map(|assignment| {
            let (key, value) = assignment.split_once('=').ok_or_else(|| {
                CliError::InvalidInput(format!("expected KEY=VALUE, got `{assignment}`"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::InvalidInput(format!(
                    "missing field key in `{assignment}`"
                )));
            }
            Ok((key.to_owned(), value.to_owned()))
        })
        .collect()
}

fn resolve_import_text(file: Option<&Path>, json: Option<&str>) -> Result<String, CliError> {
    match (file, json) {
        (_, Some(text)) => Ok(text.to_owned()),
        (Some(path), None) => read_input_file(path),
        (None, None) => Err(CliError::InvalidInput(
            "import needs --file or --json".to_owned(),
        )),
    }
}

fn read_input_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|error| {
        CliError::InvalidInput(format!("cannot read {}: {error}", path.display()))
    })
}

pub(crate) fn format_error_output(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    let error = sanitize_error(error);

    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        format_ndjson_error(&error)
    } else if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": error_payload(&error),
        });

        // This is a CLI boundary, so JSON serialization errors are internal.
        let mut output = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\",\"kind\":\"invariant\"}}".to_string()
        });
        output.push('\n');
        output
    } else {
        format_error_text(&error)
    };

    CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::for_error(&error),
    }
}

fn sanitize_error(error: &ErrorEnvelope) -> ErrorEnvelope {
    let mut error = error.clone();
    for (key, value) in &mut error.metadata {
        if is_secret_key(key) {
            *value = config_console_shared::REDACTED_VALUE.to_string();
        }
    }
    error
}

fn error_payload(error: &ErrorEnvelope) -> serde_json::Value {
    serde_json::json!({
        "code": error.code.to_string(),
        "message": error.message,
        "kind": error.kind.to_string(),
        "retriable": error.class.is_retriable(),
        "meta": error.metadata,
    })
}

fn format_error_text(error: &ErrorEnvelope) -> String {
    let mut out = String::new();
    out.push_str("status: error\n");
    out.push_str("code: ");
    out.push_str(&error.code.to_string());
    out.push('\n');
    out.push_str("message: ");
    out.push_str(&error.message);
    out.push('\n');
    out.push_str("kind: ");
    out.push_str(&error.kind.to_string());
    out.push('\n');

    if !error.metadata.is_empty() {
        out.push_str("meta:\n");
        for (key, value) in &error.metadata {
            out.push_str("  ");
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
    }

    out
}

pub(crate) fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

pub(crate) fn format_ndjson_summary(
    status: &str,
    kind: &str,
    extra: Option<serde_json::Value>,
) -> String {
    let mut payload = serde_json::Map::new();
    payload.insert(
        "type".to_string(),
        serde_json::Value::String("summary".to_string()),
    );
    payload.insert(
        "status".to_string(),
        serde_json::Value::String(status.to_string()),
    );
    payload.insert(
        "kind".to_string(),
        serde_json::Value::String(kind.to_string()),
    );
    if let Some(serde_json::Value::Object(map)) = extra {
        for (key, value) in map {
            payload.insert(key, value);
        }
    }
    let mut out = serde_json::to_string(&serde_json::Value::Object(payload)).unwrap_or_else(|_| {
        "{\"type\":\"summary\",\"status\":\"error\",\"kind\":\"internal\"}".to_string()
    });
    out.push('\n');
    out
}

pub(crate) fn to_pretty_json_line(value: &serde_json::Value) -> Result<String, CliError> {
    let mut output = serde_json::to_string_pretty(value)?;
    output.push('\n');
    Ok(output)
}

fn format_ndjson_error(error: &ErrorEnvelope) -> String {
    let payload = serde_json::json!({
        "type": "error",
        "status": "error",
        "error": error_payload(error),
    });
    let mut out = serde_json::to_string(&payload).unwrap_or_else(|_| {
        "{\"type\":\"error\",\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\",\"kind\":\"invariant\"}}".to_string()
    });
    out.push('\n');
    out
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}
