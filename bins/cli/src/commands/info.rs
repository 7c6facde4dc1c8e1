//! Info command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use config_console_adapters::adapters_crate_version;
use config_console_app::app_crate_version;
use config_console_config::{DEFAULT_API_BASE_URL, config_crate_version};
use config_console_domain::domain_crate_version;
use config_console_ports::ports_crate_version;

struct BuildInfo {
    name: &'static str,
    version: &'static str,
    app: &'static str,
    domain: &'static str,
    ports: &'static str,
    adapters: &'static str,
    config: &'static str,
}

const fn build_info() -> BuildInfo {
    BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        app: app_crate_version(),
        domain: domain_crate_version(),
        ports: ports_crate_version(),
        adapters: adapters_crate_version(),
        config: config_crate_version(),
    }
}

/// Run the info command.
pub fn run_info(mode: OutputMode) -> Result<CliOutput, CliError> {
    let build = build_info();

    let stdout = if mode.is_ndjson() {
        format_info_ndjson(&build)?
    } else if mode.is_json() {
        format_info_json(&build)?
    } else {
        format_info_text(&build)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_info_text(build: &BuildInfo) -> String {
    format!(
        "status: ok\nname: {}\nversion: {}\napp: {}\ndomain: {}\nports: {}\nadapters: {}\nconfig: {}\ndefaultBaseUrl: {}\n",
        build.name,
        build.version,
        build.app,
        build.domain,
        build.ports,
        build.adapters,
        build.config,
        DEFAULT_API_BASE_URL,
    )
}

fn build_json(build: &BuildInfo) -> serde_json::Value {
    serde_json::json!({
        "name": build.name,
        "version": build.version,
        "appVersion": build.app,
        "domainVersion": build.domain,
        "portsVersion": build.ports,
        "adaptersVersion": build.adapters,
        "configVersion": build.config,
        "defaultBaseUrl": DEFAULT_API_BASE_URL,
    })
}

fn format_info_json(build: &BuildInfo) -> Result<String, CliError> {
    let payload = serde_json::json!({
        "status": "ok",
        "build": build_json(build),
    });
    let mut output = serde_json::to_string_pretty(&payload)?;
    output.push('\n');
    Ok(output)
}

fn format_info_ndjson(build: &BuildInfo) -> Result<String, CliError> {
    let payload = serde_json::json!({
        "type": "summary",
        "status": "ok",
        "kind": "info",
        "build": build_json(build),
    });
    let mut output = serde_json::to_string(&payload)?;
    output.push('\n');
    Ok(output)
}
