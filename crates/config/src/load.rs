//! Config loading helpers (env + file + overrides).
//!
//! The loader applies a deterministic merge order and surfaces user-facing
//! errors as typed `ErrorEnvelope`s.

use crate::env::{ConsoleEnv, apply_env_overrides};
use crate::schema::{ConsoleConfig, LogFormatSetting, LogLevelSetting, ValidatedConsoleConfig};
use config_console_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Load the console config from sources using a deterministic precedence order.
///
/// Precedence (highest wins):
/// - env overrides (`ConsoleEnv`)
/// - overrides JSON (partial config)
/// - config JSON (file content)
/// - defaults (`ConsoleConfig::default()`)
pub fn load_console_config_from_sources(
    config_json: Option<&str>,
    overrides_json: Option<&str>,
    env: &ConsoleEnv,
) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let config = match config_json {
        None => ConsoleConfig::default(),
        Some(input) => parse_config_unvalidated(input, ConfigFormat::Json)?,
    };
    finish_loading(config, overrides_json, env)
}

/// Load the console config from an optional file path.
pub fn load_console_config_from_path(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
    env: &ConsoleEnv,
) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let config = match config_path {
        None => ConsoleConfig::default(),
        Some(path) => {
            let format = detect_config_format(path)?;
            let config_text = read_config_file(path)?;
            parse_config_unvalidated(&config_text, format)?
        },
    };
    finish_loading(config, overrides_json, env)
}

/// Load the console config from std env and an optional file path.
pub fn load_console_config_std_env(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let env = ConsoleEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_console_config_from_path(config_path, overrides_json, &env)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &ConsoleConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &ConsoleConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

fn finish_loading(
    mut config: ConsoleConfig,
    overrides_json: Option<&str>,
    env: &ConsoleEnv,
) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    if let Some(input) = overrides_json {
        let overrides = parse_overrides_json(input)?;
        overrides.apply(&mut config);
    }

    // env is applied last and also validates/normalizes the resulting config.
    apply_env_overrides(config, env)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<ConsoleConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn parse_overrides_json(input: &str) -> Result<ConsoleConfigOverrides, ErrorEnvelope> {
    serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid overrides JSON: {error}"),
        )
        .with_metadata("source", "overrides")
    })
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct ConsoleConfigOverrides {
    version: Option<u32>,
    api: ApiConfigOverrides,
    ui: UiConfigOverrides,
    log: LogConfigOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct ApiConfigOverrides {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct UiConfigOverrides {
    toast_ttl_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct LogConfigOverrides {
    level: Option<LogLevelSetting>,
    format: Option<LogFormatSetting>,
}

impl ConsoleConfigOverrides {
    fn apply(self, config: &mut ConsoleConfig) {
        if let Some(version) = self.version {
            config.version = version;
        }
        if let Some(base_url) = self.api.base_url {
            config.api.base_url = base_url;
        }
        if let Some(timeout_ms) = self.api.timeout_ms {
            config.api.timeout_ms = timeout_ms;
        }
        if let Some(toast_ttl_ms) = self.ui.toast_ttl_ms {
            config.ui.toast_ttl_ms = toast_ttl_ms;
        }
        if let Some(level) = self.log.level {
            config.log.level = level;
        }
        if let Some(format) = self.log.format {
            config.log.format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DEFAULT_API_BASE_URL;

    #[test]
    fn defaults_when_no_sources() {
        let config = load_console_config_from_sources(None, None, &ConsoleEnv::default());
        assert!(matches!(config, Ok(ref config) if config.api.base_url == DEFAULT_API_BASE_URL));
    }

    #[test]
    fn precedence_is_defaults_file_overrides_env() {
        let file = r#"{"api": {"baseUrl": "http://file.example.test", "timeoutMs": 1000}, "ui": {"toastTtlMs": 500}}"#;
        let overrides = r#"{"api": {"timeoutMs": 2000}}"#;
        let env = ConsoleEnv {
            api_base_url: Some("http://env.example.test".into()),
            ..ConsoleEnv::default()
        };

        let config = load_console_config_from_sources(Some(file), Some(overrides), &env);
        assert!(config.is_ok());
        let Ok(config) = config else { return };
        assert_eq!(config.api.base_url, "http://env.example.test");
        assert_eq!(config.api.timeout_ms, 2_000);
        assert_eq!(config.ui.toast_ttl_ms, 500);
        assert_eq!(config.log.level, LogLevelSetting::Info);
    }

    #[test]
    fn overrides_reject_unknown_fields() {
        let error =
            load_console_config_from_sources(None, Some(r#"{"api": {"retry": 1}}"#), &ConsoleEnv::default())
                .err();
        assert!(matches!(
            error,
            Some(ref error) if error.metadata_value("source") == Some("overrides")
        ));
    }

    #[test]
    fn unsupported_extension_is_rejected_before_reading() {
        let error = load_console_config_from_path(
            Some(Path::new("/nonexistent/console.yaml")),
            None,
            &ConsoleEnv::default(),
        )
        .err();
        assert!(matches!(
            error,
            Some(ref error) if error.code == ErrorCode::new("config", "unsupported_format")
        ));
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let error = load_console_config_from_path(
            Some(Path::new("/nonexistent/console.toml")),
            None,
            &ConsoleEnv::default(),
        )
        .err();
        assert!(matches!(
            error,
            Some(ref error) if error.code == ErrorCode::new("config", "config_file_not_found")
        ));
    }

    #[test]
    fn pretty_outputs_end_with_newline() {
        let config = ConsoleConfig::default();
        assert!(matches!(to_pretty_json(&config), Ok(ref text) if text.ends_with("}\n")));
        assert!(matches!(
            to_pretty_toml(&config),
            Ok(ref text) if text.contains("baseUrl = \"http://127.0.0.1:8788\"")
        ));
    }
}
