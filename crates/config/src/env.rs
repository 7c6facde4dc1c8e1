//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict: a variable that is present but empty or malformed
//! fails fast instead of being ignored.

use crate::schema::{ConsoleConfig, LogFormatSetting, LogLevelSetting, ValidatedConsoleConfig};
use config_console_shared::{ErrorCode, ErrorEnvelope, redact_if_secret};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Env var: config API base URL.
pub const ENV_API_BASE_URL: &str = "CCON_API_BASE_URL";
/// Env var: config API timeout in milliseconds.
pub const ENV_API_TIMEOUT_MS: &str = "CCON_API_TIMEOUT_MS";
/// Env var: toast lifetime in milliseconds.
pub const ENV_TOAST_TTL_MS: &str = "CCON_TOAST_TTL_MS";
/// Env var: minimum log level.
pub const ENV_LOG_LEVEL: &str = "CCON_LOG_LEVEL";
/// Env var: log output format.
pub const ENV_LOG_FORMAT: &str = "CCON_LOG_FORMAT";

const ALL_ENV_VARS: [&str; 5] = [
    ENV_API_BASE_URL,
    ENV_API_TIMEOUT_MS,
    ENV_TOAST_TTL_MS,
    ENV_LOG_LEVEL,
    ENV_LOG_FORMAT,
];

/// Parsed env overrides. `None` means the variable was not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleEnv {
    /// Override for `api.baseUrl`.
    pub api_base_url: Option<Box<str>>,
    /// Override for `api.timeoutMs`.
    pub api_timeout_ms: Option<u64>,
    /// Override for `ui.toastTtlMs`.
    pub toast_ttl_ms: Option<u64>,
    /// Override for `log.level`.
    pub log_level: Option<LogLevelSetting>,
    /// Override for `log.format`.
    pub log_format: Option<LogFormatSetting>,
}

impl ConsoleEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            api_base_url: parse_optional_url_string(map, ENV_API_BASE_URL)?,
            api_timeout_ms: parse_optional_u64(map, ENV_API_TIMEOUT_MS)?,
            toast_ttl_ms: parse_optional_u64(map, ENV_TOAST_TTL_MS)?,
            log_level: parse_optional_enum(map, ENV_LOG_LEVEL, LogLevelSetting::parse)?,
            log_format: parse_optional_enum(map, ENV_LOG_FORMAT, LogFormatSetting::parse)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let map: BTreeMap<String, String> = ALL_ENV_VARS
            .iter()
            .filter_map(|name| {
                std::env::var(name)
                    .ok()
                    .map(|value| ((*name).to_string(), value))
            })
            .collect();

        Self::from_map(&map)
    }

    /// Returns true when no variable was set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.api_base_url.is_none()
            && self.api_timeout_ms.is_none()
            && self.toast_ttl_ms.is_none()
            && self.log_level.is_none()
            && self.log_format.is_none()
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: ConsoleConfig,
    env: &ConsoleEnv,
) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(base_url) = env.api_base_url.as_deref() {
        base_url.clone_into(&mut config.api.base_url);
    }
    if let Some(timeout_ms) = env.api_timeout_ms {
        config.api.timeout_ms = timeout_ms;
    }
    if let Some(toast_ttl_ms) = env.toast_ttl_ms {
        config.ui.toast_ttl_ms = toast_ttl_ms;
    }
    if let Some(level) = env.log_level {
        config.log.level = level;
    }
    if let Some(format) = env.log_format {
        config.log.format = format;
    }

    config.validate_and_normalize().map_err(Into::into)
}

fn parse_optional_trimmed<'a>(
    map: &'a BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<&'a str>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    Ok(Some(trimmed))
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    let Some(trimmed) = parse_optional_trimmed(map, var)? else {
        return Ok(None);
    };
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: trimmed.to_owned(),
        })
}

fn parse_optional_url_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(trimmed) = parse_optional_trimmed(map, var)? else {
        return Ok(None);
    };
    let invalid = || EnvParseError::InvalidUrl {
        var,
        value: trimmed.to_owned(),
    };
    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(invalid());
    }
    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_enum<T>(
    map: &BTreeMap<String, String>,
    var: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, EnvParseError> {
    let Some(trimmed) = parse_optional_trimmed(map, var)? else {
        return Ok(None);
    };
    parse(trimmed)
        .map(Some)
        .ok_or_else(|| EnvParseError::InvalidEnum {
            var,
            value: trimmed.to_owned(),
        })
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// URL env var had an invalid value.
    InvalidUrl {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    /// Name of the offending variable.
    #[must_use]
    pub const fn var(&self) -> &'static str {
        match self {
            Self::EmptyValue { var }
            | Self::InvalidInt { var, .. }
            | Self::InvalidUrl { var, .. }
            | Self::InvalidEnum { var, .. } => var,
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidInt { var, .. } => {
                write!(formatter, "{var} must be a non-negative integer")
            },
            Self::InvalidUrl { var, .. } => write!(formatter, "{var} must be an http(s) URL"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let envelope = Self::expected(ErrorCode::new("config", "invalid_env"), error.to_string())
            .with_metadata("env_var", error.var());

        match error {
            EnvParseError::EmptyValue { .. } => envelope,
            EnvParseError::InvalidInt { var, value }
            | EnvParseError::InvalidUrl { var, value }
            | EnvParseError::InvalidEnum { var, value } => {
                envelope.with_metadata("value", redact_if_secret(var, &value))
            },
        }
    }
}
