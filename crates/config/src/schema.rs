//! Console configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML files).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization trims strings and strips a trailing `/` from the API base URL.

use config_console_shared::{ErrorCode, ErrorEnvelope};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Strip credentials from a URL before it is placed in an error message.
fn sanitize_url_for_error(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if (parsed.password().is_some() || !parsed.username().is_empty())
                && (parsed.set_username("").is_err() || parsed.set_password(None).is_err())
            {
                return "[invalid url: credentials]".to_string();
            }
            parsed.to_string()
        },
        Err(error) => format!("[invalid url: {error}]"),
    }
}

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Default config API base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8788";
/// Default request timeout (ms).
pub const DEFAULT_API_TIMEOUT_MS: u64 = 15_000;
/// Default toast lifetime (ms).
pub const DEFAULT_TOAST_TTL_MS: u64 = 2_800;

const API_TIMEOUT_MIN_MS: u64 = 1;
const API_TIMEOUT_MAX_MS: u64 = 600_000;
const TOAST_TTL_MIN_MS: u64 = 100;
const TOAST_TTL_MAX_MS: u64 = 60_000;

/// Top-level console configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ConsoleConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Config API client settings.
    pub api: ApiConfig,
    /// Status and toast presentation settings.
    pub ui: UiConfig,
    /// Logging settings.
    pub log: LogConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            api: ApiConfig::default(),
            ui: UiConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl ConsoleConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedConsoleConfig, ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }

        self.api.normalize();
        self.api.validate()?;
        self.ui.validate()?;
        Ok(ValidatedConsoleConfig { raw: self })
    }
}

/// Config wrapper proving validation ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConsoleConfig {
    raw: ConsoleConfig,
}

impl ValidatedConsoleConfig {
    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &ConsoleConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> ConsoleConfig {
        self.raw
    }
}

impl AsRef<ConsoleConfig> for ValidatedConsoleConfig {
    fn as_ref(&self) -> &ConsoleConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedConsoleConfig {
    type Target = ConsoleConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Config API client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ApiConfig {
    /// Base URL of the config API (scheme + host + optional prefix).
    pub base_url: String,
    /// Per-request timeout (ms).
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            timeout_ms: DEFAULT_API_TIMEOUT_MS,
        }
    }
}

impl ApiConfig {
    fn normalize(&mut self) {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        self.base_url = trimmed.to_owned();
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        let valid = Url::parse(&self.base_url)
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host());
        if !valid {
            return Err(ConfigSchemaError::InvalidUrl {
                section: "api",
                field: "baseUrl",
                url: sanitize_url_for_error(&self.base_url),
            });
        }
        check_range("api", "timeoutMs", self.timeout_ms, API_TIMEOUT_MIN_MS, API_TIMEOUT_MAX_MS)
    }
}

/// Status and toast presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UiConfig {
    /// How long a toast stays visible (ms).
    pub toast_ttl_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            toast_ttl_ms: DEFAULT_TOAST_TTL_MS,
        }
    }
}

impl UiConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        check_range("ui", "toastTtlMs", self.toast_ttl_ms, TOAST_TTL_MIN_MS, TOAST_TTL_MAX_MS)
    }
}

/// Minimum log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevelSetting {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational events and above.
    #[default]
    Info,
    /// Everything.
    Debug,
}

impl LogLevelSetting {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// Parse a level name (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevelSetting {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormatSetting {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Parse a format name (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LogConfig {
    /// Minimum level emitted.
    pub level: LogLevelSetting,
    /// Output format.
    pub format: LogFormatSetting,
}

/// Parse a console config from a JSON string, applying validation and normalization.
pub fn parse_console_config_json(input: &str) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let config: ConsoleConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a console config from a TOML string, applying validation and normalization.
pub fn parse_console_config_toml(input: &str) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let config: ConsoleConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// JSON Schema describing the console config file.
#[must_use]
pub fn console_config_schema() -> schemars::Schema {
    schemars::schema_for!(ConsoleConfig)
}

const fn check_range(
    section: &'static str,
    field: &'static str,
    value: u64,
    min: u64,
    max: u64,
) -> Result<(), ConfigSchemaError> {
    if value < min || value > max {
        return Err(ConfigSchemaError::OutOfRange {
            section,
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Validation failures for the console config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A numeric value is out of bounds.
    OutOfRange {
        /// Config section (e.g. `api`).
        section: &'static str,
        /// Field name in the config file (e.g. `timeoutMs`).
        field: &'static str,
        /// Value provided.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },
    /// A URL entry is invalid.
    InvalidUrl {
        /// Config section (e.g. `api`).
        section: &'static str,
        /// Field name in the config file (e.g. `baseUrl`).
        field: &'static str,
        /// Sanitized URL value.
        url: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::OutOfRange { .. } | Self::InvalidUrl { .. } => {
                ErrorCode::new("config", "invalid_value")
            },
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => write!(
                formatter,
                "unsupported config version: {found} (supported: {supported})"
            ),
            Self::OutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min}, {max}] (got {value})"
            ),
            Self::InvalidUrl { section, field, .. } => write!(
                formatter,
                "{section}.{field} must be an http(s) URL"
            ),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::OutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value", value.to_string())
                .with_metadata("min", min.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::InvalidUrl {
                section,
                field,
                url,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("url", url),
        }
    }
}
