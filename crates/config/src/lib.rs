//! # config-console-config
//!
//! Client configuration for the console: where the config API lives, how long
//! requests and toasts last, and how logs are emitted.
//! This crate depends on `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use env::{
    ConsoleEnv, ENV_API_BASE_URL, ENV_API_TIMEOUT_MS, ENV_LOG_FORMAT, ENV_LOG_LEVEL,
    ENV_TOAST_TTL_MS, EnvParseError, apply_env_overrides,
};
pub use load::{
    load_console_config_from_path, load_console_config_from_sources, load_console_config_std_env,
    to_pretty_json, to_pretty_toml,
};
pub use schema::{
    ApiConfig, CURRENT_CONFIG_VERSION, ConfigSchemaError, ConsoleConfig, DEFAULT_API_BASE_URL,
    DEFAULT_API_TIMEOUT_MS, DEFAULT_TOAST_TTL_MS, LogConfig, LogFormatSetting, LogLevelSetting,
    UiConfig, ValidatedConsoleConfig, console_config_schema, parse_console_config_json,
    parse_console_config_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
