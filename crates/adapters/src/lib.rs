//! # config-console-adapters
//!
//! Adapter implementations for ports: the HTTP config API client and the
//! structured logger.
//! This crate depends on `ports`, `shared`, and `config`.

pub mod config_api_http;
pub mod log_sink;
pub mod logger;

pub use config_api_http::{ConfigApiHttp, ConfigApiHttpConfig};
pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::{JsonLogger, LineFormat, level_from_setting};

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
