//! Wiring shared by the commands that talk to the config API.

use crate::error::CliError;
use crate::format::OutputMode;
use config_console_adapters::{ConfigApiHttp, ConfigApiHttpConfig, JsonLogger, StderrLogSink};
use config_console_app::{ConfigEditor, ConfigEditorDeps};
use config_console_config::{LogLevelSetting, ValidatedConsoleConfig, load_console_config_std_env};
use config_console_ports::LoggerPort;
use config_console_domain::SectionName;
use config_console_shared::{ErrorCode, ErrorEnvelope, RequestContext};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Global flags that select the client config.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleArgs<'a> {
    /// Config file (JSON/TOML).
    pub config_path: Option<&'a Path>,
    /// Base URL override; wins over the file and `CCON_API_BASE_URL`.
    pub base_url: Option<&'a str>,
}

/// Load and validate the effective client config.
pub fn load_config(args: ConsoleArgs<'_>) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let loaded = load_console_config_std_env(args.config_path, None)?;
    let Some(base_url) = args.base_url else {
        return Ok(loaded);
    };

    let mut config = loaded.into_inner();
    config.api.base_url = base_url.to_owned();
    config.validate_and_normalize().map_err(ErrorEnvelope::from)
}

/// Build an editor over the HTTP client, with structured logs on stderr
/// unless progress output is suppressed.
pub fn open_editor(args: ConsoleArgs<'_>, mode: OutputMode) -> Result<ConfigEditor, ErrorEnvelope> {
    let config = load_config(args)?;
    init_tracing(config.log.level, mode.no_progress);

    let api = ConfigApiHttp::new(&ConfigApiHttpConfig::from_api_config(&config.api))?;
    let logger: Option<Arc<dyn LoggerPort>> = if mode.no_progress {
        None
    } else {
        Some(Arc::new(JsonLogger::from_log_config(
            Arc::new(StderrLogSink),
            &config.log,
        )))
    };

    Ok(ConfigEditor::new(ConfigEditorDeps {
        api: Arc::new(api),
        logger,
    })
    .with_toast_ttl(Duration::from_millis(config.ui.toast_ttl_ms)))
}

/// Load the config and make `section` the active section.
pub async fn load_section(
    editor: &mut ConfigEditor,
    ctx: &RequestContext,
    section: &str,
) -> Result<SectionName, ErrorEnvelope> {
    editor.load(ctx).await?;
    editor.select_section(section)?;
    editor.session().active_section().cloned().ok_or_else(|| {
        ErrorEnvelope::invariant(ErrorCode::internal(), "selected section is not active")
    })
}

/// Drive one future to completion on a current-thread runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output, CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Move queued toasts into the progress stream, oldest first.
pub fn drain_toasts(editor: &mut ConfigEditor, stderr: &mut String, no_progress: bool) {
    for toast in editor.status_mut().drain_toasts() {
        if no_progress {
            continue;
        }
        stderr.push_str(toast.level.as_str());
        stderr.push_str(": ");
        stderr.push_str(&toast.text);
        stderr.push('\n');
    }
}

/// Install the stderr `tracing` subscriber. `RUST_LOG` wins over the
/// configured level; a second call is a no-op.
fn init_tracing(level: LogLevelSetting, no_progress: bool) {
    let default_level = if no_progress { "error" } else { level.as_str() };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_flag_overrides_loaded_config() {
        let config = load_config(ConsoleArgs {
            config_path: None,
            base_url: Some("http://10.0.0.5:9000"),
        });
        assert!(matches!(config, Ok(ref config) if config.api.base_url.starts_with("http://10.0.0.5:9000")));
    }

    #[test]
    fn invalid_base_url_flag_is_rejected() {
        let config = load_config(ConsoleArgs {
            config_path: None,
            base_url: Some("ftp://example.invalid"),
        });
        assert!(config.is_err());
    }
}
