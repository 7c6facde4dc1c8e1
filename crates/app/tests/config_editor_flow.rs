//! Editor flows against the in-memory config API.

use config_console_app::{ConfigEditor, ConfigEditorDeps, EditMode, LoadPhase, StatusLevel};
use config_console_domain::{SectionName, WidgetValue};
use config_console_ports::{ConnectivityReport, LogLevel, UpdateOutcome};
use config_console_shared::{ErrorCode, MASK_SENTINEL, RequestContext, Result};
use config_console_testkit::fixtures::{backend_config, backend_schema};
use config_console_testkit::in_memory::{
    ApiCall, ApiOperation, InMemoryConfigApi, RecordingLogger, connection_failed,
};
use serde_json::{Value, json};
use std::sync::Arc;

fn editor_with(api: &Arc<InMemoryConfigApi>, logger: &RecordingLogger) -> ConfigEditor {
    ConfigEditor::new(ConfigEditorDeps {
        api: api.clone(),
        logger: Some(Arc::new(logger.clone())),
    })
}

fn default_api() -> Arc<InMemoryConfigApi> {
    Arc::new(InMemoryConfigApi::new(backend_schema(), backend_config()))
}

fn section(name: &str) -> SectionName {
    SectionName::parse(name).unwrap_or_else(|_| unreachable!("valid section name"))
}

async fn loaded(api: &Arc<InMemoryConfigApi>) -> Result<(ConfigEditor, RecordingLogger)> {
    let logger = RecordingLogger::new();
    let mut editor = editor_with(api, &logger);
    editor.load(&RequestContext::new_operation()).await?;
    Ok((editor, logger))
}

fn masked_value(editor: &ConfigEditor, section_name: &str, key: &str) -> Option<Value> {
    editor
        .session()
        .masked_config()
        .field(&section(section_name), key)
        .cloned()
}

#[tokio::test]
async fn load_builds_navigation_and_selects_first_section() -> Result<()> {
    let api = default_api();
    let (editor, logger) = loaded(&api).await?;
    let session = editor.session();

    assert_eq!(session.phase(), LoadPhase::Loaded);
    let names: Vec<&str> = session.navigation().iter().map(SectionName::as_str).collect();
    assert_eq!(names, vec!["llm", "embeddings", "gateway", "security"]);
    assert_eq!(session.active_section(), Some(&section("llm")));
    assert_eq!(session.edit_mode(), EditMode::Form);

    let form = session.form();
    assert!(form.is_some());
    let Some(form) = form else { return Ok(()) };
    let api_key = form.field("api_key");
    assert!(matches!(api_key, Some((field, widget)) if field.is_secret && *widget == WidgetValue::text("")));
    assert!(session.advanced_buffer().contains(MASK_SENTINEL));

    assert_eq!(editor.status().current().level, StatusLevel::Ok);
    assert_eq!(
        api.calls().await,
        vec![ApiCall::FetchSchema, ApiCall::FetchConfig { masked: true }]
    );
    assert!(logger.find("console.load.completed").is_some());
    Ok(())
}

#[tokio::test]
async fn failed_first_load_stays_unloaded() -> Result<()> {
    let api = default_api();
    api.fail(ApiOperation::FetchConfig, connection_failed()).await;
    let logger = RecordingLogger::new();
    let mut editor = editor_with(&api, &logger);

    let error = editor.load(&RequestContext::new_operation()).await.err();
    assert!(matches!(error, Some(ref error) if error.code == ErrorCode::load_failed()));
    assert_eq!(editor.session().phase(), LoadPhase::Unloaded);
    assert!(editor.session().schema().is_none());
    assert!(editor.session().navigation().is_empty());
    assert_eq!(editor.status().current().level, StatusLevel::Error);
    assert!(!logger.at_least(LogLevel::Warn).is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_reload_keeps_previous_snapshot() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;
    editor.select_section("gateway")?;

    api.fail(ApiOperation::FetchSchema, connection_failed()).await;
    assert!(editor.load(&RequestContext::new_operation()).await.is_err());

    let session = editor.session();
    assert_eq!(session.phase(), LoadPhase::Loaded);
    assert_eq!(session.active_section(), Some(&section("gateway")));
    assert_eq!(session.navigation().len(), 4);
    Ok(())
}

#[tokio::test]
async fn select_is_noop_until_loaded_and_rejects_unknown_sections() -> Result<()> {
    let api = default_api();
    let mut editor = editor_with(&api, &RecordingLogger::new());
    assert!(!editor.select_section("llm")?);
    assert!(editor.session().active_section().is_none());

    editor.load(&RequestContext::new_operation()).await?;
    assert!(editor.select_section("security")?);
    let error = editor.select_section("memory").err();
    assert!(matches!(
        error,
        Some(ref error) if error.code == ErrorCode::new("console", "unknown_section")
    ));
    assert_eq!(editor.session().active_section(), Some(&section("security")));
    Ok(())
}

#[tokio::test]
async fn unchanged_form_save_omits_masked_secret_and_refetches() -> Result<()> {
    let api = default_api();
    let (mut editor, logger) = loaded(&api).await?;
    let ctx = RequestContext::new_operation();

    let report = editor.save(&ctx).await?;
    assert!(report.refreshed);
    assert!(!report.patch.contains_key("api_key"));
    assert_eq!(
        report.patch.clone().into_body(),
        json!({
            "base_url": "https://generativelanguage.example/v1beta",
            "model": "gemini-2.0-flash",
            "timeout": 30,
            "max_tokens": 8192,
        })
    );

    let calls = api.calls().await;
    assert!(matches!(
        calls.as_slice(),
        [.., ApiCall::PatchSection(_), ApiCall::FetchConfig { masked: true }]
    ));
    assert_eq!(api.stored().await["llm"]["api_key"], json!("sk-llm-live-0001"));
    assert_eq!(editor.status().current().level, StatusLevel::Ok);
    assert!(logger.find("console.save.completed").is_some());
    Ok(())
}

#[tokio::test]
async fn cleared_numeric_field_saves_null() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;
    editor.set_widget("timeout", WidgetValue::text(""))?;

    let report = editor.save(&RequestContext::new_operation()).await?;
    assert_eq!(report.patch.body().get("timeout"), Some(&Value::Null));
    assert_eq!(masked_value(&editor, "llm", "timeout"), Some(Value::Null));
    Ok(())
}

#[tokio::test]
async fn new_secret_is_submitted_and_comes_back_masked() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;
    editor.select_section("embeddings")?;
    editor.set_widget("api_key", WidgetValue::text("sk-embed-new"))?;

    let report = editor.save(&RequestContext::new_operation()).await?;
    assert_eq!(report.patch.body().get("api_key"), Some(&json!("sk-embed-new")));
    assert_eq!(api.stored().await["embeddings"]["api_key"], json!("sk-embed-new"));
    assert_eq!(
        masked_value(&editor, "embeddings", "api_key"),
        Some(json!(MASK_SENTINEL))
    );

    let widget = editor
        .session()
        .form()
        .and_then(|form| form.field("api_key"))
        .map(|(_, widget)| widget.clone());
    assert_eq!(widget, Some(WidgetValue::text("")));
    Ok(())
}

#[tokio::test]
async fn malformed_array_aborts_save_without_request() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;
    editor.select_section("gateway")?;
    editor.set_widget("cors_origins", WidgetValue::text("not json"))?;

    let error = editor.save(&RequestContext::new_operation()).await.err();
    assert!(matches!(
        error,
        Some(ref error) if error.code == ErrorCode::new("form", "invalid_json")
            && error.metadata_value("field") == Some("gateway.cors_origins")
    ));
    assert_eq!(api.call_count(ApiOperation::PatchSection).await, 0);
    assert_eq!(editor.status().current().level, StatusLevel::Error);
    Ok(())
}

#[tokio::test]
async fn invalid_advanced_buffer_aborts_without_patch() -> Result<()> {
    let api = default_api();
    let (mut editor, logger) = loaded(&api).await?;
    let before = editor.session().masked_config().clone();

    assert_eq!(editor.toggle_mode()?, EditMode::Advanced);
    editor.set_advanced_buffer("{invalid")?;
    let error = editor.save(&RequestContext::new_operation()).await.err();

    assert!(matches!(error, Some(ref error) if error.is_parse_failure()));
    assert_eq!(api.call_count(ApiOperation::PatchSection).await, 0);
    assert_eq!(editor.session().masked_config(), &before);
    assert!(logger.find("console.save.failed").is_some());
    Ok(())
}

#[tokio::test]
async fn advanced_save_strips_sentinel_secret() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;
    editor.toggle_mode()?;
    editor.set_advanced_buffer(
        json!({"api_key": MASK_SENTINEL, "model": "gemini-2.0-pro", "timeout": 45}).to_string(),
    )?;

    let report = editor.save(&RequestContext::new_operation()).await?;
    assert_eq!(
        report.patch.into_body(),
        json!({"model": "gemini-2.0-pro", "timeout": 45})
    );
    assert_eq!(api.stored().await["llm"]["api_key"], json!("sk-llm-live-0001"));
    assert_eq!(editor.session().edit_mode(), EditMode::Advanced);
    assert!(editor.session().advanced_buffer().contains("gemini-2.0-pro"));
    Ok(())
}

#[tokio::test]
async fn empty_advanced_buffer_submits_empty_object() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;
    editor.toggle_mode()?;
    editor.set_advanced_buffer("   ")?;

    let report = editor.save(&RequestContext::new_operation()).await?;
    assert!(report.patch.is_empty());
    Ok(())
}

#[tokio::test]
async fn switching_modes_discards_unsaved_edits() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;

    // Form edits are lost when moving to advanced mode.
    editor.set_widget("model", WidgetValue::text("edited-in-form"))?;
    assert_eq!(editor.toggle_mode()?, EditMode::Advanced);
    assert!(!editor.session().advanced_buffer().contains("edited-in-form"));

    // Buffer edits are lost when moving back to form mode.
    editor.set_advanced_buffer(r#"{"model": "edited-in-buffer"}"#)?;
    assert_eq!(editor.toggle_mode()?, EditMode::Form);
    let model = editor
        .session()
        .form()
        .and_then(|form| form.field("model"))
        .map(|(_, widget)| widget.clone());
    assert_eq!(model, Some(WidgetValue::text("gemini-2.0-flash")));
    assert!(editor.session().advanced_buffer().contains("gemini-2.0-flash"));

    let report = editor.save(&RequestContext::new_operation()).await?;
    assert_eq!(report.patch.body().get("model"), Some(&json!("gemini-2.0-flash")));
    Ok(())
}

#[tokio::test]
async fn server_rejection_is_surfaced_and_state_unchanged() -> Result<()> {
    let api = Arc::new(
        InMemoryConfigApi::new(backend_schema(), backend_config()).with_update_reply(
            UpdateOutcome {
                success: false,
                message: Some("max_tokens must be positive".to_owned()),
            },
        ),
    );
    let (mut editor, _logger) = loaded(&api).await?;
    editor.set_widget("max_tokens", WidgetValue::text("-5"))?;
    let before = editor.session().masked_config().clone();

    let error = editor.save(&RequestContext::new_operation()).await.err();
    assert!(matches!(
        error,
        Some(ref error) if error.is_server_rejection()
            && error.message == "max_tokens must be positive"
            && error.metadata_value("section") == Some("llm")
    ));
    assert_eq!(editor.session().masked_config(), &before);
    assert_eq!(api.call_count(ApiOperation::FetchConfig).await, 1);

    let toasts = editor.status_mut().drain_toasts();
    assert!(
        toasts
            .iter()
            .any(|toast| toast.text == "save failed: max_tokens must be positive")
    );
    Ok(())
}

#[tokio::test]
async fn refetch_failure_after_save_is_a_warning() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;
    editor.select_section("gateway")?;
    editor.set_widget("port", WidgetValue::text("9000"))?;
    api.fail(ApiOperation::FetchConfig, connection_failed()).await;

    let report = editor.save(&RequestContext::new_operation()).await?;
    assert!(!report.refreshed);
    assert_eq!(api.stored().await["gateway"]["port"], json!(9000));
    assert_eq!(masked_value(&editor, "gateway", "port"), Some(json!(8788)));
    assert_eq!(editor.status().current().level, StatusLevel::Warning);
    Ok(())
}

#[tokio::test]
async fn refetch_failure_after_save_drops_submitted_secret() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;
    editor.select_section("embeddings")?;
    editor.set_widget("api_key", WidgetValue::text("sk-embed-new"))?;
    api.fail(ApiOperation::FetchConfig, connection_failed()).await;

    let report = editor.save(&RequestContext::new_operation()).await?;
    assert!(!report.refreshed);
    assert_eq!(api.stored().await["embeddings"]["api_key"], json!("sk-embed-new"));

    let widget = editor
        .session()
        .form()
        .and_then(|form| form.field("api_key"))
        .map(|(_, widget)| widget.clone());
    assert_eq!(widget, Some(WidgetValue::text("")));
    assert!(!editor.session().advanced_buffer().contains("sk-embed-new"));
    assert_eq!(editor.session().edit_mode(), EditMode::Form);
    Ok(())
}

#[tokio::test]
async fn refetch_failure_after_import_clears_advanced_buffer() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;
    editor.toggle_mode()?;
    editor.set_advanced_buffer(json!({"api_key": "sk-llm-typed"}).to_string())?;
    api.fail(ApiOperation::FetchConfig, connection_failed()).await;

    let raw = json!({"llm": {"model": "y", "api_key": "sk-llm-imported"}}).to_string();
    let report = editor.import(&RequestContext::new_operation(), &raw).await?;
    assert!(!report.refreshed);
    assert_eq!(editor.status().current().level, StatusLevel::Warning);

    let buffer = editor.session().advanced_buffer();
    assert!(!buffer.contains("sk-llm-typed"));
    assert!(!buffer.contains("sk-llm-imported"));
    assert_eq!(editor.session().edit_mode(), EditMode::Advanced);
    Ok(())
}

#[tokio::test]
async fn save_requires_loaded_session() {
    let api = default_api();
    let mut editor = editor_with(&api, &RecordingLogger::new());
    let error = editor.save(&RequestContext::new_operation()).await.err();
    assert!(matches!(
        error,
        Some(ref error) if error.code == ErrorCode::new("console", "not_loaded")
    ));
}

#[tokio::test]
async fn connectivity_test_reports_status() -> Result<()> {
    let api = Arc::new(
        InMemoryConfigApi::new(backend_schema(), backend_config()).with_test_reply(
            ConnectivityReport {
                ok: false,
                status_code: None,
                message: Some("connection refused".to_owned()),
            },
        ),
    );
    let (mut editor, _logger) = loaded(&api).await?;
    let before = editor.session().masked_config().clone();

    let report = editor
        .test_connection(&RequestContext::new_operation(), Some("embeddings"))
        .await?;
    assert!(!report.ok);
    assert_eq!(editor.status().current().level, StatusLevel::Warning);
    assert_eq!(
        editor.status().current().text,
        "`embeddings` unreachable: connection refused"
    );
    assert_eq!(editor.session().active_section(), Some(&section("llm")));
    assert_eq!(editor.session().masked_config(), &before);
    Ok(())
}

#[tokio::test]
async fn connectivity_test_defaults_to_active_section() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;
    editor
        .test_connection(&RequestContext::new_operation(), None)
        .await?;
    assert_eq!(editor.status().current().text, "`llm` reachable (HTTP 200)");
    assert_eq!(
        api.calls().await.last(),
        Some(&ApiCall::TestSection(section("llm")))
    );

    api.fail(ApiOperation::TestSection, connection_failed()).await;
    let error = editor
        .test_connection(&RequestContext::new_operation(), None)
        .await
        .err();
    assert!(matches!(error, Some(ref error) if error.metadata_value("section") == Some("llm")));
    assert_eq!(editor.status().current().level, StatusLevel::Error);
    Ok(())
}

#[tokio::test]
async fn import_unwraps_envelope_and_strips_secrets() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;
    let raw = json!({
        "config": {
            "llm": {"model": "x", "api_key": MASK_SENTINEL},
            "gateway": {"port": 9100},
        }
    })
    .to_string();

    let report = editor.import(&RequestContext::new_operation(), &raw).await?;
    assert_eq!(report.sections, vec!["llm", "gateway"]);
    assert_eq!(report.withheld, vec!["llm.api_key"]);
    assert!(report.refreshed);

    let submitted = api.calls().await.into_iter().find_map(|call| match call {
        ApiCall::ImportConfig(document) => Some(Value::Object(document)),
        _ => None,
    });
    assert_eq!(
        submitted,
        Some(json!({"llm": {"model": "x"}, "gateway": {"port": 9100}}))
    );
    assert_eq!(api.stored().await["llm"]["api_key"], json!("sk-llm-live-0001"));

    // The active section is re-rendered from the refreshed document.
    let model = editor
        .session()
        .form()
        .and_then(|form| form.field("model"))
        .map(|(_, widget)| widget.clone());
    assert_eq!(model, Some(WidgetValue::text("x")));
    Ok(())
}

#[tokio::test]
async fn import_parse_failure_and_rejection_leave_state() -> Result<()> {
    let api = Arc::new(
        InMemoryConfigApi::new(backend_schema(), backend_config()).with_update_reply(
            UpdateOutcome {
                success: false,
                message: None,
            },
        ),
    );
    let (mut editor, _logger) = loaded(&api).await?;
    let ctx = RequestContext::new_operation();
    let before = editor.session().masked_config().clone();

    let error = editor.import(&ctx, "{not json").await.err();
    assert!(matches!(error, Some(ref error) if error.is_parse_failure()));
    assert_eq!(api.call_count(ApiOperation::ImportConfig).await, 0);

    let error = editor.import(&ctx, r#"{"llm": {"model": "x"}}"#).await.err();
    assert!(matches!(
        error,
        Some(ref error) if error.is_server_rejection()
            && error.message == "update rejected by server"
    ));
    assert_eq!(editor.session().masked_config(), &before);
    Ok(())
}

#[tokio::test]
async fn export_then_import_keeps_masked_config() -> Result<()> {
    let api = default_api();
    let (mut editor, _logger) = loaded(&api).await?;
    let ctx = RequestContext::new_operation();
    let before = editor.session().masked_config().clone();

    let export = editor.export(&ctx).await?;
    editor.import(&ctx, &export.text).await?;

    assert_eq!(editor.session().masked_config(), &before);
    assert_eq!(api.stored().await, backend_config().as_object().cloned().unwrap_or_default());
    Ok(())
}

#[tokio::test]
async fn export_prefers_yaml_text() -> Result<()> {
    let api = Arc::new(
        InMemoryConfigApi::new(backend_schema(), backend_config())
            .with_export_payload(json!({"yaml": "gateway:\n  port: 8788\n"})),
    );
    let (mut editor, logger) = loaded(&api).await?;

    let export = editor.export(&RequestContext::new_operation()).await?;
    assert_eq!(export.text, "gateway:\n  port: 8788\n");
    assert!(logger.find("console.export.completed").is_some());
    Ok(())
}

#[tokio::test]
async fn secrets_never_reach_log_fields() -> Result<()> {
    let api = default_api();
    let (mut editor, logger) = loaded(&api).await?;
    editor.select_section("embeddings")?;
    editor.set_widget("api_key", WidgetValue::text("sk-should-not-log"))?;
    editor.save(&RequestContext::new_operation()).await?;

    let rendered = format!("{:?}", logger.events());
    assert!(!rendered.contains("sk-should-not-log"));
    assert!(
        logger
            .event_names()
            .iter()
            .any(|name| name == "console.save.start")
    );
    Ok(())
}
