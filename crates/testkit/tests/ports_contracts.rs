//! Contract-style tests for port traits using in-memory adapters.

use config_console_domain::{SectionName, SectionPatch};
use config_console_ports::{ConfigApiPort, ConnectivityReport, LogLevel, LoggerPort, UpdateOutcome};
use config_console_shared::{ErrorEnvelope, MASK_SENTINEL, RequestContext, Result};
use config_console_testkit::fixtures::{backend_config, backend_schema};
use config_console_testkit::in_memory::{
    ApiCall, ApiOperation, InMemoryConfigApi, RecordingLogger, connection_failed,
};
use serde_json::{Map, Value, json};

fn section(name: &str) -> Result<SectionName> {
    SectionName::parse(name).map_err(ErrorEnvelope::from)
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn reads_are_masked_and_recorded() -> Result<()> {
    let ctx = RequestContext::new_operation();
    let api = InMemoryConfigApi::new(backend_schema(), backend_config());

    let schema = api.fetch_schema(&ctx).await?;
    assert_eq!(schema.section_names().len(), 4);

    let masked = api.fetch_config(&ctx, true).await?;
    assert_eq!(
        masked.field(&section("llm")?, "api_key"),
        Some(&json!(MASK_SENTINEL))
    );
    assert_eq!(masked.field(&section("embeddings")?, "api_key"), Some(&json!("")));

    let raw = api.fetch_config(&ctx, false).await?;
    assert_eq!(
        raw.field(&section("llm")?, "api_key"),
        Some(&json!("sk-llm-live-0001"))
    );

    assert_eq!(
        api.calls().await,
        vec![
            ApiCall::FetchSchema,
            ApiCall::FetchConfig { masked: true },
            ApiCall::FetchConfig { masked: false },
        ]
    );
    Ok(())
}

#[tokio::test]
async fn patches_merge_and_keep_withheld_secrets() -> Result<()> {
    let ctx = RequestContext::new_operation();
    let api = InMemoryConfigApi::new(backend_schema(), backend_config());

    let patch = SectionPatch::new(section("llm")?, object(json!({"timeout": 60})));
    let outcome = api.patch_section(&ctx, patch).await?;
    assert!(outcome.success);

    let stored = api.stored().await;
    assert_eq!(stored["llm"]["timeout"], json!(60));
    assert_eq!(stored["llm"]["api_key"], json!("sk-llm-live-0001"));
    assert_eq!(api.patches().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn rejected_updates_surface_as_server_rejection() -> Result<()> {
    let ctx = RequestContext::new_operation();
    let api = InMemoryConfigApi::new(backend_schema(), backend_config()).with_update_reply(
        UpdateOutcome {
            success: false,
            message: Some("port out of range".to_owned()),
        },
    );

    let patch = SectionPatch::new(section("gateway")?, object(json!({"port": 70000})));
    let error = api.patch_section(&ctx, patch).await.err();
    assert!(matches!(
        error,
        Some(ref error) if error.is_server_rejection() && error.message == "port out of range"
    ));
    assert_eq!(api.stored().await["gateway"]["port"], json!(8788));
    Ok(())
}

#[tokio::test]
async fn injected_failures_apply_until_cleared() -> Result<()> {
    let ctx = RequestContext::new_operation();
    let api = InMemoryConfigApi::new(backend_schema(), backend_config());

    api.fail(ApiOperation::FetchSchema, connection_failed()).await;
    assert!(api.fetch_schema(&ctx).await.is_err());
    api.clear_failure(ApiOperation::FetchSchema).await;
    assert!(api.fetch_schema(&ctx).await.is_ok());
    assert_eq!(api.call_count(ApiOperation::FetchSchema).await, 2);
    Ok(())
}

#[tokio::test]
async fn test_and_export_replies_are_configurable() -> Result<()> {
    let ctx = RequestContext::new_operation();
    let api = InMemoryConfigApi::new(backend_schema(), backend_config())
        .with_test_reply(ConnectivityReport {
            ok: false,
            status_code: None,
            message: Some("connection refused".to_owned()),
        })
        .with_export_payload(json!({"yaml": "llm: {}\n"}));

    let report = api.test_section(&ctx, &section("llm")?).await?;
    assert!(!report.ok);
    assert_eq!(api.export_config(&ctx).await?, json!({"yaml": "llm: {}\n"}));

    let missing = api.fetch_section(&ctx, &section("nope")?).await.err();
    assert!(matches!(missing, Some(ref error) if error.metadata_value("status") == Some("404")));
    Ok(())
}

#[test]
fn recording_logger_filters_by_level() {
    let logger = RecordingLogger::new();
    logger.debug("console.load.start", "loading", None);
    logger.warn("console.save.failed", "rejected", None);

    assert_eq!(
        logger.event_names(),
        vec!["console.load.start", "console.save.failed"]
    );
    assert_eq!(logger.at_least(LogLevel::Warn).len(), 1);
    assert!(logger.find("console.save.failed").is_some());
}
