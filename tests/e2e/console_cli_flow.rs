//! End-to-end CLI flows: the `ccon` binary against a mock config API.

use config_console_testkit::fixtures::{backend_config_masked, backend_schema};
use serde_json::{Value, json};
use std::process::{Command, Output};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const SCOPED_ENV: [&str; 6] = [
    "CCON_API_BASE_URL",
    "CCON_API_TIMEOUT_MS",
    "CCON_TOAST_TTL_MS",
    "CCON_LOG_LEVEL",
    "CCON_LOG_FORMAT",
    "RUST_LOG",
];

fn ccon(base_url: &str, args: &[&str]) -> std::io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ccon"));
    for name in SCOPED_ENV {
        command.env_remove(name);
    }
    command
        .arg("--base-url")
        .arg(base_url)
        .args(args)
        .output()
}

fn stdout_json(output: &Output) -> Result<Value, serde_json::Error> {
    serde_json::from_slice(&output.stdout)
}

async fn mount_backend(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v2/config/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(backend_schema().root().clone()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/config"))
        .and(query_param("masked", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(backend_config_masked().into_value()))
        .mount(server)
        .await;
}

async fn patch_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.as_str() == "PATCH")
        .filter_map(|request| serde_json::from_slice(&request.body).ok())
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn sections_follow_schema_order() -> TestResult {
    let server = MockServer::start().await;
    mount_backend(&server).await;

    let output = ccon(&server.uri(), &["--output", "json", "--no-progress", "sections"])?;
    assert_eq!(output.status.code(), Some(0));

    let value = stdout_json(&output)?;
    let names: Vec<&str> = value["sections"]
        .as_array()
        .map(|sections| sections.iter().filter_map(|s| s["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["llm", "embeddings", "gateway", "security"]);
    assert_eq!(value["sections"][0]["label"], "LLM");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn show_never_prints_stored_secrets() -> TestResult {
    let server = MockServer::start().await;
    mount_backend(&server).await;

    let output = ccon(&server.uri(), &["--output", "json", "show", "llm"])?;
    assert_eq!(output.status.code(), Some(0));
    let value = stdout_json(&output)?;
    assert_eq!(value["values"]["api_key"], "****");
    assert_eq!(value["values"]["model"], "gemini-2.0-flash");

    let text = ccon(&server.uri(), &["show", "llm"])?;
    let combined = [text.stdout.as_slice(), text.stderr.as_slice()].concat();
    assert!(!String::from_utf8_lossy(&combined).contains("sk-llm-live-0001"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn fields_describe_hints_and_degraded_refs() -> TestResult {
    let server = MockServer::start().await;
    mount_backend(&server).await;

    let output = ccon(
        &server.uri(),
        &["--output", "json", "--no-progress", "fields", "security"],
    )?;
    assert_eq!(output.status.code(), Some(0));

    let value = stdout_json(&output)?;
    let fields = value["fields"].as_array().cloned().unwrap_or_default();
    let keys: Vec<&str> = fields.iter().filter_map(|f| f["key"].as_str()).collect();
    assert_eq!(keys, vec!["sandbox_enabled", "tool_policy", "audit"]);
    assert_eq!(fields[0]["hint"], "boolean");
    assert!(fields[2]["error"].is_string());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn form_save_omits_untouched_secret() -> TestResult {
    let server = MockServer::start().await;
    mount_backend(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/api/v2/config/llm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "llm updated"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = ccon(
        &server.uri(),
        &[
            "--output",
            "json",
            "save",
            "llm",
            "--set",
            "model=gemini-2.5-pro",
        ],
    )?;
    assert_eq!(output.status.code(), Some(0));

    let value = stdout_json(&output)?;
    assert_eq!(value["status"], "ok");
    assert_eq!(value["refreshed"], true);
    assert_eq!(value["message"], "llm updated");

    let bodies = patch_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["model"], "gemini-2.5-pro");
    assert_eq!(bodies[0]["max_tokens"], 8192);
    assert!(bodies[0].get("api_key").is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn json_save_strips_mask_sentinel() -> TestResult {
    let server = MockServer::start().await;
    mount_backend(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/api/v2/config/llm"))
        .and(body_json(json!({"model": "m"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let output = ccon(
        &server.uri(),
        &[
            "--no-progress",
            "save",
            "llm",
            "--json",
            r#"{"api_key": "****", "model": "m"}"#,
        ],
    )?;
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("  - model\n"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_number_exits_before_any_request() -> TestResult {
    let server = MockServer::start().await;
    mount_backend(&server).await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;

    let output = ccon(
        &server.uri(),
        &["--output", "json", "save", "gateway", "--set", "port=abc"],
    )?;
    assert_eq!(output.status.code(), Some(2));
    let value = stdout_json(&output)?;
    assert_eq!(value["error"]["code"], "form:invalid_number");
    assert_eq!(value["error"]["meta"]["field"], "gateway.port");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_json_save_is_a_parse_failure() -> TestResult {
    let server = MockServer::start().await;
    mount_backend(&server).await;

    let output = ccon(
        &server.uri(),
        &["--output", "json", "save", "gateway", "--json", "{invalid"],
    )?;
    assert_eq!(output.status.code(), Some(2));
    let value = stdout_json(&output)?;
    assert_eq!(value["error"]["code"], "console:parse_failed");
    assert!(patch_bodies(&server).await.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn server_rejection_exits_with_rejection_code() -> TestResult {
    let server = MockServer::start().await;
    mount_backend(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/api/v2/config/gateway"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["body", "port"], "msg": "value is not a valid integer"}]
        })))
        .mount(&server)
        .await;

    let output = ccon(
        &server.uri(),
        &["--output", "json", "save", "gateway", "--set", "port=9000"],
    )?;
    assert_eq!(output.status.code(), Some(3));
    let value = stdout_json(&output)?;
    assert_eq!(value["error"]["code"], "api:server_rejected");
    assert_eq!(value["error"]["meta"]["status"], "422");
    assert_eq!(value["error"]["meta"]["section"], "gateway");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_section_is_invalid_input() -> TestResult {
    let server = MockServer::start().await;
    mount_backend(&server).await;

    let output = ccon(&server.uri(), &["--output", "json", "show", "memory"])?;
    assert_eq!(output.status.code(), Some(2));
    let value = stdout_json(&output)?;
    assert_eq!(value["error"]["code"], "console:unknown_section");
    Ok(())
}

#[test]
fn unreachable_api_exits_with_transport_code() -> TestResult {
    let output = ccon(
        "http://127.0.0.1:9",
        &["--output", "json", "--no-progress", "sections"],
    )?;
    assert_eq!(output.status.code(), Some(4));
    let value = stdout_json(&output)?;
    assert_eq!(value["error"]["code"], "console:load_failed");
    assert_eq!(value["error"]["retriable"], true);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn connectivity_test_reports_both_outcomes() -> TestResult {
    let server = MockServer::start().await;
    mount_backend(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/config/test/llm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "status_code": 200
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/config/test/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "message": "401 Unauthorized"
        })))
        .mount(&server)
        .await;

    let reachable = ccon(&server.uri(), &["--no-progress", "test", "llm"])?;
    assert_eq!(reachable.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&reachable.stdout).contains("`llm` reachable (HTTP 200)"));

    let unreachable = ccon(&server.uri(), &["--output", "json", "test", "embeddings"])?;
    assert_eq!(unreachable.status.code(), Some(4));
    let value = stdout_json(&unreachable)?;
    assert_eq!(value["ok"], false);
    assert_eq!(value["text"], "`embeddings` unreachable: 401 Unauthorized");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn export_prints_yaml_and_import_keeps_stored_secrets() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/config/export"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "yaml": "llm:\n  api_key: '****'\n  model: x\n"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/config/import"))
        .and(body_json(json!({"config": {"llm": {"model": "x"}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "imported"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let exported = ccon(&server.uri(), &["--no-progress", "export"])?;
    assert_eq!(exported.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&exported.stdout),
        "llm:\n  api_key: '****'\n  model: x\n"
    );

    let imported = ccon(
        &server.uri(),
        &[
            "--output",
            "json",
            "import",
            "--json",
            r#"{"config": {"llm": {"api_key": "****", "model": "x"}}}"#,
        ],
    )?;
    assert_eq!(imported.status.code(), Some(0));
    let value = stdout_json(&imported)?;
    assert_eq!(value["sections"], json!(["llm"]));
    assert_eq!(value["withheld"], json!(["llm.api_key"]));
    assert_eq!(value["message"], "imported");
    Ok(())
}

#[test]
fn config_show_reflects_base_url_flag() -> TestResult {
    let output = ccon(
        "http://10.1.2.3:9000",
        &["--output", "json", "--no-progress", "config", "show"],
    )?;
    assert_eq!(output.status.code(), Some(0));
    let value = stdout_json(&output)?;
    assert_eq!(
        value["effectiveConfig"]["api"]["baseUrl"],
        "http://10.1.2.3:9000"
    );
    Ok(())
}

#[test]
fn config_validate_rejects_bad_base_url() -> TestResult {
    let output = ccon("ftp://example.invalid", &["--no-progress", "config", "validate"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("status: error\n"));
    Ok(())
}
