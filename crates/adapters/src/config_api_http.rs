//! HTTP adapter for the remote config API.

use config_console_config::ApiConfig;
use config_console_ports::{
    BoxFuture, ConfigApiPort, ConfigDocument, ConnectivityReport, SchemaDocument, SectionName,
    SectionPatch, UpdateOutcome,
};
use config_console_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::time::Duration;
use url::Url;

const API_PREFIX: [&str; 3] = ["api", "v2", "config"];
const HEADER_CORRELATION_ID: &str = "x-correlation-id";
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Config API client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigApiHttpConfig {
    /// Base URL; the `/api/v2/config` prefix is appended to it.
    pub base_url: Box<str>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl ConfigApiHttpConfig {
    /// Build from the validated console API settings.
    #[must_use]
    pub fn from_api_config(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone().into_boxed_str(),
            timeout_ms: config.timeout_ms,
        }
    }
}

/// reqwest-backed [`ConfigApiPort`].
pub struct ConfigApiHttp {
    client: reqwest::Client,
    base_url: Url,
}

impl ConfigApiHttp {
    /// Create a new config API client.
    pub fn new(config: &ConfigApiHttpConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                format!("invalid config API base url: {error}"),
            )
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "config API base url must be an http(s) URL",
            ));
        }
        if config.timeout_ms == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "timeout must be greater than zero",
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("api", "client_init_failed"),
                    format!("failed to build config API client: {error}"),
                    ErrorClass::NonRetriable,
                )
            })?;

        Ok(Self { client, base_url })
    }

    /// Endpoint URL for the given path segments under `/api/v2/config`.
    ///
    /// Each segment is percent-encoded, so a section name can never escape its
    /// path position.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ErrorEnvelope::invariant(ErrorCode::internal(), "base url cannot carry a path")
            })?;
            path.pop_if_empty();
            path.extend(API_PREFIX);
            path.extend(segments);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        method: Method,
        url: Url,
        body: Option<Value>,
        operation: &'static str,
    ) -> Result<T> {
        tracing::debug!(
            operation,
            method = %method,
            url = %url,
            correlation_id = %ctx.correlation_id(),
            "config api request"
        );

        let mut request = self
            .client
            .request(method, url)
            .header(HEADER_CORRELATION_ID, ctx.correlation_id().as_str());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|error| map_reqwest_error(&error, operation))?;
        let status = response.status();
        let payload = response
            .bytes()
            .await
            .map_err(|error| map_reqwest_error(&error, operation))?;

        tracing::debug!(operation, status = status.as_u16(), "config api response");

        if !status.is_success() {
            return Err(map_http_error(status, &payload).with_metadata("operation", operation));
        }

        serde_json::from_slice(&payload).map_err(|error| {
            invalid_response(format!("failed to decode config API response: {error}"))
                .with_metadata("operation", operation)
        })
    }
}

impl ConfigApiPort for ConfigApiHttp {
    fn fetch_schema(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<SchemaDocument>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let url = self.endpoint(&["schema"])?;
            let value: Value = self
                .send(&ctx, Method::GET, url, None, "config_api.fetch_schema")
                .await?;
            if !value.is_object() {
                return Err(invalid_response("schema response must be a JSON object"));
            }
            Ok(SchemaDocument::new(value))
        })
    }

    fn fetch_config(
        &self,
        ctx: &RequestContext,
        masked: bool,
    ) -> BoxFuture<'_, Result<ConfigDocument>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let mut url = self.endpoint(&[])?;
            url.query_pairs_mut()
                .append_pair("masked", if masked { "true" } else { "false" });
            let value: Value = self
                .send(&ctx, Method::GET, url, None, "config_api.fetch_config")
                .await?;
            ConfigDocument::from_value(value)
                .map_err(|error| invalid_response(format!("config response: {error}")))
        })
    }

    fn fetch_section(
        &self,
        ctx: &RequestContext,
        section: &SectionName,
    ) -> BoxFuture<'_, Result<Value>> {
        let ctx = ctx.clone();
        let section = section.clone();
        Box::pin(async move {
            let url = self.endpoint(&[section.as_str()])?;
            self.send(&ctx, Method::GET, url, None, "config_api.fetch_section")
                .await
                .map_err(|error| error.with_metadata("section", section.as_str()))
        })
    }

    fn patch_section(
        &self,
        ctx: &RequestContext,
        patch: SectionPatch,
    ) -> BoxFuture<'_, Result<UpdateOutcome>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let section = patch.section().clone();
            let url = self.endpoint(&[section.as_str()])?;
            let reply: UpdateReply = self
                .send(
                    &ctx,
                    Method::PATCH,
                    url,
                    Some(patch.into_body()),
                    "config_api.patch_section",
                )
                .await
                .map_err(|error| error.with_metadata("section", section.as_str()))?;
            reply
                .into_outcome()
                .map_err(|error| error.with_metadata("section", section.as_str()))
        })
    }

    fn test_section(
        &self,
        ctx: &RequestContext,
        section: &SectionName,
    ) -> BoxFuture<'_, Result<ConnectivityReport>> {
        let ctx = ctx.clone();
        let section = section.clone();
        Box::pin(async move {
            let url = self.endpoint(&["test", section.as_str()])?;
            let reply: TestReply = self
                .send(&ctx, Method::POST, url, None, "config_api.test_section")
                .await
                .map_err(|error| error.with_metadata("section", section.as_str()))?;
            Ok(ConnectivityReport {
                ok: reply.ok,
                status_code: reply.status_code,
                message: reply.message.or(reply.error),
            })
        })
    }

    fn export_config(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Value>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let url = self.endpoint(&["export"])?;
            self.send(&ctx, Method::GET, url, None, "config_api.export_config")
                .await
        })
    }

    fn import_config(
        &self,
        ctx: &RequestContext,
        document: Map<String, Value>,
    ) -> BoxFuture<'_, Result<UpdateOutcome>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let url = self.endpoint(&["import"])?;
            let body = json!({ "config": document });
            let reply: UpdateReply = self
                .send(&ctx, Method::POST, url, Some(body), "config_api.import_config")
                .await?;
            reply.into_outcome()
        })
    }
}

#[derive(Debug, Deserialize)]
struct UpdateReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

impl UpdateReply {
    fn into_outcome(self) -> Result<UpdateOutcome> {
        UpdateOutcome {
            success: self.success,
            message: self.message,
        }
        .into_result()
    }
}

#[derive(Debug, Deserialize)]
struct TestReply {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Items(Vec<ErrorDetailItem>),
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct ErrorDetailItem {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    loc: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    #[serde(default)]
    detail: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

/// Pull the human-readable message out of a non-2xx body.
///
/// Recognises `{"detail": "..."}`, `{"detail": [{"msg": ...}]}` and
/// `{"message": "..."}`; otherwise falls back to the raw text.
fn error_message(status: StatusCode, payload: &[u8]) -> String {
    let parsed = serde_json::from_slice::<ErrorReply>(payload).ok();
    let from_json = parsed.and_then(|reply| {
        let detail = match reply.detail {
            Some(ErrorDetail::Text(text)) => Some(text),
            Some(ErrorDetail::Items(items)) => {
                let joined = items
                    .into_iter()
                    .filter_map(|item| {
                        let msg = item.msg?;
                        let location = item
                            .loc
                            .map(|loc| {
                                loc.iter()
                                    .map(|part| match part {
                                        Value::String(text) => text.clone(),
                                        other => other.to_string(),
                                    })
                                    .collect::<Vec<_>>()
                                    .join(".")
                            })
                            .filter(|loc| !loc.is_empty());
                        Some(location.map_or_else(|| msg.clone(), |loc| format!("{loc}: {msg}")))
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                (!joined.is_empty()).then_some(joined)
            },
            Some(ErrorDetail::Other(value)) => Some(value.to_string()),
            None => None,
        };
        detail.or(reply.message)
    });

    from_json
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            let text = String::from_utf8_lossy(payload);
            let text = text.trim();
            if text.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                text.chars().take(MAX_ERROR_BODY_CHARS).collect()
            }
        })
}

fn map_http_error(status: StatusCode, payload: &[u8]) -> ErrorEnvelope {
    let message = error_message(status, payload);
    let envelope = match status.as_u16() {
        401 | 403 => ErrorEnvelope::expected(ErrorCode::permission_denied(), message),
        408 => ErrorEnvelope::unexpected(
            ErrorCode::new("api", "timeout"),
            message,
            ErrorClass::Retriable,
        ),
        429 => ErrorEnvelope::expected_with_class(
            ErrorCode::new("api", "rate_limited"),
            message,
            ErrorClass::Retriable,
        ),
        _ if status.is_server_error() => ErrorEnvelope::unexpected(
            ErrorCode::new("api", "dependency_unavailable"),
            message,
            ErrorClass::Retriable,
        ),
        _ => ErrorEnvelope::server_rejected(message),
    };
    envelope.with_metadata("status", status.as_u16().to_string())
}

fn map_reqwest_error(error: &reqwest::Error, operation: &'static str) -> ErrorEnvelope {
    let envelope = if error.is_timeout() {
        ErrorEnvelope::unexpected(
            ErrorCode::new("api", "timeout"),
            "config API request timed out",
            ErrorClass::Retriable,
        )
    } else if error.is_connect() {
        ErrorEnvelope::unexpected(
            ErrorCode::new("api", "connection_failed"),
            format!("config API connection failed: {error}"),
            ErrorClass::Retriable,
        )
    } else if error.is_decode() {
        invalid_response(format!("config API response could not be read: {error}"))
    } else {
        ErrorEnvelope::unexpected(
            ErrorCode::new("api", "request_failed"),
            format!("config API request failed: {error}"),
            ErrorClass::NonRetriable,
        )
    };
    envelope.with_metadata("operation", operation)
}

fn invalid_response(message: impl Into<String>) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::new("api", "invalid_response"),
        message,
        ErrorClass::NonRetriable,
    )
}
