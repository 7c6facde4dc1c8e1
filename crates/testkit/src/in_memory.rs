//! In-memory adapter implementations for port contracts.
//!
//! These implementations are intended for:
//! - Unit/integration tests of the editor controller
//! - Deterministic contract tests for the ports layer
//! - Local experimentation without a running config API

use config_console_ports::{
    BoxFuture, ConfigApiPort, ConfigDocument, ConnectivityReport, LogEvent, LogFields, LogLevel,
    LoggerPort, SchemaDocument, SectionName, SectionPatch, UpdateOutcome,
};
use config_console_shared::{
    ErrorCode, ErrorEnvelope, MASK_SENTINEL, RequestContext, Result, is_secret_field_key,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// Logger that keeps every event for later assertions.
///
/// Children share the same buffer and merge their base fields into each event.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    events: Arc<Mutex<Vec<LogEvent>>>,
    base_fields: LogFields,
}

impl RecordingLogger {
    /// Create an empty recording logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Recorded event names, in order.
    pub fn event_names(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|event| event.event.into_string())
            .collect()
    }

    /// First recorded event with the given name.
    pub fn find(&self, name: &str) -> Option<LogEvent> {
        self.events()
            .into_iter()
            .find(|event| &*event.event == name)
    }

    /// Recorded events at or above `level`.
    pub fn at_least(&self, level: LogLevel) -> Vec<LogEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.level >= level)
            .collect()
    }
}

impl LoggerPort for RecordingLogger {
    fn log(&self, mut event: LogEvent) {
        if !self.base_fields.is_empty() {
            let mut merged = self.base_fields.clone();
            merged.extend(event.fields.take().unwrap_or_default());
            event.fields = Some(merged);
        }
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base_fields = self.base_fields.clone();
        base_fields.extend(fields);
        Box::new(Self {
            events: Arc::clone(&self.events),
            base_fields,
        })
    }
}

/// Port operation, used to address injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// `fetch_schema`.
    FetchSchema,
    /// `fetch_config`.
    FetchConfig,
    /// `fetch_section`.
    FetchSection,
    /// `patch_section`.
    PatchSection,
    /// `test_section`.
    TestSection,
    /// `export_config`.
    ExportConfig,
    /// `import_config`.
    ImportConfig,
}

/// One recorded call against [`InMemoryConfigApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    /// Schema fetch.
    FetchSchema,
    /// Whole-document fetch.
    FetchConfig {
        /// Whether the masked view was requested.
        masked: bool,
    },
    /// Single section fetch.
    FetchSection(SectionName),
    /// Section patch with its exact body.
    PatchSection(SectionPatch),
    /// Connectivity test.
    TestSection(SectionName),
    /// Export.
    ExportConfig,
    /// Import with the submitted document.
    ImportConfig(Map<String, Value>),
}

impl ApiCall {
    /// Operation this call belongs to.
    #[must_use]
    pub const fn operation(&self) -> ApiOperation {
        match self {
            Self::FetchSchema => ApiOperation::FetchSchema,
            Self::FetchConfig { .. } => ApiOperation::FetchConfig,
            Self::FetchSection(_) => ApiOperation::FetchSection,
            Self::PatchSection(_) => ApiOperation::PatchSection,
            Self::TestSection(_) => ApiOperation::TestSection,
            Self::ExportConfig => ApiOperation::ExportConfig,
            Self::ImportConfig(_) => ApiOperation::ImportConfig,
        }
    }
}

#[derive(Debug)]
struct ApiState {
    schema: SchemaDocument,
    stored: Map<String, Value>,
    calls: Vec<ApiCall>,
    failures: HashMap<ApiOperation, ErrorEnvelope>,
    update_reply: Option<UpdateOutcome>,
    test_reply: ConnectivityReport,
    export_payload: Option<Value>,
}

/// In-memory config API holding a schema and the real (unmasked) document.
///
/// Reads return the masked view: every non-empty secret value becomes the
/// mask sentinel. Patches and imports merge into the stored document, so a
/// withheld secret keeps its stored value.
#[derive(Debug)]
pub struct InMemoryConfigApi {
    state: RwLock<ApiState>,
}

impl InMemoryConfigApi {
    /// Create an API serving `schema` and the unmasked `stored` document.
    ///
    /// A non-object `stored` value starts the API with an empty document.
    #[must_use]
    pub fn new(schema: SchemaDocument, stored: Value) -> Self {
        let stored = match stored {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            state: RwLock::new(ApiState {
                schema,
                stored,
                calls: Vec::new(),
                failures: HashMap::new(),
                update_reply: None,
                test_reply: ConnectivityReport {
                    ok: true,
                    status_code: Some(200),
                    message: None,
                },
                export_payload: None,
            }),
        }
    }

    /// Reply to every patch and import with this outcome instead of applying it.
    ///
    /// A `success: false` outcome surfaces as a server rejection.
    #[must_use]
    pub fn with_update_reply(mut self, outcome: UpdateOutcome) -> Self {
        self.state.get_mut().update_reply = Some(outcome);
        self
    }

    /// Reply to connectivity tests with this report.
    #[must_use]
    pub fn with_test_reply(mut self, report: ConnectivityReport) -> Self {
        self.state.get_mut().test_reply = report;
        self
    }

    /// Serve this payload from `export_config` instead of the masked document.
    #[must_use]
    pub fn with_export_payload(mut self, payload: Value) -> Self {
        self.state.get_mut().export_payload = Some(payload);
        self
    }

    /// Fail every call to `operation` with `error` until cleared.
    pub async fn fail(&self, operation: ApiOperation, error: ErrorEnvelope) {
        self.state.write().await.failures.insert(operation, error);
    }

    /// Stop failing `operation`.
    pub async fn clear_failure(&self, operation: ApiOperation) {
        self.state.write().await.failures.remove(&operation);
    }

    /// Every recorded call, in order.
    pub async fn calls(&self) -> Vec<ApiCall> {
        self.state.read().await.calls.clone()
    }

    /// Recorded patches, in order.
    pub async fn patches(&self) -> Vec<SectionPatch> {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::PatchSection(patch) => Some(patch.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded calls to `operation`.
    pub async fn call_count(&self, operation: ApiOperation) -> usize {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// The real stored document.
    pub async fn stored(&self) -> Map<String, Value> {
        self.state.read().await.stored.clone()
    }

    async fn begin(&self, call: ApiCall) -> Result<()> {
        let mut state = self.state.write().await;
        let operation = call.operation();
        state.calls.push(call);
        match state.failures.get(&operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn apply_update(&self, document: Map<String, Value>) -> Result<UpdateOutcome> {
        let mut state = self.state.write().await;
        if let Some(reply) = state.update_reply.clone() {
            return reply.into_result();
        }
        for (section, value) in document {
            merge_section(&mut state.stored, section, value);
        }
        Ok(UpdateOutcome::accepted(Some("configuration updated".to_owned())))
    }
}

impl ConfigApiPort for InMemoryConfigApi {
    fn fetch_schema(&self, _ctx: &RequestContext) -> BoxFuture<'_, Result<SchemaDocument>> {
        Box::pin(async move {
            self.begin(ApiCall::FetchSchema).await?;
            Ok(self.state.read().await.schema.clone())
        })
    }

    fn fetch_config(
        &self,
        _ctx: &RequestContext,
        masked: bool,
    ) -> BoxFuture<'_, Result<ConfigDocument>> {
        Box::pin(async move {
            self.begin(ApiCall::FetchConfig { masked }).await?;
            let stored = self.state.read().await.stored.clone();
            let document = if masked { mask_document(stored) } else { stored };
            ConfigDocument::from_value(Value::Object(document)).map_err(ErrorEnvelope::from)
        })
    }

    fn fetch_section(
        &self,
        _ctx: &RequestContext,
        section: &SectionName,
    ) -> BoxFuture<'_, Result<Value>> {
        let section = section.clone();
        Box::pin(async move {
            self.begin(ApiCall::FetchSection(section.clone())).await?;
            let stored = self.state.read().await.stored.clone();
            mask_document(stored)
                .remove(section.as_str())
                .ok_or_else(|| {
                    ErrorEnvelope::server_rejected(format!("Unknown section: {section}"))
                        .with_metadata("status", "404")
                })
        })
    }

    fn patch_section(
        &self,
        _ctx: &RequestContext,
        patch: SectionPatch,
    ) -> BoxFuture<'_, Result<UpdateOutcome>> {
        Box::pin(async move {
            self.begin(ApiCall::PatchSection(patch.clone())).await?;
            let mut document = Map::new();
            document.insert(patch.section().as_str().to_owned(), patch.into_body());
            self.apply_update(document).await
        })
    }

    fn test_section(
        &self,
        _ctx: &RequestContext,
        section: &SectionName,
    ) -> BoxFuture<'_, Result<ConnectivityReport>> {
        let section = section.clone();
        Box::pin(async move {
            self.begin(ApiCall::TestSection(section)).await?;
            Ok(self.state.read().await.test_reply.clone())
        })
    }

    fn export_config(&self, _ctx: &RequestContext) -> BoxFuture<'_, Result<Value>> {
        Box::pin(async move {
            self.begin(ApiCall::ExportConfig).await?;
            let state = self.state.read().await;
            Ok(state
                .export_payload
                .clone()
                .unwrap_or_else(|| Value::Object(mask_document(state.stored.clone()))))
        })
    }

    fn import_config(
        &self,
        _ctx: &RequestContext,
        document: Map<String, Value>,
    ) -> BoxFuture<'_, Result<UpdateOutcome>> {
        Box::pin(async move {
            self.begin(ApiCall::ImportConfig(document.clone())).await?;
            self.apply_update(document).await
        })
    }
}

/// Replace non-empty secret values with the mask sentinel.
#[must_use]
pub fn mask_document(document: Map<String, Value>) -> Map<String, Value> {
    document
        .into_iter()
        .map(|(section, value)| match value {
            Value::Object(body) => {
                let masked = body
                    .into_iter()
                    .map(|(key, value)| {
                        let hidden = is_secret_field_key(&key)
                            && matches!(&value, Value::String(text) if !text.is_empty());
                        if hidden {
                            (key, Value::String(MASK_SENTINEL.to_owned()))
                        } else {
                            (key, value)
                        }
                    })
                    .collect();
                (section, Value::Object(masked))
            },
            other => (section, other),
        })
        .collect()
}

fn merge_section(stored: &mut Map<String, Value>, section: String, value: Value) {
    match (stored.get_mut(&section), value) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            existing.extend(incoming);
        },
        (_, value) => {
            stored.insert(section, value);
        },
    }
}

/// A transport failure fixture, as an HTTP adapter reports a refused connection.
pub fn connection_failed() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::new("api", "connection_failed"),
        "config API connection failed: connection refused",
        config_console_shared::ErrorClass::Retriable,
    )
}
