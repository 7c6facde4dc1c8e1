//! Config API boundary contract.

use crate::BoxFuture;
use config_console_domain::{ConfigDocument, SchemaDocument, SectionName, SectionPatch};
use config_console_shared::{ErrorEnvelope, RequestContext, Result};
use serde_json::{Map, Value};

/// Default text when the server rejects an update without a message.
pub const DEFAULT_REJECTION_MESSAGE: &str = "update rejected by server";

/// Reply to a section patch or a whole-document import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Server-reported success flag.
    pub success: bool,
    /// Optional server message.
    pub message: Option<String>,
}

impl UpdateOutcome {
    /// Successful outcome with an optional message.
    #[must_use]
    pub fn accepted(message: Option<String>) -> Self {
        Self {
            success: true,
            message,
        }
    }

    /// Turn `success: false` into a server rejection carrying the message.
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        let message = self
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_owned());
        Err(ErrorEnvelope::server_rejected(message))
    }
}

/// Reply from the section connectivity test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityReport {
    /// True when the upstream endpoint answered.
    pub ok: bool,
    /// Upstream HTTP status, if one was observed.
    pub status_code: Option<u16>,
    /// Optional diagnostic message.
    pub message: Option<String>,
}

/// Boundary contract for the remote configuration API.
///
/// Implementations map non-success replies to errors: a rejected update
/// (`success: false` or a non-2xx status) is returned as
/// [`ErrorEnvelope::server_rejected`] rather than an `Ok` outcome.
pub trait ConfigApiPort: Send + Sync {
    /// Fetch the JSON Schema describing the whole config document.
    fn fetch_schema(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<SchemaDocument>>;

    /// Fetch the config document, masked or not.
    fn fetch_config(&self, ctx: &RequestContext, masked: bool)
    -> BoxFuture<'_, Result<ConfigDocument>>;

    /// Fetch one section's stored value.
    fn fetch_section(&self, ctx: &RequestContext, section: &SectionName)
    -> BoxFuture<'_, Result<Value>>;

    /// Submit a partial update for one section.
    fn patch_section(
        &self,
        ctx: &RequestContext,
        patch: SectionPatch,
    ) -> BoxFuture<'_, Result<UpdateOutcome>>;

    /// Ask the server to test connectivity for one section.
    fn test_section(
        &self,
        ctx: &RequestContext,
        section: &SectionName,
    ) -> BoxFuture<'_, Result<ConnectivityReport>>;

    /// Fetch the serialized export payload. The shape is owned by the server.
    fn export_config(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Value>>;

    /// Replace the stored document with an imported one.
    fn import_config(
        &self,
        ctx: &RequestContext,
        document: Map<String, Value>,
    ) -> BoxFuture<'_, Result<UpdateOutcome>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_outcome_passes_through() {
        let outcome = UpdateOutcome::accepted(Some("saved".to_owned()));
        assert_eq!(outcome.clone().into_result(), Ok(outcome));
    }

    #[test]
    fn rejected_outcome_keeps_server_message() {
        let outcome = UpdateOutcome {
            success: false,
            message: Some("port must be positive".to_owned()),
        };
        let error = outcome.into_result().err();
        assert!(matches!(
            error,
            Some(ref error) if error.is_server_rejection() && error.message == "port must be positive"
        ));
    }

    #[test]
    fn rejected_outcome_without_message_uses_default() {
        let outcome = UpdateOutcome {
            success: false,
            message: Some("  ".to_owned()),
        };
        let error = outcome.into_result().err();
        assert!(matches!(error, Some(ref error) if error.message == DEFAULT_REJECTION_MESSAGE));
    }
}
