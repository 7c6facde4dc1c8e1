//! Request-scoped correlation context.
//!
//! Console operations run one at a time and are never cancelled, so the
//! context only carries a correlation id for logs.

use crate::{ErrorCode, ErrorEnvelope, Result};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A correlation identifier used for logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Parse a correlation identifier from user input.
    ///
    /// The value is trimmed; empty values are rejected.
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "correlationId must be non-empty",
            ));
        }
        Ok(Self(Arc::<str>::from(trimmed)))
    }

    /// Create a new operation id, best-effort unique within this process.
    #[must_use]
    pub fn new_operation_id() -> Self {
        let n = OPERATION_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(Arc::<str>::from(format!("op_{n}")))
    }

    /// Borrow the identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

static OPERATION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Request-scoped context passed across port boundaries.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
}

impl RequestContext {
    /// Create a context for an explicit correlation id.
    #[must_use]
    pub const fn new(correlation_id: CorrelationId) -> Self {
        Self { correlation_id }
    }

    /// Create a context with an auto-generated `op_*` id.
    #[must_use]
    pub fn new_operation() -> Self {
        Self::new(CorrelationId::new_operation_id())
    }

    /// Return the correlation id.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }
}
