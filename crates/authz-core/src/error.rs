//! Error taxonomy for the authorization pipeline
//!
//! Kinds, not exception classes: every dependency fault crossing a component
//! boundary is translated into one of these before it can reach a handler.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("session invalid: {reason}")]
    SessionInvalid { reason: String },

    #[error("device mismatch")]
    DeviceMismatch,

    #[error("policy denied{}", explain.as_ref().map(|e| format!(": {e}")).unwrap_or_default())]
    PolicyDenied { explain: Option<String> },

    #[error("rate limit exceeded: {limit} requests per {window_secs}s")]
    RateLimited { limit: u32, window_secs: u64 },

    #[error("session terminated: risk level {level:?}")]
    SessionTerminated { level: crate::models::RiskLevel },

    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("policy engine unavailable: {0}")]
    PolicyUnavailable(String),

    #[error("audit sink degraded: {0}")]
    AuditDegraded(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthzError {
    /// True if this error kind should never be retried by the caller.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AuthzError::SessionInvalid { .. }
                | AuthzError::DeviceMismatch
                | AuthzError::PolicyDenied { .. }
                | AuthzError::SessionTerminated { .. }
                | AuthzError::MalformedInput(_)
                | AuthzError::PayloadTooLarge { .. }
        )
    }
}

impl From<serde_json::Error> for AuthzError {
    fn from(err: serde_json::Error) -> Self {
        AuthzError::MalformedInput(err.to_string())
    }
}
