//! Session store contract (C1)
//!
//! The backing implementation lives in `authz-cache` against Redis — no
//! in-process session cache is kept across requests, so every node sees the
//! same revoke the instant it lands.

use crate::error::AuthzError;
use crate::models::{RiskLevel, Session, SessionState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: Session) -> Result<Session, AuthzError>;

    /// Never a bare `Option` — see [`SessionState`].
    async fn get(&self, session_id: Uuid) -> Result<SessionState, AuthzError>;

    async fn touch_risk(
        &self,
        session_id: Uuid,
        level: RiskLevel,
        evaluated_at: DateTime<Utc>,
    ) -> Result<(), AuthzError>;

    async fn revoke(&self, session_id: Uuid) -> Result<(), AuthzError>;

    /// Revoke every live session for a subject — used when an entitlement is
    /// pulled or an operator forces a sign-out.
    async fn revoke_all_for_subject(&self, subject_id: Uuid) -> Result<u64, AuthzError>;
}

/// Binds the pure [`crate::services::risk_engine::RiskEngine`] output to
/// session enforcement: escalating a session's risk can, per the configured
/// policy, terminate it outright rather than merely annotate it.
pub struct SessionRiskBinder {
    pub terminate_at_or_above: RiskLevel,
}

impl SessionRiskBinder {
    /// `true` when a freshly computed risk level requires killing the session
    /// instead of just recording it.
    pub fn requires_termination(&self, level: RiskLevel) -> bool {
        level >= self.terminate_at_or_above
    }
}

impl Default for SessionRiskBinder {
    fn default() -> Self {
        Self {
            terminate_at_or_above: RiskLevel::Critical,
        }
    }
}
