//! Request-scoped state threaded through the pipeline steps

use crate::models::{EntitlementGrant, PolicyDecision, PolicyInput, RiskProfile, Session, TenantContext};
use chrono::{DateTime, Utc};
use std::net::IpAddr;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Everything a step needs to read or may populate. Fields start `None` and
/// are filled in order; a step downstream of `requireSession` can assume
/// `session` is `Some`, because an earlier short-circuit would have stopped
/// the pipeline before it ran.
pub struct PipelineContext {
    pub request_id: Uuid,
    pub session_id: Uuid,
    /// Subject claimed by the verified access credential, known before the
    /// session lookup resolves — used so a `requireSession` failure can
    /// still be audited against the right subject.
    pub claimed_subject_id: Uuid,
    pub presented_device_id: Option<String>,
    pub ip: IpAddr,
    pub user_agent: String,
    pub resource: String,
    pub action: String,
    pub tenant: TenantContext,
    pub cancellation: CancellationToken,
    pub now: DateTime<Utc>,

    pub session: Option<Session>,
    pub risk: Option<RiskProfile>,
    pub entitlements: Vec<EntitlementGrant>,
    pub policy_input: Option<PolicyInput>,
    pub decision: Option<PolicyDecision>,
}

impl PipelineContext {
    pub fn new(
        session_id: Uuid,
        claimed_subject_id: Uuid,
        presented_device_id: Option<String>,
        ip: IpAddr,
        user_agent: String,
        resource: String,
        action: String,
        tenant: TenantContext,
        cancellation: CancellationToken,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            session_id,
            claimed_subject_id,
            presented_device_id,
            ip,
            user_agent,
            resource,
            action,
            tenant,
            cancellation,
            now,
            session: None,
            risk: None,
            entitlements: Vec::new(),
            policy_input: None,
            decision: None,
        }
    }

    pub fn session(&self) -> &Session {
        self.session
            .as_ref()
            .expect("session populated by requireSession before any later step runs")
    }
}
