//! Audit logging contract (C9)
//!
//! `AuditSink::append` computes `prevHash` from the last appended record's
//! id (or `"GENESIS"`), canonicalizes the event, hashes with SHA-256, and
//! sets `id := contentHash`. Emission errors never propagate to the request
//! path — see [`crate::services::background::audit_worker`] for the
//! producer/consumer decoupling that enforces this.

use crate::error::AuthzError;
use crate::models::{AuditDecision, RiskLevel};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// What the pipeline hands to the audit sink before hashing/chaining. Not
/// yet sealed: `id`/`content_hash`/`prev_hash` are filled in by the sink.
#[derive(Debug, Clone)]
pub struct PendingAuditRecord {
    pub subject_id: Uuid,
    pub session_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub decision: AuditDecision,
    pub policy_package: Option<String>,
    pub policy_rule: Option<String>,
    pub roles: Vec<String>,
    pub entitlements: Vec<String>,
    pub risk_level: RiskLevel,
    pub mfa_verified: bool,
    pub ip: String,
    pub user_agent: String,
    pub evaluated_at: DateTime<Utc>,
}

/// A durable append-only sink. Implementations must compute the hash chain;
/// see `authz-audit` for the MySQL-backed implementation.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: PendingAuditRecord) -> Result<crate::models::AuditRecord, AuthzError>;

    /// Recompute `H(canonical(r \ id) || r.prevHash)` across the stored
    /// range and confirm it reproduces every stored `id`. Used by
    /// operational tooling, never on the request path.
    async fn verify_chain(&self) -> Result<bool, AuthzError>;
}

/// Non-durable sink that only writes to the `"audit"` tracing target — used
/// in tests and as a fallback when the durable path is unavailable, never as
/// the primary sink in production (it cannot satisfy the hash-chain
/// invariant across process restarts).
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn append(&self, record: PendingAuditRecord) -> Result<crate::models::AuditRecord, AuthzError> {
        tracing::info!(
            target: "audit",
            subject_id = %record.subject_id,
            session_id = ?record.session_id,
            action = %record.action,
            decision = ?record.decision,
            risk_level = ?record.risk_level,
            "AUDIT_EVENT"
        );
        Ok(crate::models::AuditRecord {
            id: String::new(),
            prev_hash: String::new(),
            subject_id: record.subject_id,
            session_id: record.session_id,
            action: record.action,
            resource: record.resource,
            decision: record.decision,
            policy_package: record.policy_package,
            policy_rule: record.policy_rule,
            roles: record.roles,
            entitlements: record.entitlements,
            risk_level: record.risk_level,
            mfa_verified: record.mfa_verified,
            ip: record.ip,
            user_agent: record.user_agent,
            evaluated_at: record.evaluated_at,
            content_hash: String::new(),
        })
    }

    async fn verify_chain(&self) -> Result<bool, AuthzError> {
        Ok(true)
    }
}
