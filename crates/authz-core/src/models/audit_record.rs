//! Append-only, hash-chained audit record
//!
//! `id` is always equal to `content_hash` — the record's identity is its own
//! content fingerprint, chained to the previous record's hash. See
//! [`crate::canonical`] for the serialization used to compute it and
//! `authz-audit` for the persistence/chain-verification implementation.

use crate::models::RiskLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditDecision {
    Allow,
    Deny,
    Challenge,
    Granted,
    Revoked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Equal to `content_hash`; never assigned independently.
    pub id: String,
    pub prev_hash: String,
    pub subject_id: Uuid,
    pub session_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub decision: AuditDecision,
    pub policy_package: Option<String>,
    pub policy_rule: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub entitlements: Vec<String>,
    pub risk_level: RiskLevel,
    pub mfa_verified: bool,
    pub ip: String,
    pub user_agent: String,
    pub evaluated_at: DateTime<Utc>,
    pub content_hash: String,
}

impl AuditRecord {
    /// `true` once `id` and `content_hash` have been filled in by the hashing
    /// step; a record built by the pipeline before that point carries empty
    /// strings in both fields.
    pub fn is_sealed(&self) -> bool {
        !self.content_hash.is_empty() && self.id == self.content_hash
    }
}
