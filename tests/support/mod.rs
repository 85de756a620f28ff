//! In-memory fakes implementing the same traits the Redis/HTTP/MySQL
//! backends do, so the pipeline can be exercised end to end without any
//! external service.

use async_trait::async_trait;
use authz_core::audit::{AuditSink, PendingAuditRecord};
use authz_core::canonical::{self, GENESIS_HASH};
use authz_core::error::AuthzError;
use authz_core::models::{
    AuditDecision, AuditRecord, PolicyDecision, PolicyExplain, PolicyInput, RiskLevel, Session,
    SessionState,
};
use authz_core::services::entitlement_service::EntitlementStore;
use authz_core::services::policy_client::PolicyClient;
use authz_core::services::rate_limiter::RateCounter;
use authz_core::services::replay::ReplayNonceStore;
use authz_core::services::risk_history::RiskHistoryStore;
use authz_core::services::session_store::SessionStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Same hashed content shape as `authz-audit::MySqlAuditSink` — everything
/// but the three fields the hash itself produces.
#[derive(Serialize)]
struct AuditRecordContent<'a> {
    subject_id: Uuid,
    session_id: Option<Uuid>,
    action: &'a str,
    resource: &'a Option<String>,
    decision: AuditDecision,
    policy_package: &'a Option<String>,
    policy_rule: &'a Option<String>,
    roles: &'a [String],
    entitlements: &'a [String],
    risk_level: RiskLevel,
    mfa_verified: bool,
    ip: &'a str,
    user_agent: &'a str,
    evaluated_at: DateTime<Utc>,
}

fn content_of(r: &PendingAuditRecord) -> AuditRecordContent<'_> {
    AuditRecordContent {
        subject_id: r.subject_id,
        session_id: r.session_id,
        action: &r.action,
        resource: &r.resource,
        decision: r.decision,
        policy_package: &r.policy_package,
        policy_rule: &r.policy_rule,
        roles: &r.roles,
        entitlements: &r.entitlements,
        risk_level: r.risk_level,
        mfa_verified: r.mfa_verified,
        ip: &r.ip,
        user_agent: &r.user_agent,
        evaluated_at: r.evaluated_at,
    }
}

fn sealed_content_of(r: &AuditRecord) -> AuditRecordContent<'_> {
    AuditRecordContent {
        subject_id: r.subject_id,
        session_id: r.session_id,
        action: &r.action,
        resource: &r.resource,
        decision: r.decision,
        policy_package: &r.policy_package,
        policy_rule: &r.policy_rule,
        roles: &r.roles,
        entitlements: &r.entitlements,
        risk_level: r.risk_level,
        mfa_verified: r.mfa_verified,
        ip: &r.ip,
        user_agent: &r.user_agent,
        evaluated_at: r.evaluated_at,
    }
}

/// Append-only, in-memory, hash-chained sink — the same chain discipline as
/// `MySqlAuditSink` without a database, for property-testing the chain
/// algorithm and for pipeline tests that only need to assert an ALLOW/DENY
/// record was appended.
#[derive(Default)]
pub struct FakeAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl FakeAuditSink {
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Test-only hook to corrupt a stored record's content hash, simulating
    /// tampering for chain-verification tests.
    pub fn tamper(&self, index: usize, new_content_hash: String) {
        let mut records = self.records.lock().unwrap();
        records[index].content_hash = new_content_hash;
    }
}

#[async_trait]
impl AuditSink for FakeAuditSink {
    async fn append(&self, record: PendingAuditRecord) -> Result<AuditRecord, AuthzError> {
        let mut records = self.records.lock().unwrap();
        let prev_hash = records
            .last()
            .map(|r| r.content_hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());

        let canonical_content = canonical::to_canonical_string(&content_of(&record))
            .map_err(|e| AuthzError::Internal(e.to_string()))?;
        let content_hash = canonical::chain_hash(&canonical_content, &prev_hash);

        let sealed = AuditRecord {
            id: content_hash.clone(),
            prev_hash,
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
            content_hash,
        };
        records.push(sealed.clone());
        Ok(sealed)
    }

    async fn verify_chain(&self) -> Result<bool, AuthzError> {
        let records = self.records.lock().unwrap();
        let mut expected_prev = GENESIS_HASH.to_string();
        for record in records.iter() {
            if record.prev_hash != expected_prev {
                return Ok(false);
            }
            let canonical_content = canonical::to_canonical_string(&sealed_content_of(record))
                .map_err(|e| AuthzError::Internal(e.to_string()))?;
            let recomputed = canonical::chain_hash(&canonical_content, &record.prev_hash);
            if recomputed != record.content_hash || record.id != record.content_hash {
                return Ok(false);
            }
            expected_prev = record.content_hash.clone();
        }
        Ok(true)
    }
}

#[derive(Default)]
pub struct FakeSessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

#[async_trait]
impl SessionStore for FakeSessionStore {
    async fn create(&self, session: Session) -> Result<Session, AuthzError> {
        self.sessions.lock().unwrap().insert(session.id, session.clone());
        Ok(session)
    }

    async fn get(&self, session_id: Uuid) -> Result<SessionState, AuthzError> {
        match self.sessions.lock().unwrap().get(&session_id) {
            None => Ok(SessionState::Absent),
            Some(s) if s.revoked_at.is_some() => Ok(SessionState::Revoked),
            Some(s) => Ok(SessionState::Live(s.clone())),
        }
    }

    async fn touch_risk(
        &self,
        session_id: Uuid,
        level: RiskLevel,
        evaluated_at: DateTime<Utc>,
    ) -> Result<(), AuthzError> {
        if let Some(s) = self.sessions.lock().unwrap().get_mut(&session_id) {
            s.risk_level = level;
            s.last_evaluated_at = evaluated_at;
        }
        Ok(())
    }

    async fn revoke(&self, session_id: Uuid) -> Result<(), AuthzError> {
        if let Some(s) = self.sessions.lock().unwrap().get_mut(&session_id) {
            s.revoked_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn revoke_all_for_subject(&self, subject_id: Uuid) -> Result<u64, AuthzError> {
        let mut count = 0u64;
        for s in self.sessions.lock().unwrap().values_mut() {
            if s.subject_id == subject_id && s.revoked_at.is_none() {
                s.revoked_at = Some(Utc::now());
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Every subject looks brand new to risk history — no known IPs, no prior
/// sighting, no failures — unless a test seeds a recent-failure count.
pub struct FakeRiskHistory {
    pub recent_failures: u32,
}

impl Default for FakeRiskHistory {
    fn default() -> Self {
        Self { recent_failures: 0 }
    }
}

#[async_trait]
impl RiskHistoryStore for FakeRiskHistory {
    async fn known_ips(&self, _subject_id: Uuid) -> Result<Vec<IpAddr>, AuthzError> {
        Ok(Vec::new())
    }

    async fn last_seen(&self, _subject_id: Uuid) -> Result<Option<(IpAddr, DateTime<Utc>)>, AuthzError> {
        Ok(None)
    }

    async fn record_seen(&self, _subject_id: Uuid, _ip: IpAddr, _at: DateTime<Utc>) -> Result<(), AuthzError> {
        Ok(())
    }

    async fn recent_failed_attempts(&self, _subject_id: Uuid) -> Result<u32, AuthzError> {
        Ok(self.recent_failures)
    }
}

/// Unbounded fixed-window counter, keyed by session, reset manually between
/// test phases instead of by wall-clock expiry.
#[derive(Default)]
pub struct FakeRateCounter {
    counts: Mutex<HashMap<Uuid, u64>>,
}

#[async_trait]
impl RateCounter for FakeRateCounter {
    async fn increment(&self, session_id: Uuid, _window_secs: u64) -> Result<u64, AuthzError> {
        let mut counts = self.counts.lock().unwrap();
        let entry = counts.entry(session_id).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }
}

impl FakeRateCounter {
    pub fn reset(&self, session_id: Uuid) {
        self.counts.lock().unwrap().remove(&session_id);
    }
}

/// Mirrors `policies/default.rhai`'s rule order exactly, without spinning up
/// a script engine — deterministic and cheap for pipeline-level tests.
pub struct FakePolicyEngine;

#[async_trait]
impl PolicyClient for FakePolicyEngine {
    async fn decide(&self, input: &PolicyInput) -> Result<PolicyDecision, AuthzError> {
        let deny = |rule: &str| PolicyDecision {
            allow: false,
            explain: Some(PolicyExplain {
                package: "adaptive".to_string(),
                rule: rule.to_string(),
            }),
        };

        if input.risk.risk_level == RiskLevel::Critical {
            return Ok(deny("risk_critical"));
        }
        if input.tenant.throttled {
            return Ok(deny("tenant_throttled"));
        }
        if input.risk.risk_level == RiskLevel::High && !input.subject.mfa_verified {
            return Ok(deny("mfa_required_high_risk"));
        }
        if input.risk.risk_level == RiskLevel::Medium && !input.subject.mfa_verified {
            return Ok(deny("mfa_required_medium_risk"));
        }
        Ok(PolicyDecision {
            allow: true,
            explain: Some(PolicyExplain {
                package: "adaptive".to_string(),
                rule: "default_allow".to_string(),
            }),
        })
    }
}

pub fn live_session(
    subject_id: Uuid,
    tenant_id: Uuid,
    device_id: Option<String>,
    mfa_verified: bool,
) -> Session {
    let now = Utc::now();
    Session {
        id: Uuid::new_v4(),
        subject_id,
        tenant_id,
        device_id,
        created_at: now,
        expires_at: now + chrono::Duration::hours(8),
        revoked_at: None,
        risk_level: RiskLevel::Low,
        mfa_verified,
        last_evaluated_at: now,
    }
}

#[derive(Default)]
pub struct FakeEntitlementStore {
    entitlements: Mutex<HashMap<Uuid, authz_core::models::Entitlement>>,
}

#[async_trait]
impl EntitlementStore for FakeEntitlementStore {
    async fn create(&self, entitlement: authz_core::models::Entitlement) -> Result<authz_core::models::Entitlement, AuthzError> {
        self.entitlements
            .lock()
            .unwrap()
            .insert(entitlement.id, entitlement.clone());
        Ok(entitlement)
    }

    async fn get(&self, id: Uuid) -> Result<Option<authz_core::models::Entitlement>, AuthzError> {
        Ok(self.entitlements.lock().unwrap().get(&id).cloned())
    }

    async fn list_for_subject(&self, subject_id: Uuid) -> Result<Vec<authz_core::models::Entitlement>, AuthzError> {
        Ok(self
            .entitlements
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn put_status(
        &self,
        id: Uuid,
        status: authz_core::models::EntitlementStatus,
        revoked_at: Option<DateTime<Utc>>,
    ) -> Result<authz_core::models::Entitlement, AuthzError> {
        let mut entitlements = self.entitlements.lock().unwrap();
        let e = entitlements.get_mut(&id).expect("entitlement exists");
        e.status = status;
        e.revoked_at = revoked_at;
        e.updated_at = Utc::now();
        Ok(e.clone())
    }
}

/// In-memory anti-replay store with the same SETNX-plus-expiry semantics as
/// `RedisReplayNonceStore`, keyed on wall-clock time rather than a Redis
/// key's own TTL so property tests can assert claim-once-per-TTL behavior
/// without a real clock.
#[derive(Default)]
pub struct FakeReplayNonceStore {
    claims: Mutex<HashMap<String, DateTime<Utc>>>,
}

#[async_trait]
impl ReplayNonceStore for FakeReplayNonceStore {
    async fn claim(&self, nonce_hash: &str, ttl: Duration) -> Result<bool, AuthzError> {
        let mut claims = self.claims.lock().unwrap();
        let now = Utc::now();
        if let Some(expires_at) = claims.get(nonce_hash) {
            if *expires_at > now {
                return Ok(false);
            }
        }
        let ttl_chrono = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(1));
        claims.insert(nonce_hash.to_string(), now + ttl_chrono);
        Ok(true)
    }
}
