//! Lifecycle of explicit grants (C10)
//!
//! Revoking an entitlement must force re-authentication of everything it
//! backed: `Revoke` always drives `SessionStore::revoke_all_for_subject`
//! before returning, so a cached ALLOW built on the pulled grant cannot
//! outlive the revoke by more than one round-trip. It must also write
//! `ENTITLEMENT_REVOKED` to the audit log — through the same
//! bounded-channel producer the pipeline uses, so this never blocks on the
//! durable write either.

use crate::audit::PendingAuditRecord;
use crate::error::AuthzError;
use crate::models::{AuditDecision, Entitlement, EntitlementStatus, RiskLevel};
use crate::services::background::audit_worker::AsyncAuditLogger;
use crate::services::session_store::SessionStore;
use async_trait::async_trait;
use chrono::Utc;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait EntitlementStore: Send + Sync {
    async fn create(&self, entitlement: Entitlement) -> Result<Entitlement, AuthzError>;
    async fn get(&self, id: Uuid) -> Result<Option<Entitlement>, AuthzError>;
    async fn list_for_subject(&self, subject_id: Uuid) -> Result<Vec<Entitlement>, AuthzError>;
    async fn put_status(
        &self,
        id: Uuid,
        status: EntitlementStatus,
        revoked_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<Entitlement, AuthzError>;
}

/// Parameters accepted from a grant request — `id`, `status`, and the
/// timestamps are assigned here rather than by the caller.
pub struct GrantRequest {
    pub subject_type: crate::models::SubjectType,
    pub subject_id: Uuid,
    pub resource_type: String,
    pub resource_id: String,
    pub scopes: Vec<String>,
    pub valid_from: chrono::DateTime<Utc>,
    pub valid_until: Option<chrono::DateTime<Utc>>,
    pub granted_by: Uuid,
    pub grant_reason: String,
}

pub struct EntitlementService {
    store: Arc<dyn EntitlementStore>,
    sessions: Arc<dyn SessionStore>,
    audit: Arc<AsyncAuditLogger>,
}

impl EntitlementService {
    pub fn new(
        store: Arc<dyn EntitlementStore>,
        sessions: Arc<dyn SessionStore>,
        audit: Arc<AsyncAuditLogger>,
    ) -> Self {
        Self {
            store,
            sessions,
            audit,
        }
    }

    /// Creates a new ACTIVE entitlement. Grants never force a session
    /// revoke — only pulling one does (see [`Self::revoke`]).
    pub async fn grant(&self, req: GrantRequest) -> Result<Entitlement, AuthzError> {
        let now = Utc::now();
        let entitlement = Entitlement {
            id: Uuid::new_v4(),
            subject_type: req.subject_type,
            subject_id: req.subject_id,
            resource_type: req.resource_type,
            resource_id: req.resource_id,
            scopes: req.scopes,
            status: EntitlementStatus::Active,
            valid_from: req.valid_from,
            valid_until: req.valid_until,
            granted_by: req.granted_by,
            grant_reason: req.grant_reason,
            created_at: now,
            updated_at: now,
            revoked_at: None,
        };
        self.store.create(entitlement).await
    }

    pub async fn revoke(&self, id: Uuid) -> Result<Entitlement, AuthzError> {
        let existing = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AuthzError::MalformedInput(format!("unknown entitlement {id}")))?;

        if !existing.can_transition_to(EntitlementStatus::Revoked) {
            return Err(AuthzError::MalformedInput(format!(
                "entitlement {id} cannot transition from {:?} to REVOKED",
                existing.status
            )));
        }

        let revoked = self
            .store
            .put_status(id, EntitlementStatus::Revoked, Some(Utc::now()))
            .await?;

        self.sessions
            .revoke_all_for_subject(revoked.subject_id)
            .await?;

        self.audit.submit(PendingAuditRecord {
            subject_id: revoked.subject_id,
            session_id: None,
            action: "ENTITLEMENT_REVOKED".to_string(),
            resource: Some(format!("{}/{}", revoked.resource_type, revoked.resource_id)),
            decision: AuditDecision::Revoked,
            policy_package: None,
            policy_rule: None,
            roles: Vec::new(),
            entitlements: vec![id.to_string()],
            risk_level: RiskLevel::Low,
            mfa_verified: false,
            // Not an HTTP request in flight, so there is no client IP/UA to
            // carry; left at the neutral unspecified address rather than
            // modeling these fields as `Option` just for this one caller.
            ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED).to_string(),
            user_agent: "internal:entitlement-service".to_string(),
            evaluated_at: Utc::now(),
        });

        Ok(revoked)
    }

    pub async fn active_for_subject(&self, subject_id: Uuid) -> Result<Vec<Entitlement>, AuthzError> {
        let now = Utc::now();
        let all = self.store.list_for_subject(subject_id).await?;
        Ok(all.into_iter().filter(|e| e.is_active_at(now)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionState, SubjectType};
    use std::sync::Mutex;

    struct FakeEntitlementStore {
        entitlements: Mutex<Vec<Entitlement>>,
    }

    #[async_trait]
    impl EntitlementStore for FakeEntitlementStore {
        async fn create(&self, entitlement: Entitlement) -> Result<Entitlement, AuthzError> {
            self.entitlements.lock().unwrap().push(entitlement.clone());
            Ok(entitlement)
        }

        async fn get(&self, id: Uuid) -> Result<Option<Entitlement>, AuthzError> {
            Ok(self
                .entitlements
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.id == id)
                .cloned())
        }

        async fn list_for_subject(&self, subject_id: Uuid) -> Result<Vec<Entitlement>, AuthzError> {
            Ok(self
                .entitlements
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.subject_id == subject_id)
                .cloned()
                .collect())
        }

        async fn put_status(
            &self,
            id: Uuid,
            status: EntitlementStatus,
            revoked_at: Option<chrono::DateTime<Utc>>,
        ) -> Result<Entitlement, AuthzError> {
            let mut guard = self.entitlements.lock().unwrap();
            let e = guard.iter_mut().find(|e| e.id == id).unwrap();
            e.status = status;
            e.revoked_at = revoked_at;
            e.updated_at = Utc::now();
            Ok(e.clone())
        }
    }

    struct FakeSessionStore {
        revoked_subjects: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl SessionStore for FakeSessionStore {
        async fn create(&self, session: crate::models::Session) -> Result<crate::models::Session, AuthzError> {
            Ok(session)
        }
        async fn get(&self, _session_id: Uuid) -> Result<SessionState, AuthzError> {
            Ok(SessionState::Absent)
        }
        async fn touch_risk(
            &self,
            _session_id: Uuid,
            _level: crate::models::RiskLevel,
            _evaluated_at: chrono::DateTime<Utc>,
        ) -> Result<(), AuthzError> {
            Ok(())
        }
        async fn revoke(&self, _session_id: Uuid) -> Result<(), AuthzError> {
            Ok(())
        }
        async fn revoke_all_for_subject(&self, subject_id: Uuid) -> Result<u64, AuthzError> {
            self.revoked_subjects.lock().unwrap().push(subject_id);
            Ok(2)
        }
    }

    fn entitlement(subject_id: Uuid) -> Entitlement {
        Entitlement {
            id: Uuid::new_v4(),
            subject_type: SubjectType::User,
            subject_id,
            resource_type: "doc".to_string(),
            resource_id: "1".to_string(),
            scopes: vec!["read".to_string()],
            status: EntitlementStatus::Active,
            valid_from: Utc::now() - chrono::Duration::days(1),
            valid_until: None,
            granted_by: Uuid::new_v4(),
            grant_reason: "test".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            revoked_at: None,
        }
    }

    #[tokio::test]
    async fn revoke_forces_session_revocation() {
        let subject_id = Uuid::new_v4();
        let e = entitlement(subject_id);
        let entitlement_id = e.id;
        let store = Arc::new(FakeEntitlementStore {
            entitlements: Mutex::new(vec![e]),
        });
        let sessions = Arc::new(FakeSessionStore {
            revoked_subjects: Mutex::new(Vec::new()),
        });
        let (audit, mut audit_rx) = AsyncAuditLogger::new(8);
        let service = EntitlementService::new(store.clone(), sessions.clone(), Arc::new(audit));

        let revoked = service.revoke(entitlement_id).await.unwrap();
        assert_eq!(revoked.status, EntitlementStatus::Revoked);
        assert_eq!(sessions.revoked_subjects.lock().unwrap().as_slice(), &[subject_id]);

        let record = audit_rx.try_recv().expect("revoke must emit an audit record");
        assert_eq!(record.action, "ENTITLEMENT_REVOKED");
        assert_eq!(record.subject_id, subject_id);
        assert_eq!(record.decision, AuditDecision::Revoked);
    }

    #[tokio::test]
    async fn revoked_entitlement_cannot_be_revoked_again() {
        let subject_id = Uuid::new_v4();
        let mut e = entitlement(subject_id);
        e.status = EntitlementStatus::Revoked;
        let entitlement_id = e.id;
        let store = Arc::new(FakeEntitlementStore {
            entitlements: Mutex::new(vec![e]),
        });
        let sessions = Arc::new(FakeSessionStore {
            revoked_subjects: Mutex::new(Vec::new()),
        });
        let (audit, _audit_rx) = AsyncAuditLogger::new(8);
        let service = EntitlementService::new(store, sessions, Arc::new(audit));

        assert!(service.revoke(entitlement_id).await.is_err());
    }
}
