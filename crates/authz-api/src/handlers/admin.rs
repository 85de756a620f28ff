//! Operator-triggered revoke endpoints for incident response
//!
//! Thin handlers over [`authz_core::services::session_store::SessionStore`]
//! — no pipeline, no policy decision. `SessionStore` itself stays a pure
//! persistence contract (`Revoke`/`RevokeAllForSubject` own the
//! store mutation; they don't own audit), so the `SESSION_REVOKED` /
//! `SESSIONS_REVOKED_SUBJECT` events these calls require are emitted here,
//! the one place outside the request pipeline that calls them directly. Not
//! reachable from end-user traffic; these sit on the `/internal` prefix
//! alongside the health handler.

use crate::error::ApiError;
use crate::AppState;
use authz_core::audit::PendingAuditRecord;
use authz_core::models::{AuditDecision, RiskLevel};
use axum::{extract::Path, extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;
use std::net::{IpAddr, Ipv4Addr};
use uuid::Uuid;

fn internal_event(subject_id: Uuid, session_id: Option<Uuid>, action: &str) -> PendingAuditRecord {
    PendingAuditRecord {
        subject_id,
        session_id,
        action: action.to_string(),
        resource: None,
        decision: AuditDecision::Revoked,
        policy_package: None,
        policy_rule: None,
        roles: Vec::new(),
        entitlements: Vec::new(),
        risk_level: RiskLevel::Low,
        mfa_verified: false,
        ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED).to_string(),
        user_agent: "internal:admin-api".to_string(),
        evaluated_at: Utc::now(),
    }
}

pub async fn revoke_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // Resolve the subject before revoking — an idempotent second call on an
    // already-gone session still succeeds but has nothing left to attribute
    // the audit event to.
    let subject_id = state
        .sessions
        .get(id)
        .await?
        .live()
        .map(|s| s.subject_id);

    state.sessions.revoke(id).await?;

    if let Some(subject_id) = subject_id {
        state
            .audit
            .submit(internal_event(subject_id, Some(id), "SESSION_REVOKED"));
    }

    Ok(Json(json!({ "revoked": id })))
}

pub async fn revoke_all_for_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let count = state.sessions.revoke_all_for_subject(subject_id).await?;

    state.audit.submit(PendingAuditRecord {
        resource: Some(format!("revoked_count={count}")),
        ..internal_event(subject_id, None, "SESSIONS_REVOKED_SUBJECT")
    });

    Ok(Json(json!({ "subject_id": subject_id, "revoked_count": count })))
}
