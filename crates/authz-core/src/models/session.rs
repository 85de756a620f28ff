//! Session model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Deterministic, additive risk bucket assigned to a session. See
/// [`crate::services::risk_engine`] for the scoring that produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Bucket a 0..=100 score into a level. Ties are inclusive at the lower bound.
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s < 30 => RiskLevel::Low,
            s if s < 60 => RiskLevel::Medium,
            s if s < 80 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Low
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub tenant_id: Uuid,
    pub device_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub risk_level: RiskLevel,
    pub mfa_verified: bool,
    pub last_evaluated_at: DateTime<Utc>,
}

impl Session {
    /// While the record exists and `revoked_at` is unset, the session is live.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// `Get` never returns a bare `Option<Session>` — a session is either live,
/// explicitly revoked (distinct from never having existed, for callers that
/// care), or absent (expired/never created/revoked). See design note
/// "Session record as a sum over states" — mutations become total functions
/// on this variant instead of null-checks over an optional `revokedAt`.
#[derive(Debug, Clone)]
pub enum SessionState {
    Live(Session),
    Revoked,
    Absent,
}

impl SessionState {
    pub fn live(self) -> Option<Session> {
        match self {
            SessionState::Live(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, SessionState::Live(_))
    }
}
