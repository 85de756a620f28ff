//! Explicit, revocable grants consumed by the policy input builder

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubjectType {
    User,
    Service,
    ThirdParty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntitlementStatus {
    Active,
    Revoked,
    Expired,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: Uuid,
    pub subject_type: SubjectType,
    pub subject_id: Uuid,
    pub resource_type: String,
    pub resource_id: String,
    pub scopes: Vec<String>,
    pub status: EntitlementStatus,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub granted_by: Uuid,
    pub grant_reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Entitlement {
    /// Active at `now`: status is ACTIVE and now falls within [valid_from, valid_until).
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == EntitlementStatus::Active
            && self.valid_from <= now
            && self.valid_until.map(|until| now < until).unwrap_or(true)
    }

    /// REVOKED/EXPIRED are terminal — a transition back to ACTIVE is never valid.
    pub fn can_transition_to(&self, next: EntitlementStatus) -> bool {
        match self.status {
            EntitlementStatus::Revoked | EntitlementStatus::Expired => false,
            _ => next != self.status,
        }
    }
}

/// Compact projection handed to [`crate::services::policy_input_builder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementGrant {
    pub resource_type: String,
    pub resource_id: String,
    pub scopes: Vec<String>,
}

impl From<&Entitlement> for EntitlementGrant {
    fn from(e: &Entitlement) -> Self {
        Self {
            resource_type: e.resource_type.clone(),
            resource_id: e.resource_id.clone(),
            scopes: e.scopes.clone(),
        }
    }
}
