//! Policy decisions and their short-TTL cache entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyExplain {
    pub package: String,
    pub rule: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub allow: bool,
    pub explain: Option<PolicyExplain>,
}

impl PolicyDecision {
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allow: false,
            explain: Some(PolicyExplain {
                package: "unavailable".to_string(),
                rule: reason.into(),
            }),
        }
    }
}

/// Cached under `opa:{fingerprint}`, TTL bounded to a few seconds so a
/// stale ALLOW cannot outlive a session that has since been killed by
/// risk escalation or entitlement revoke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionCacheEntry {
    pub fingerprint: String,
    pub decision: PolicyDecision,
    pub expires_at: DateTime<Utc>,
}
