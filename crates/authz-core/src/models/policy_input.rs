//! Fixed JSON schema handed to the policy engine
//!
//! Serialization must be canonical (sorted keys, UTF-8, no insignificant
//! whitespace) — see [`crate::canonical`] — so the decision-cache
//! fingerprint and the audit record's `policy_input_hash` are reproducible
//! across hosts.

use crate::models::RiskLevel;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyInputTenant {
    pub id: Uuid,
    pub plan: String,
    pub throttled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyInputSubject {
    pub id: Uuid,
    pub mfa_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyInputRisk {
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyInput {
    pub tenant: PolicyInputTenant,
    pub subject: PolicyInputSubject,
    pub risk: PolicyInputRisk,
    pub resource: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entitlements: Option<Vec<String>>,
}
