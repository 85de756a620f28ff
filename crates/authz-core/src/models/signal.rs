//! Risk signals — pure, ephemeral evidence derived per request

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    IpAnomaly,
    GeoAnomaly,
    DeviceMismatch,
    ImpossibleTravel,
    BehaviorAnomaly,
    ThreatIntel,
    SessionReuse,
}

/// One piece of evidence contributing to a [`crate::models::RiskProfile`].
/// Never persisted raw — only aggregated into audit records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub signal_type: SignalType,
    /// 1..=10
    pub severity: u8,
    pub evidence: String,
}

impl Signal {
    pub fn new(signal_type: SignalType, severity: u8, evidence: impl Into<String>) -> Self {
        Self {
            signal_type,
            severity: severity.clamp(1, 10),
            evidence: evidence.into(),
        }
    }
}
