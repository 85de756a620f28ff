//! Derived risk profile — not the source of truth, recomputed every request

use crate::models::{RiskLevel, Signal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskProfile {
    pub session_id: Uuid,
    pub subject_id: Uuid,
    /// 0..=100
    pub score: u32,
    pub level: RiskLevel,
    pub signals: Vec<Signal>,
    pub evaluated_at: DateTime<Utc>,
}
