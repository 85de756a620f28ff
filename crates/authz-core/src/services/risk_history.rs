//! Per-subject history feeding the risk signal collectors
//!
//! Backed by Redis in `authz-cache` (a bounded set of recently seen
//! addresses plus a single last-seen timestamp+address pair per subject).
//! Kept separate from [`crate::services::session_store::SessionStore`]
//! because it is about the subject across sessions, not one session record.

use crate::error::AuthzError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::net::IpAddr;
use uuid::Uuid;

#[async_trait]
pub trait RiskHistoryStore: Send + Sync {
    async fn known_ips(&self, subject_id: Uuid) -> Result<Vec<IpAddr>, AuthzError>;
    async fn last_seen(&self, subject_id: Uuid) -> Result<Option<(IpAddr, DateTime<Utc>)>, AuthzError>;
    async fn record_seen(&self, subject_id: Uuid, ip: IpAddr, at: DateTime<Utc>) -> Result<(), AuthzError>;
    async fn recent_failed_attempts(&self, subject_id: Uuid) -> Result<u32, AuthzError>;
}
