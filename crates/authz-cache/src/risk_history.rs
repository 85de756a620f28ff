//! Per-subject risk history against Redis — feeds the risk signal
//! collectors (C2). Kept separate from session state: this is about the
//! subject across every session, not one session record.
//!
//! `risk:ips:{subjectId}` is a sorted set (member = address, score = unix
//! seconds last seen), trimmed to the most recent 20 addresses so it can't
//! grow unbounded. `risk:lastseen:{subjectId}` is a two-field hash
//! (`ip`, `ts`). `risk:failures:{subjectId}` is a counter the authentication
//! collaborator increments on failed attempts; read-only from here and
//! defaulting to 0 when absent.

use crate::{failures_key, known_ips_key, last_seen_key, store_err};
use authz_core::error::AuthzError;
use authz_core::services::risk_history::RiskHistoryStore;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::net::IpAddr;
use uuid::Uuid;

const MAX_KNOWN_IPS: isize = 20;
const HISTORY_TTL_SECS: i64 = 30 * 24 * 60 * 60;

pub struct RedisRiskHistoryStore {
    conn: ConnectionManager,
}

impl RedisRiskHistoryStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RiskHistoryStore for RedisRiskHistoryStore {
    async fn known_ips(&self, subject_id: Uuid) -> Result<Vec<IpAddr>, AuthzError> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn
            .zrange(known_ips_key(subject_id), 0, -1)
            .await
            .map_err(store_err)?;
        Ok(raw.into_iter().filter_map(|s| s.parse().ok()).collect())
    }

    async fn last_seen(&self, subject_id: Uuid) -> Result<Option<(IpAddr, DateTime<Utc>)>, AuthzError> {
        let mut conn = self.conn.clone();
        let fields: Vec<Option<String>> = conn
            .hget(last_seen_key(subject_id), &["ip", "ts"])
            .await
            .map_err(store_err)?;
        match (fields.first().cloned().flatten(), fields.get(1).cloned().flatten()) {
            (Some(ip), Some(ts)) => {
                let ip: IpAddr = ip.parse().map_err(|_| AuthzError::Internal("bad ip in risk history".into()))?;
                let ts: i64 = ts.parse().map_err(|_| AuthzError::Internal("bad ts in risk history".into()))?;
                Ok(Utc.timestamp_opt(ts, 0).single().map(|at| (ip, at)))
            }
            _ => Ok(None),
        }
    }

    async fn record_seen(&self, subject_id: Uuid, ip: IpAddr, at: DateTime<Utc>) -> Result<(), AuthzError> {
        let mut conn = self.conn.clone();
        let ips_key = known_ips_key(subject_id);
        let seen_key = last_seen_key(subject_id);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .zadd(&ips_key, ip.to_string(), at.timestamp())
            .zremrangebyrank(&ips_key, 0, -(MAX_KNOWN_IPS + 1))
            .expire(&ips_key, HISTORY_TTL_SECS)
            .hset(&seen_key, "ip", ip.to_string())
            .hset(&seen_key, "ts", at.timestamp())
            .expire(&seen_key, HISTORY_TTL_SECS);
        let () = pipe.query_async(&mut conn).await.map_err(store_err)?;
        Ok(())
    }

    async fn recent_failed_attempts(&self, subject_id: Uuid) -> Result<u32, AuthzError> {
        let mut conn = self.conn.clone();
        let count: Option<u32> = conn.get(failures_key(subject_id)).await.map_err(store_err)?;
        Ok(count.unwrap_or(0))
    }
}
