//! C1 SessionStore against Redis
//!
//! Keys: `session:{id}` (JSON, `EX` = session TTL) and
//! `subject:sessions:{subjectId}` (SET of ids, `EX` = TTL + safety margin).
//! `touch_risk` is a read-modify-write that preserves the record's
//! remaining TTL rather than renewing it — session TTL is fixed-from-
//! creation, not sliding (see design notes / DESIGN.md).

use crate::{session_key, store_err, subject_index_key};
use authz_core::error::AuthzError;
use authz_core::models::{RiskLevel, Session, SessionState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn ttl_secs(session: &Session) -> i64 {
        (session.expires_at - Utc::now()).num_seconds().max(1)
    }
}

#[async_trait]
impl authz_core::services::session_store::SessionStore for RedisSessionStore {
    async fn create(&self, session: Session) -> Result<Session, AuthzError> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(&session)?;
        let ttl = Self::ttl_secs(&session) as u64;
        let index_ttl = ttl + 60;

        let () = redis::pipe()
            .atomic()
            .set_ex(session_key(session.id), payload, ttl)
            .sadd(subject_index_key(session.subject_id), session.id.to_string())
            .expire(subject_index_key(session.subject_id), index_ttl as i64)
            .query_async(&mut conn)
            .await
            .map_err(store_err)?;

        Ok(session)
    }

    async fn get(&self, session_id: Uuid) -> Result<SessionState, AuthzError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(session_key(session_id)).await.map_err(store_err)?;
        match raw {
            None => Ok(SessionState::Absent),
            Some(json) => {
                let session: Session = serde_json::from_str(&json)?;
                if session.revoked_at.is_some() {
                    Ok(SessionState::Revoked)
                } else {
                    Ok(SessionState::Live(session))
                }
            }
        }
    }

    async fn touch_risk(
        &self,
        session_id: Uuid,
        level: RiskLevel,
        evaluated_at: DateTime<Utc>,
    ) -> Result<(), AuthzError> {
        let mut conn = self.conn.clone();
        let key = session_key(session_id);

        let raw: Option<String> = conn.get(&key).await.map_err(store_err)?;
        let Some(json) = raw else {
            // No-op if the session vanished underneath us.
            return Ok(());
        };
        let mut session: Session = serde_json::from_str(&json)?;
        let remaining_ttl: i64 = conn.ttl(&key).await.map_err(store_err)?;
        if remaining_ttl <= 0 {
            return Ok(());
        }

        session.risk_level = level;
        session.last_evaluated_at = evaluated_at;
        let payload = serde_json::to_string(&session)?;
        let _: () = conn
            .set_ex(&key, payload, remaining_ttl as u64)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn revoke(&self, session_id: Uuid) -> Result<(), AuthzError> {
        let mut conn = self.conn.clone();
        let key = session_key(session_id);

        let raw: Option<String> = conn.get(&key).await.map_err(store_err)?;
        let subject_id = raw.and_then(|json| serde_json::from_str::<Session>(&json).ok().map(|s| s.subject_id));

        let _: () = conn.del(&key).await.map_err(store_err)?;
        if let Some(subject_id) = subject_id {
            let _: () = conn
                .srem(subject_index_key(subject_id), session_id.to_string())
                .await
                .map_err(store_err)?;
        }
        Ok(())
    }

    async fn revoke_all_for_subject(&self, subject_id: Uuid) -> Result<u64, AuthzError> {
        let mut conn = self.conn.clone();
        let index_key = subject_index_key(subject_id);

        let ids: Vec<String> = conn.smembers(&index_key).await.map_err(store_err)?;
        if ids.is_empty() {
            return Ok(0);
        }

        let keys: Vec<String> = ids.iter().map(|id| format!("session:{id}")).collect();
        let mut pipe = redis::pipe();
        pipe.atomic();
        for key in &keys {
            pipe.del(key);
        }
        pipe.del(&index_key);
        let () = pipe.query_async(&mut conn).await.map_err(store_err)?;

        Ok(ids.len() as u64)
    }
}
