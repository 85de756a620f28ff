//! C5 RateLimiter counter against Redis
//!
//! `rate:{sessionId}` — `INCR`, then `EXPIRE 60` only on the first
//! increment in the window (value == 1 after the increment).

use crate::{rate_key, store_err};
use authz_core::error::AuthzError;
use authz_core::services::rate_limiter::RateCounter;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

pub struct RedisRateCounter {
    conn: ConnectionManager,
}

impl RedisRateCounter {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RateCounter for RedisRateCounter {
    async fn increment(&self, session_id: Uuid, window_secs: u64) -> Result<u64, AuthzError> {
        let mut conn = self.conn.clone();
        let key = rate_key(session_id);
        let count: u64 = conn.incr(&key, 1u64).await.map_err(store_err)?;
        if count == 1 {
            let _: () = conn.expire(&key, window_secs as i64).await.map_err(store_err)?;
        }
        Ok(count)
    }
}
