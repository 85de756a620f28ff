//! Decision cache (part of C6) against Redis
//!
//! `opa:{fingerprint}` — `SET EX <= 5s>`. The TTL bound keeps a stale ALLOW
//! from outliving a risk escalation or entitlement revoke by more than the
//! configured cache window.

use crate::{decision_key, store_err};
use authz_core::error::AuthzError;
use authz_core::models::DecisionCacheEntry;
use authz_core::services::decision_cache::DecisionCacheStore;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

pub struct RedisDecisionCache {
    conn: ConnectionManager,
}

impl RedisDecisionCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DecisionCacheStore for RedisDecisionCache {
    async fn get(&self, fingerprint: &str) -> Result<Option<DecisionCacheEntry>, AuthzError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(decision_key(fingerprint)).await.map_err(store_err)?;
        raw.map(|json| serde_json::from_str(&json).map_err(AuthzError::from))
            .transpose()
    }

    async fn put(&self, entry: DecisionCacheEntry, ttl: Duration) -> Result<(), AuthzError> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(&entry)?;
        let _: () = conn
            .set_ex(decision_key(&entry.fingerprint), payload, ttl.as_secs().max(1))
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
