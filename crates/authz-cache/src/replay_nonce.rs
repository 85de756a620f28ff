//! Anti-replay nonce store against Redis
//!
//! `anti-replay:{sha256(nonce)}` — `SET NX EX <replay ttl>`. `SET NX`
//! returning `nil` means the key already existed: a replay.

use crate::{replay_key, store_err};
use authz_core::error::AuthzError;
use authz_core::services::replay::ReplayNonceStore;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

pub struct RedisReplayNonceStore {
    conn: ConnectionManager,
}

impl RedisReplayNonceStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ReplayNonceStore for RedisReplayNonceStore {
    async fn claim(&self, nonce_hash: &str, ttl: Duration) -> Result<bool, AuthzError> {
        let mut conn = self.conn.clone();
        let claimed: bool = conn
            .set_nx(replay_key(nonce_hash), true)
            .await
            .map_err(store_err)?;
        if claimed {
            let _: () = conn
                .expire(replay_key(nonce_hash), ttl.as_secs().max(1) as i64)
                .await
                .map_err(store_err)?;
        }
        Ok(claimed)
    }
}
