//! Redis-backed implementations of the authorization core's store traits
//!
//! "The session KV, rate-counter KV, and decision cache are shared,
//! externally hosted, and must be treated as the authoritative concurrency
//! primitive" — no layer here keeps an in-process copy of session state
//! across requests. Every store is a thin wrapper over a shared
//! [`redis::aio::ConnectionManager`], which is cheap to clone and
//! reconnects transparently.

pub mod decision_cache;
pub mod rate_counter;
pub mod replay_nonce;
pub mod risk_history;
pub mod session_store;

pub use decision_cache::RedisDecisionCache;
pub use rate_counter::RedisRateCounter;
pub use replay_nonce::RedisReplayNonceStore;
pub use risk_history::RedisRiskHistoryStore;
pub use session_store::RedisSessionStore;

use redis::aio::ConnectionManager;

/// Opens a multiplexed, auto-reconnecting connection shared by every store
/// constructed against it.
pub async fn connect(redis_url: &str) -> anyhow::Result<ConnectionManager> {
    let client = redis::Client::open(redis_url)?;
    let manager = client.get_connection_manager().await?;
    Ok(manager)
}

pub(crate) fn session_key(id: uuid::Uuid) -> String {
    format!("session:{id}")
}

pub(crate) fn subject_index_key(subject_id: uuid::Uuid) -> String {
    format!("subject:sessions:{subject_id}")
}

pub(crate) fn rate_key(session_id: uuid::Uuid) -> String {
    format!("rate:{session_id}")
}

pub(crate) fn decision_key(fingerprint: &str) -> String {
    format!("opa:{fingerprint}")
}

pub(crate) fn replay_key(nonce_hash: &str) -> String {
    format!("anti-replay:{nonce_hash}")
}

pub(crate) fn known_ips_key(subject_id: uuid::Uuid) -> String {
    format!("risk:ips:{subject_id}")
}

pub(crate) fn last_seen_key(subject_id: uuid::Uuid) -> String {
    format!("risk:lastseen:{subject_id}")
}

pub(crate) fn failures_key(subject_id: uuid::Uuid) -> String {
    format!("risk:failures:{subject_id}")
}

pub(crate) fn store_err(e: redis::RedisError) -> authz_core::error::AuthzError {
    authz_core::error::AuthzError::StoreUnavailable(e.to_string())
}
