//! Anti-replay nonce contract
//!
//! Backed by `anti-replay:{sha256(nonce)}` in the shared store. Nonces are
//! hashed by the caller before they ever reach this trait — see
//! [`crate::models::ReplayNonce`] — so a leaked store dump never reveals the
//! plaintext nonce.

use crate::error::AuthzError;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait ReplayNonceStore: Send + Sync {
    /// Atomically claims `nonce_hash` (SETNX semantics). Returns `true` the
    /// first time a given hash is claimed within its TTL, `false` on every
    /// subsequent attempt — a replay.
    async fn claim(&self, nonce_hash: &str, ttl: Duration) -> Result<bool, AuthzError>;
}
