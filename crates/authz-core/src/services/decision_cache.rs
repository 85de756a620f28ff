//! Decision cache contract (part of C6)
//!
//! Backed by `opa:{fingerprint}` in the shared, externally hosted key-value
//! store — never an in-process cache, so every node observes the same
//! cached ALLOW/DENY. TTL is bounded to a few seconds by the caller when
//! calling [`DecisionCacheStore::put`], not by the store itself.

use crate::error::AuthzError;
use crate::models::DecisionCacheEntry;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait DecisionCacheStore: Send + Sync {
    async fn get(&self, fingerprint: &str) -> Result<Option<DecisionCacheEntry>, AuthzError>;
    async fn put(&self, entry: DecisionCacheEntry, ttl: Duration) -> Result<(), AuthzError>;
}
