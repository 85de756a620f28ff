//! Short-TTL decision cache wrapping any [`PolicyClient`]
//!
//! Keyed by [`authz_core::canonical::fingerprint`] of the policy input, so
//! the cache key is stable across hosts and process restarts. The TTL is
//! the caller's responsibility to bound to a few seconds: a stale
//! `allow=true` must not outlive a risk escalation or entitlement revoke
//! by more than this window.

use authz_core::canonical;
use authz_core::error::AuthzError;
use authz_core::models::{DecisionCacheEntry, PolicyDecision, PolicyInput};
use authz_core::services::decision_cache::DecisionCacheStore;
use authz_core::services::policy_client::PolicyClient;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

pub struct CachingPolicyClient<C> {
    inner: Arc<dyn PolicyClient>,
    cache: C,
    ttl: Duration,
}

impl<C: DecisionCacheStore> CachingPolicyClient<C> {
    pub fn new(inner: Arc<dyn PolicyClient>, cache: C, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl<C: DecisionCacheStore> PolicyClient for CachingPolicyClient<C> {
    async fn decide(&self, input: &PolicyInput) -> Result<PolicyDecision, AuthzError> {
        let fingerprint =
            canonical::fingerprint(input).map_err(|e| AuthzError::Internal(e.to_string()))?;

        if let Some(entry) = self.cache.get(&fingerprint).await? {
            if entry.expires_at > Utc::now() {
                return Ok(entry.decision);
            }
        }

        let decision = self.inner.decide(input).await?;

        let entry = DecisionCacheEntry {
            fingerprint: fingerprint.clone(),
            decision: decision.clone(),
            expires_at: Utc::now() + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::seconds(5)),
        };
        self.cache.put(entry, self.ttl).await?;

        Ok(decision)
    }
}
