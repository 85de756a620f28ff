//! Risk-adaptive rate limiting (C5)
//!
//! Per-session fixed 60s window counter. The cap is selected by the
//! session's current risk level; CRITICAL sessions are rejected outright as
//! defense in depth (the pipeline should already have terminated them before
//! this step runs).

use crate::error::AuthzError;
use crate::models::RiskLevel;
use async_trait::async_trait;
use uuid::Uuid;

pub const WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitCaps {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    /// Used only if a risk level is somehow missing its configured cap.
    pub default_cap: u32,
}

impl Default for RateLimitCaps {
    fn default() -> Self {
        Self {
            low: 1000,
            medium: 200,
            high: 20,
            default_cap: 10,
        }
    }
}

impl RateLimitCaps {
    /// `None` for CRITICAL: there is no cap to exceed, every request is
    /// rejected.
    pub fn cap_for(&self, level: RiskLevel) -> Option<u32> {
        match level {
            RiskLevel::Low => Some(self.low),
            RiskLevel::Medium => Some(self.medium),
            RiskLevel::High => Some(self.high),
            RiskLevel::Critical => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Admit { remaining: u32 },
    Reject { limit: u32 },
}

/// Backed by `rate:{sessionId}` in the shared key-value store: INCR then, on
/// the first increment in the window, EXPIRE 60s. Implemented against Redis
/// in `authz-cache`.
#[async_trait]
pub trait RateCounter: Send + Sync {
    /// Returns the counter value *after* incrementing.
    async fn increment(&self, session_id: Uuid, window_secs: u64) -> Result<u64, AuthzError>;
}

pub struct RateLimiter<C: RateCounter> {
    counter: C,
    caps: RateLimitCaps,
}

impl<C: RateCounter> RateLimiter<C> {
    pub fn new(counter: C, caps: RateLimitCaps) -> Self {
        Self { counter, caps }
    }

    pub async fn check(
        &self,
        session_id: Uuid,
        level: RiskLevel,
    ) -> Result<RateLimitDecision, AuthzError> {
        let Some(cap) = self.caps.cap_for(level) else {
            return Ok(RateLimitDecision::Reject { limit: 0 });
        };

        let count = self.counter.increment(session_id, WINDOW_SECS).await?;
        if count > cap as u64 {
            Ok(RateLimitDecision::Reject { limit: cap })
        } else {
            Ok(RateLimitDecision::Admit {
                remaining: cap - count as u32,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct InMemoryCounter {
        value: Arc<AtomicU64>,
    }

    #[async_trait]
    impl RateCounter for InMemoryCounter {
        async fn increment(&self, _session_id: Uuid, _window_secs: u64) -> Result<u64, AuthzError> {
            Ok(self.value.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    #[tokio::test]
    async fn admits_under_cap_and_rejects_over() {
        let counter = InMemoryCounter {
            value: Arc::new(AtomicU64::new(0)),
        };
        let limiter = RateLimiter::new(
            counter,
            RateLimitCaps {
                low: 2,
                ..RateLimitCaps::default()
            },
        );
        let session = Uuid::new_v4();
        assert!(matches!(
            limiter.check(session, RiskLevel::Low).await.unwrap(),
            RateLimitDecision::Admit { remaining: 1 }
        ));
        assert!(matches!(
            limiter.check(session, RiskLevel::Low).await.unwrap(),
            RateLimitDecision::Admit { remaining: 0 }
        ));
        assert!(matches!(
            limiter.check(session, RiskLevel::Low).await.unwrap(),
            RateLimitDecision::Reject { limit: 2 }
        ));
    }

    #[tokio::test]
    async fn critical_risk_always_rejects() {
        let counter = InMemoryCounter {
            value: Arc::new(AtomicU64::new(0)),
        };
        let limiter = RateLimiter::new(counter, RateLimitCaps::default());
        let decision = limiter
            .check(Uuid::new_v4(), RiskLevel::Critical)
            .await
            .unwrap();
        assert!(matches!(decision, RateLimitDecision::Reject { .. }));
    }
}
