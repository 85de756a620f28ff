//! PolicyClient contract (C6)
//!
//! Two backends are supported — a remote HTTP policy engine and an embedded
//! sandboxed script engine — behind this one trait. The choice is invisible
//! to callers. See `authz-policy` for both implementations plus the
//! decision-cache wrapper.

use crate::error::AuthzError;
use crate::models::{PolicyDecision, PolicyInput};
use async_trait::async_trait;

#[async_trait]
pub trait PolicyClient: Send + Sync {
    async fn decide(&self, input: &PolicyInput) -> Result<PolicyDecision, AuthzError>;
}
