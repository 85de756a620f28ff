//! Tenant projection consumed by the policy input builder
//!
//! The authorization core does not own tenant lifecycle (that belongs to the
//! multi-tenancy collaborator); it only needs this narrow, already-resolved
//! view to build a policy input.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantContext {
    pub id: Uuid,
    pub plan: String,
    /// Whether the tenant is currently under a global throttle (billing hold,
    /// incident mitigation, etc.) — folded into the policy input so the
    /// policy engine can make plan-aware decisions.
    pub throttled: bool,
}
