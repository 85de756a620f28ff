//! Assembles the fixed policy input schema (C7)

use crate::models::{
    EntitlementGrant, PolicyInput, PolicyInputRisk, PolicyInputSubject, PolicyInputTenant,
    RiskLevel, Session, TenantContext,
};

pub struct PolicyInputBuilder;

impl PolicyInputBuilder {
    pub fn build(
        session: &Session,
        tenant: &TenantContext,
        risk_level: RiskLevel,
        resource: impl Into<String>,
        action: impl Into<String>,
        entitlements: &[EntitlementGrant],
    ) -> PolicyInput {
        let scopes: Vec<String> = entitlements
            .iter()
            .flat_map(|e| e.scopes.iter().cloned())
            .collect();

        PolicyInput {
            tenant: PolicyInputTenant {
                id: tenant.id,
                plan: tenant.plan.clone(),
                throttled: tenant.throttled,
            },
            subject: PolicyInputSubject {
                id: session.subject_id,
                mfa_verified: session.mfa_verified,
            },
            risk: PolicyInputRisk { risk_level },
            resource: resource.into(),
            action: action.into(),
            entitlements: if scopes.is_empty() { None } else { Some(scopes) },
        }
    }
}
