//! Ordered hook chain (C8): early guards -> continuous evaluation ->
//! throttling -> policy input -> decision -> audit.
//!
//! "Hooks replace middleware, order defines trust." No step may execute if
//! any earlier step short-circuits, and the final audit emission always
//! runs, whatever the outcome — a cancelled or denied request is audited
//! too, just never as an ALLOW.

pub mod context;
pub mod steps;

pub use context::PipelineContext;
pub use steps::PipelineStep;

use crate::audit::PendingAuditRecord;
use crate::error::AuthzError;
use crate::models::{AuditDecision, RiskLevel};
use crate::services::background::AsyncAuditLogger;
use std::sync::Arc;

/// The pipeline's result: either every guard passed and the context carries
/// a populated `decision`, or the chain stopped early with the error that
/// caused it.
pub enum StepOutcome {
    Allowed(Box<PipelineContext>),
    Denied(AuthzError),
}

pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    audit: Arc<AsyncAuditLogger>,
}

impl Pipeline {
    pub fn new(steps: Vec<Box<dyn PipelineStep>>, audit: Arc<AsyncAuditLogger>) -> Self {
        Self { steps, audit }
    }

    pub async fn run(&self, mut ctx: PipelineContext) -> StepOutcome {
        let mut failure: Option<AuthzError> = None;
        for step in &self.steps {
            match step.execute(&mut ctx).await {
                Ok(()) => continue,
                Err(e) => {
                    tracing::debug!(step = step.name(), error = %e, "pipeline step short-circuited");
                    failure = Some(e);
                    break;
                }
            }
        }

        self.audit.submit(build_audit_record(&ctx, &failure));

        match failure {
            None => StepOutcome::Allowed(Box::new(ctx)),
            Some(e) => StepOutcome::Denied(e),
        }
    }
}

fn decision_for(failure: &Option<AuthzError>) -> AuditDecision {
    match failure {
        None => AuditDecision::Allow,
        Some(AuthzError::SessionTerminated { .. }) => AuditDecision::Revoked,
        Some(_) => AuditDecision::Deny,
    }
}

fn build_audit_record(ctx: &PipelineContext, failure: &Option<AuthzError>) -> PendingAuditRecord {
    let (policy_package, policy_rule) = ctx
        .decision
        .as_ref()
        .and_then(|d| d.explain.as_ref())
        .map(|e| (Some(e.package.clone()), Some(e.rule.clone())))
        .unwrap_or((None, None));

    let risk_level = ctx.risk.as_ref().map(|r| r.level).unwrap_or(RiskLevel::Low);
    let mfa_verified = ctx.session.as_ref().map(|s| s.mfa_verified).unwrap_or(false);
    let session_id = ctx.session.as_ref().map(|s| s.id);
    let subject_id = ctx
        .session
        .as_ref()
        .map(|s| s.subject_id)
        .unwrap_or(ctx.claimed_subject_id);

    PendingAuditRecord {
        subject_id,
        session_id,
        action: ctx.action.clone(),
        resource: Some(ctx.resource.clone()),
        decision: decision_for(failure),
        policy_package,
        policy_rule,
        roles: Vec::new(),
        entitlements: ctx
            .entitlements
            .iter()
            .flat_map(|e| e.scopes.iter().cloned())
            .collect(),
        risk_level,
        mfa_verified,
        ip: ctx.ip.to_string(),
        user_agent: ctx.user_agent.clone(),
        evaluated_at: ctx.now,
    }
}
