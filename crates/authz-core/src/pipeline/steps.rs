//! The six guarded steps of the pipeline (C8). Audit emission is not one of
//! these: it runs unconditionally after the chain, whatever the outcome —
//! see [`super::Pipeline::run`].

use crate::error::AuthzError;
use crate::models::{RiskLevel, SessionState};
use crate::pipeline::context::PipelineContext;
use crate::services::policy_client::PolicyClient;
use crate::services::policy_input_builder::PolicyInputBuilder;
use crate::services::rate_limiter::{RateCounter, RateLimitCaps, RateLimitDecision, RateLimiter};
use crate::services::risk_engine::RiskEngine;
use crate::services::risk_history::RiskHistoryStore;
use crate::services::risk_signals::SignalContext;
use crate::services::session_store::{SessionRiskBinder, SessionStore};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait PipelineStep: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), AuthzError>;
}

fn check_cancelled(ctx: &PipelineContext) -> Result<(), AuthzError> {
    if ctx.cancellation.is_cancelled() {
        Err(AuthzError::Cancelled)
    } else {
        Ok(())
    }
}

/// Step 1: `requireSession`.
pub struct RequireSessionStep {
    pub sessions: Arc<dyn SessionStore>,
}

#[async_trait]
impl PipelineStep for RequireSessionStep {
    fn name(&self) -> &'static str {
        "requireSession"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), AuthzError> {
        check_cancelled(ctx)?;
        match self.sessions.get(ctx.session_id).await? {
            SessionState::Live(session) if session.is_live(ctx.now) => {
                ctx.session = Some(session);
                Ok(())
            }
            SessionState::Live(_) => Err(AuthzError::SessionInvalid {
                reason: "expired".to_string(),
            }),
            SessionState::Revoked => Err(AuthzError::SessionInvalid {
                reason: "revoked".to_string(),
            }),
            SessionState::Absent => Err(AuthzError::SessionInvalid {
                reason: "absent".to_string(),
            }),
        }
    }
}

/// Step 2: `enforceDeviceBinding`. Pure — no external dependency.
pub struct EnforceDeviceBindingStep;

#[async_trait]
impl PipelineStep for EnforceDeviceBindingStep {
    fn name(&self) -> &'static str {
        "enforceDeviceBinding"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), AuthzError> {
        check_cancelled(ctx)?;
        let session = ctx.session();
        match (&session.device_id, &ctx.presented_device_id) {
            (Some(bound), Some(presented)) if bound != presented => Err(AuthzError::DeviceMismatch),
            _ => Ok(()),
        }
    }
}

/// Step 3: `continuousAccessEvaluation`. Recomputes risk every request and
/// has the authority to terminate the session mid-flight on CRITICAL.
pub struct ContinuousAccessEvaluationStep {
    pub engine: Arc<RiskEngine>,
    pub history: Arc<dyn RiskHistoryStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub binder: SessionRiskBinder,
}

#[async_trait]
impl PipelineStep for ContinuousAccessEvaluationStep {
    fn name(&self) -> &'static str {
        "continuousAccessEvaluation"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), AuthzError> {
        check_cancelled(ctx)?;
        let session = ctx.session().clone();

        let known_ips = self.history.known_ips(session.subject_id).await?;
        let last_seen = self.history.last_seen(session.subject_id).await?;
        let recent_failed_attempts = self
            .history
            .recent_failed_attempts(session.subject_id)
            .await?;

        let signal_ctx = SignalContext {
            subject_id: session.subject_id,
            current_ip: ctx.ip,
            known_ips,
            current_device: ctx.presented_device_id.clone(),
            bound_device: session.device_id.clone(),
            last_seen_ip: last_seen.map(|(ip, _)| ip),
            last_seen_at: last_seen.map(|(_, at)| at),
            now: ctx.now,
            recent_failed_attempts,
        };

        let profile = self.engine.evaluate(session.id, &signal_ctx);

        self.history
            .record_seen(session.subject_id, ctx.ip, ctx.now)
            .await?;
        self.sessions
            .touch_risk(session.id, profile.level, ctx.now)
            .await?;

        if self.binder.requires_termination(profile.level) {
            self.sessions.revoke(session.id).await?;
            ctx.risk = Some(profile.clone());
            return Err(AuthzError::SessionTerminated {
                level: profile.level,
            });
        }

        ctx.risk = Some(profile);
        Ok(())
    }
}

/// Step 4: `riskThrottle`.
pub struct RiskThrottleStep<C: RateCounter> {
    pub limiter: RateLimiter<C>,
}

#[async_trait]
impl<C: RateCounter + 'static> PipelineStep for RiskThrottleStep<C> {
    fn name(&self) -> &'static str {
        "riskThrottle"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), AuthzError> {
        check_cancelled(ctx)?;
        let level = ctx
            .risk
            .as_ref()
            .map(|r| r.level)
            .unwrap_or(RiskLevel::Low);
        match self.limiter.check(ctx.session().id, level).await? {
            RateLimitDecision::Admit { .. } => Ok(()),
            RateLimitDecision::Reject { limit } => Err(AuthzError::RateLimited {
                limit,
                window_secs: crate::services::rate_limiter::WINDOW_SECS,
            }),
        }
    }
}

/// Step 5: `buildPolicyInput`.
#[derive(Default)]
pub struct BuildPolicyInputStep;

impl BuildPolicyInputStep {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PipelineStep for BuildPolicyInputStep {
    fn name(&self) -> &'static str {
        "buildPolicyInput"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), AuthzError> {
        check_cancelled(ctx)?;
        let level = ctx
            .risk
            .as_ref()
            .map(|r| r.level)
            .unwrap_or(RiskLevel::Low);
        let session = ctx.session().clone();
        let input = PolicyInputBuilder::build(
            &session,
            &ctx.tenant,
            level,
            ctx.resource.clone(),
            ctx.action.clone(),
            &ctx.entitlements,
        );
        ctx.policy_input = Some(input);
        Ok(())
    }
}

/// Step 6: `opaAuthorize`. Failures (timeouts, non-2xx) surface as
/// `allow=false` from the client itself, never as a raised error from this
/// step — only an explicit `PolicyDenied` short-circuits here.
pub struct OpaAuthorizeStep {
    pub client: Arc<dyn PolicyClient>,
}

#[async_trait]
impl PipelineStep for OpaAuthorizeStep {
    fn name(&self) -> &'static str {
        "opaAuthorize"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), AuthzError> {
        check_cancelled(ctx)?;
        let input = ctx
            .policy_input
            .as_ref()
            .expect("buildPolicyInput populates this before opaAuthorize runs");
        let decision = self.client.decide(input).await?;
        if !decision.allow {
            let explain = decision.explain.as_ref().map(|e| format!("{}/{}", e.package, e.rule));
            ctx.decision = Some(decision);
            return Err(AuthzError::PolicyDenied { explain });
        }
        ctx.decision = Some(decision);
        Ok(())
    }
}
