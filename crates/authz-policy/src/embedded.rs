//! Embedded, sandboxed policy evaluator
//!
//! Loads one [`rhai`] script at startup and compiles it once. `decide`
//! calls the script's `decide(input)` function, which must return a map
//! with an `allow` bool and optional `package`/`rule` strings. The engine
//! is built with no filesystem/network/process access registered and
//! bounded operation and expression-depth limits, so a misbehaving or
//! malicious script can neither escape the sandbox nor hang the call.

use authz_core::error::AuthzError;
use authz_core::models::{PolicyDecision, PolicyExplain, PolicyInput};
use authz_core::services::policy_client::PolicyClient;
use async_trait::async_trait;
use rhai::{Engine, Scope, AST};
use serde::Deserialize;

const MAX_OPERATIONS: u64 = 100_000;
const MAX_EXPR_DEPTH: usize = 64;

#[derive(Deserialize)]
struct ScriptDecision {
    allow: bool,
    #[serde(default)]
    package: Option<String>,
    #[serde(default)]
    rule: Option<String>,
}

pub struct EmbeddedPolicyClient {
    engine: Engine,
    ast: AST,
}

impl EmbeddedPolicyClient {
    pub fn from_source(source: &str) -> Result<Self, AuthzError> {
        let mut engine = Engine::new();
        engine.set_max_operations(MAX_OPERATIONS);
        engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH);
        engine.set_max_string_size(64 * 1024);
        engine.set_max_array_size(10_000);
        engine.set_max_map_size(10_000);

        let ast = engine
            .compile(source)
            .map_err(|e| AuthzError::PolicyUnavailable(format!("embedded script failed to compile: {e}")))?;

        Ok(Self { engine, ast })
    }

    pub fn from_file(path: &str) -> Result<Self, AuthzError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| AuthzError::PolicyUnavailable(format!("reading embedded script {path}: {e}")))?;
        Self::from_source(&source)
    }
}

#[async_trait]
impl PolicyClient for EmbeddedPolicyClient {
    async fn decide(&self, input: &PolicyInput) -> Result<PolicyDecision, AuthzError> {
        let dynamic_input = match rhai::serde::to_dynamic(input) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "policy input failed to convert to script value");
                return Ok(PolicyDecision::deny("policy_unavailable"));
            }
        };

        let mut scope = Scope::new();
        let result = self
            .engine
            .call_fn::<rhai::Dynamic>(&mut scope, &self.ast, "decide", (dynamic_input,));

        match result {
            Ok(dynamic_result) => match rhai::serde::from_dynamic::<ScriptDecision>(&dynamic_result) {
                Ok(decision) => Ok(PolicyDecision {
                    allow: decision.allow,
                    explain: match (decision.package, decision.rule) {
                        (Some(package), Some(rule)) => Some(PolicyExplain { package, rule }),
                        _ => None,
                    },
                }),
                Err(e) => {
                    tracing::warn!(error = %e, "embedded script returned an unexpected shape");
                    Ok(PolicyDecision::deny("policy_unavailable"))
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "embedded script evaluation failed");
                Ok(PolicyDecision::deny("policy_unavailable"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authz_core::models::{PolicyInputRisk, PolicyInputSubject, PolicyInputTenant};
    use authz_core::models::RiskLevel;
    use uuid::Uuid;

    fn sample_input(risk_level: RiskLevel, mfa_verified: bool) -> PolicyInput {
        PolicyInput {
            tenant: PolicyInputTenant {
                id: Uuid::new_v4(),
                plan: "pro".into(),
                throttled: false,
            },
            subject: PolicyInputSubject {
                id: Uuid::new_v4(),
                mfa_verified,
            },
            risk: PolicyInputRisk { risk_level },
            resource: "api/x".into(),
            action: "GET".into(),
            entitlements: None,
        }
    }

    const SCRIPT: &str = r#"
        fn decide(input) {
            if input.risk.risk_level == "CRITICAL" {
                return #{ allow: false, package: "adaptive", rule: "risk_critical" };
            }
            if input.risk.risk_level == "MEDIUM" && !input.subject.mfa_verified {
                return #{ allow: false, package: "adaptive", rule: "mfa_required" };
            }
            #{ allow: true }
        }
    "#;

    #[tokio::test]
    async fn allows_low_risk() {
        let client = EmbeddedPolicyClient::from_source(SCRIPT).unwrap();
        let decision = client.decide(&sample_input(RiskLevel::Low, true)).await.unwrap();
        assert!(decision.allow);
    }

    #[tokio::test]
    async fn denies_medium_risk_without_mfa() {
        let client = EmbeddedPolicyClient::from_source(SCRIPT).unwrap();
        let decision = client.decide(&sample_input(RiskLevel::Medium, false)).await.unwrap();
        assert!(!decision.allow);
        assert_eq!(decision.explain.unwrap().rule, "mfa_required");
    }

    #[tokio::test]
    async fn denies_critical_risk_regardless_of_mfa() {
        let client = EmbeddedPolicyClient::from_source(SCRIPT).unwrap();
        let decision = client.decide(&sample_input(RiskLevel::Critical, true)).await.unwrap();
        assert!(!decision.allow);
    }

    #[tokio::test]
    async fn malformed_script_result_denies_rather_than_errors() {
        let client = EmbeddedPolicyClient::from_source("fn decide(input) { 42 }").unwrap();
        let decision = client.decide(&sample_input(RiskLevel::Low, true)).await.unwrap();
        assert!(!decision.allow);
    }
}
