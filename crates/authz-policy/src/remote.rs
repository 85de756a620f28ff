//! Remote HTTP policy engine client
//!
//! Wire protocol: `POST {base}/v1/data/authz/adaptive` with body
//! `{"input": <policy input>}`; a 2xx response must carry
//! `{"result": {"allow": bool, "package"?, "rule"?}}`. A timeout
//! (default 5s), connection error, non-2xx status, or unparsable body
//! all collapse to the same `allow=false` outcome — the remote side is
//! treated as opaque past "did it answer with a 2xx we understand".

use authz_core::error::AuthzError;
use authz_core::models::{PolicyDecision, PolicyExplain, PolicyInput};
use authz_core::services::policy_client::PolicyClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct DecisionRequest<'a> {
    input: &'a PolicyInput,
}

#[derive(Deserialize)]
struct DecisionResponse {
    result: DecisionResult,
}

#[derive(Deserialize)]
struct DecisionResult {
    allow: bool,
    #[serde(default)]
    package: Option<String>,
    #[serde(default)]
    rule: Option<String>,
}

pub struct RemotePolicyClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemotePolicyClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthzError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthzError::Internal(format!("building policy http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PolicyClient for RemotePolicyClient {
    async fn decide(&self, input: &PolicyInput) -> Result<PolicyDecision, AuthzError> {
        let url = format!("{}/v1/data/authz/adaptive", self.base_url.trim_end_matches('/'));
        let response = match self.http.post(&url).json(&DecisionRequest { input }).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, "policy engine unreachable");
                return Ok(PolicyDecision::deny("policy_unavailable"));
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "policy engine returned non-2xx");
            return Ok(PolicyDecision::deny("policy_unavailable"));
        }

        match response.json::<DecisionResponse>().await {
            Ok(body) => Ok(PolicyDecision {
                allow: body.result.allow,
                explain: match (body.result.package, body.result.rule) {
                    (Some(package), Some(rule)) => Some(PolicyExplain { package, rule }),
                    _ => None,
                },
            }),
            Err(e) => {
                tracing::warn!(error = %e, "policy engine response unparsable");
                Ok(PolicyDecision::deny("policy_unavailable"))
            }
        }
    }
}
