//! HTTP boundary for the authorization gateway
//!
//! Everything here is glue: [`middleware::pipeline_middleware`] drives the
//! ordered hook chain from `authz-core` and translates its outcome into a
//! response; handlers only see a populated [`authz_core::pipeline::PipelineContext`]
//! or never run at all.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;

use authz_core::services::background::AsyncAuditLogger;
use authz_core::services::entitlement_service::EntitlementService;
use authz_core::services::session_store::SessionStore;
use secrecy::Secret;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

/// Everything a handler or the pipeline middleware needs, threaded through
/// every request via axum's `State` extractor — constructed once at
/// startup in `main`, never rebuilt per request.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<authz_core::pipeline::Pipeline>,
    pub sessions: Arc<dyn SessionStore>,
    pub entitlements: Arc<EntitlementService>,
    pub audit: Arc<AsyncAuditLogger>,
    pub audit_dead_letters: Arc<AtomicU64>,
    pub jwt_secret: Secret<String>,
    pub jwt_audience: String,
    pub max_body_bytes: usize,
}

pub fn app(state: AppState) -> axum::Router {
    router::api_router().with_state(state)
}
