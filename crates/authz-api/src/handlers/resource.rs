//! A protected resource demo endpoint — exercises the full pipeline end to
//! end so request-scoped state (session, risk, decision) has something
//! concrete to drive against.

use authz_core::pipeline::PipelineContext;
use axum::{extract::Extension, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

pub async fn get_resource(Extension(ctx): Extension<Arc<PipelineContext>>) -> impl IntoResponse {
    let decision = ctx.decision.as_ref();
    Json(json!({
        "resource": ctx.resource,
        "action": ctx.action,
        "subject_id": ctx.session().subject_id,
        "risk_level": ctx.risk.as_ref().map(|r| r.level),
        "allow": decision.map(|d| d.allow).unwrap_or(false),
    }))
}
