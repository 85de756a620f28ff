//! Pipeline-driven authorization middleware (C8 at the HTTP boundary)
//!
//! Extracts the access credential and device header, runs the full ordered
//! hook chain (`authz_core::pipeline::Pipeline`), and either lets the request
//! through with the resolved [`PipelineContext`] attached to its extensions,
//! or short-circuits straight to the mapped HTTP response. Handlers never
//! see a raw `AuthzError` — this is the only place the pipeline's outcome is
//! translated.

use crate::error::ApiError;
use crate::AppState;
use authz_core::error::AuthzError;
use authz_core::models::TenantContext;
use authz_core::pipeline::{PipelineContext, StepOutcome};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const DEVICE_ID_HEADER: &str = "x-device-id";

fn cookie_value(req: &Request, name: &str) -> Option<String> {
    req.headers()
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|cookie| {
                let mut parts = cookie.trim().splitn(2, '=');
                match (parts.next(), parts.next()) {
                    (Some(n), Some(v)) if n == name => Some(v.to_string()),
                    _ => None,
                }
            })
        })
}

fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or_else(|| IpAddr::from([0, 0, 0, 0]))
}

pub async fn pipeline_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let access_token = cookie_value(&req, ACCESS_TOKEN_COOKIE).ok_or_else(|| {
        AuthzError::SessionInvalid {
            reason: "missing access token".to_string(),
        }
    })?;

    let claims =
        authz_crypto::verify_access_token(&access_token, &state.jwt_secret, &state.jwt_audience)
            .map_err(|e| AuthzError::SessionInvalid {
                reason: e.to_string(),
            })?;

    let presented_device_id = req
        .headers()
        .get(DEVICE_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_string();

    let ip = client_ip(&req);
    let action = req.method().as_str().to_lowercase();
    let resource = req.uri().path().to_string();

    // Tenant lifecycle (plan, throttling flags) belongs to a collaborator
    // this gateway doesn't own; until that collaborator exists, every
    // subject resolves to an unthrottled default plan derived from the
    // session's own tenant id.
    let tenant = TenantContext {
        id: claims.tid,
        plan: "standard".to_string(),
        throttled: false,
    };

    let mut ctx = PipelineContext::new(
        claims.sid,
        claims.sub,
        presented_device_id,
        ip,
        user_agent,
        resource,
        action,
        tenant,
        CancellationToken::new(),
        Utc::now(),
    );

    ctx.entitlements = state
        .entitlements
        .active_for_subject(claims.sub)
        .await?
        .iter()
        .map(authz_core::models::EntitlementGrant::from)
        .collect();

    match state.pipeline.run(ctx).await {
        StepOutcome::Allowed(ctx) => {
            let mut req = req;
            req.extensions_mut().insert(Arc::new(*ctx));
            Ok(next.run(req).await)
        }
        StepOutcome::Denied(e) => Err(ApiError::from(e)),
    }
}
