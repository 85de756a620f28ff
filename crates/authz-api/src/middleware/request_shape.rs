//! Secure-route input gate
//!
//! Runs before [`crate::middleware::auth::pipeline_middleware`] so a
//! malformed or oversized request never reaches session/device resolution:
//! payloads over a configured byte ceiling are rejected `413`; requests with
//! an unreasonable number of query keys or path segments are rejected `400`.
//! Neither check consumes the request body — `Content-Length` is trusted
//! for the size check, keeping this gate header-only ahead of the
//! body-reading handlers.

use authz_core::error::AuthzError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::AppState;

pub const MAX_QUERY_KEYS: usize = 50;
pub const MAX_PATH_SEGMENTS: usize = 20;

fn content_length(req: &Request) -> Option<usize> {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
}

fn query_key_count(req: &Request) -> usize {
    match req.uri().query() {
        Some(q) if !q.is_empty() => q.split('&').count(),
        _ => 0,
    }
}

fn path_segment_count(req: &Request) -> usize {
    req.uri()
        .path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .count()
}

pub async fn request_shape_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(size) = content_length(&req) {
        if size > state.max_body_bytes {
            return Err(ApiError::from(AuthzError::PayloadTooLarge {
                size,
                max: state.max_body_bytes,
            }));
        }
    }

    let query_keys = query_key_count(&req);
    if query_keys > MAX_QUERY_KEYS {
        return Err(ApiError::from(AuthzError::MalformedInput(format!(
            "too many query keys: {query_keys} (max {MAX_QUERY_KEYS})"
        ))));
    }

    let path_segments = path_segment_count(&req);
    if path_segments > MAX_PATH_SEGMENTS {
        return Err(ApiError::from(AuthzError::MalformedInput(format!(
            "too many path segments: {path_segments} (max {MAX_PATH_SEGMENTS})"
        ))));
    }

    Ok(next.run(req).await)
}
