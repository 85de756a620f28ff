use crate::handlers::{admin, health, resource};
use crate::middleware::{
    pipeline_middleware, request_id_middleware, request_shape_gate, security_headers_middleware,
};
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn api_router() -> Router<AppState> {
    // Protected routes go through the full pipeline: requireSession ->
    // enforceDeviceBinding -> continuousAccessEvaluation -> riskThrottle ->
    // buildPolicyInput -> opaAuthorize -> auditDecision (see authz-core::pipeline).
    // The request-shape gate (body size, query-key/path-segment counts)
    // runs first, ahead of session/device resolution — malformed input is
    // rejected before any session state is even looked up.
    let protected = Router::new()
        .route("/api/*resource", get(resource::get_resource))
        .route_layer(middleware::from_fn(pipeline_middleware))
        .route_layer(middleware::from_fn(request_shape_gate));

    // Internal/operational routes never go through the pipeline — they are
    // for incident response, not end-user traffic.
    let internal = Router::new()
        .route("/internal/health", get(health::internal_health))
        .route("/internal/sessions/:id/revoke", post(admin::revoke_session))
        .route(
            "/internal/subjects/:id/revoke-all",
            post(admin::revoke_all_for_subject),
        );

    Router::new()
        .merge(protected)
        .merge(internal)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
}
