//! Operational health, including the audit queue's drop and dead-letter
//! counters so backpressure is visible before the channel saturates.

use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::atomic::Ordering;

pub async fn internal_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "audit": {
            "dropped_at_producer": state.audit.dropped_count(),
            "dead_lettered": state.audit_dead_letters.load(Ordering::Relaxed),
        }
    }))
}
