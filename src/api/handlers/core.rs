use axum::http::Uri;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::api::error::HandlerErr;
use crate::api::types::AppState;

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn handle_unknown(uri: Uri) -> HandlerErr {
    HandlerErr::new("not_implemented", format!("unknown route: {}", uri.path()))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(handle_health))
}
