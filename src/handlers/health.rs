use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::db;
use crate::{ApiResponse, ApiResult, AppState};

/// Liveness plus a database ping.
async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let database = match db::check_connection(&state.db).await {
        Ok(()) => "up",
        Err(_) => "down",
    };
    Ok(Json(ApiResponse::success(json!({
        "status": if database == "up" { "healthy" } else { "degraded" },
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
