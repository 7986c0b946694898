use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::services::seo::{AuditReport, CategoryAuditReport};
use crate::{ApiResponse, ApiResult, AppState};

/// `sitemap.xml` for crawlers.
async fn sitemap(State(state): State<AppState>) -> impl IntoResponse {
    match state.services.seo.generate_sitemap().await {
        Ok(xml) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/xml")],
            xml,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Admin: audit active products against the SEO heuristics.
async fn audit_products(State(state): State<AppState>) -> ApiResult<AuditReport> {
    let report = state.services.seo.audit_catalog().await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Admin: same heuristics over active categories.
async fn audit_categories(State(state): State<AppState>) -> ApiResult<CategoryAuditReport> {
    let report = state.services.seo.audit_categories().await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Admin: backfill missing image alt text from the suggestion template.
async fn fix_alt_text(State(state): State<AppState>) -> ApiResult<Value> {
    let updated = state.services.seo.fix_missing_alt_text().await?;
    Ok(Json(ApiResponse::success(json!({ "updated": updated }))))
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/sitemap.xml", get(sitemap))
}

/// Nested under /admin.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/seo/audit/products", get(audit_products))
        .route("/seo/audit/categories", get(audit_categories))
        .route("/seo/fix-alt-text", post(fix_alt_text))
}
