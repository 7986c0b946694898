use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::entities::category;
use crate::services::catalog::{CreateCategoryInput, UpdateCategoryInput};
use crate::{ApiResponse, ApiResult, AppState};

/// Public category tree, active entries only.
async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<category::Model>> {
    let categories = state.services.catalog.list_categories(true).await?;
    Ok(Json(ApiResponse::success(categories)))
}

async fn get_category_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<category::Model> {
    let found = state.services.catalog.get_category_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(found)))
}

async fn list_all_categories(State(state): State<AppState>) -> ApiResult<Vec<category::Model>> {
    let categories = state.services.catalog.list_categories(false).await?;
    Ok(Json(ApiResponse::success(categories)))
}

async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryInput>,
) -> ApiResult<category::Model> {
    let created = state.services.catalog.create_category(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Json(input): Json<UpdateCategoryInput>,
) -> ApiResult<category::Model> {
    let updated = state
        .services
        .catalog
        .update_category(category_id, input)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.catalog.delete_category(category_id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/:slug", get(get_category_by_slug))
}

/// Admin category management; nested under /admin.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(list_all_categories).post(create_category),
        )
        .route(
            "/categories/:id",
            put(update_category).delete(delete_category),
        )
}
