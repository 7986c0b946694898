use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::entities::{banner, homepage_section};
use crate::services::homepage::{
    CreateBannerInput, CreateSectionInput, HomepageView, UpdateBannerInput,
};
use crate::{ApiResponse, ApiResult, AppState};

/// The composed storefront homepage: live banners plus resolved sections.
async fn get_homepage(State(state): State<AppState>) -> ApiResult<HomepageView> {
    let view = state.services.homepage.compose(Utc::now()).await?;
    Ok(Json(ApiResponse::success(view)))
}

// Admin banner management

async fn list_banners(State(state): State<AppState>) -> ApiResult<Vec<banner::Model>> {
    let banners = state.services.homepage.list_banners().await?;
    Ok(Json(ApiResponse::success(banners)))
}

async fn create_banner(
    State(state): State<AppState>,
    Json(input): Json<CreateBannerInput>,
) -> ApiResult<banner::Model> {
    let created = state.services.homepage.create_banner(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

async fn update_banner(
    State(state): State<AppState>,
    Path(banner_id): Path<Uuid>,
    Json(input): Json<UpdateBannerInput>,
) -> ApiResult<banner::Model> {
    let updated = state
        .services
        .homepage
        .update_banner(banner_id, input)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_banner(
    State(state): State<AppState>,
    Path(banner_id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.homepage.delete_banner(banner_id).await?;
    Ok(Json(ApiResponse::success(())))
}

// Admin section management

async fn list_sections(
    State(state): State<AppState>,
) -> ApiResult<Vec<homepage_section::Model>> {
    let sections = state.services.homepage.list_sections().await?;
    Ok(Json(ApiResponse::success(sections)))
}

async fn create_section(
    State(state): State<AppState>,
    Json(input): Json<CreateSectionInput>,
) -> ApiResult<homepage_section::Model> {
    let created = state.services.homepage.create_section(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

async fn delete_section(
    State(state): State<AppState>,
    Path(section_id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.homepage.delete_section(section_id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/homepage", get(get_homepage))
}

/// Nested under /admin.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/banners", get(list_banners).post(create_banner))
        .route("/banners/:id", put(update_banner).delete(delete_banner))
        .route(
            "/homepage-sections",
            get(list_sections).post(create_section),
        )
        .route("/homepage-sections/:id", delete(delete_section))
}
