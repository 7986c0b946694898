use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::entities::user::{self, UserRole};
use crate::services::users::{LoginInput, LoginOutcome, RegisterInput};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateStaffUserRequest {
    #[serde(flatten)]
    pub account: RegisterInput,
    pub role: UserRole,
    pub vendor_id: Option<Uuid>,
}

/// Self-service customer registration.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> ApiResult<user::Model> {
    let created = state.services.users.register(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> ApiResult<LoginOutcome> {
    let outcome = state.services.users.login(input).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

async fn me(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<user::Model> {
    let found = state.services.users.get_user(user.user_id).await?;
    Ok(Json(ApiResponse::success(found)))
}

/// Admin: provision vendor or admin accounts.
async fn create_staff_user(
    State(state): State<AppState>,
    Json(request): Json<CreateStaffUserRequest>,
) -> ApiResult<user::Model> {
    let created = state
        .services
        .users
        .create_staff_user(request.account, request.role, request.vendor_id)
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn authed_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// Nested under /admin.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/users", post(create_staff_user))
}
