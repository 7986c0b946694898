use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::entities::{payment_account, vendor};
use crate::errors::ServiceError;
use crate::handlers::common::{PaginatedResponse, PaginationParams};
use crate::services::vendors::{CreateVendorInput, PaymentAccountInput, UpdateVendorInput};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct VendorListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

fn require_vendor_id(user: &AuthenticatedUser) -> Result<Uuid, ServiceError> {
    user.vendor_id.ok_or_else(|| {
        ServiceError::Forbidden("Account is not linked to a vendor".to_string())
    })
}

/// Public vendor directory, active vendors only.
async fn list_vendors(
    State(state): State<AppState>,
    Query(query): Query<VendorListQuery>,
) -> ApiResult<PaginatedResponse<vendor::Model>> {
    let params = PaginationParams {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }
    .clamped();
    let (vendors, total) = state
        .services
        .vendors
        .list_vendors(true, params.page, params.per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        vendors,
        params.page,
        params.per_page,
        total,
    ))))
}

async fn get_vendor_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<vendor::Model> {
    let found = state.services.vendors.get_vendor_by_slug(&slug).await?;
    if !found.is_active {
        return Err(ServiceError::NotFound(format!(
            "Vendor '{}' not found",
            slug
        )));
    }
    Ok(Json(ApiResponse::success(found)))
}

/// Vendor portal: own profile.
async fn get_own_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<vendor::Model> {
    let vendor_id = require_vendor_id(&user)?;
    let found = state.services.vendors.get_vendor(vendor_id).await?;
    Ok(Json(ApiResponse::success(found)))
}

async fn update_own_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(mut input): Json<UpdateVendorInput>,
) -> ApiResult<vendor::Model> {
    let vendor_id = require_vendor_id(&user)?;
    // Vendors cannot change their own commission rate or active flag.
    input.commission_rate = None;
    input.is_active = None;
    let updated = state
        .services
        .vendors
        .update_vendor(vendor_id, input)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn get_own_payment_account(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Option<payment_account::Model>> {
    let vendor_id = require_vendor_id(&user)?;
    let account = state.services.vendors.get_payment_account(vendor_id).await?;
    Ok(Json(ApiResponse::success(account)))
}

async fn upsert_own_payment_account(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<PaymentAccountInput>,
) -> ApiResult<payment_account::Model> {
    let vendor_id = require_vendor_id(&user)?;
    let account = state
        .services
        .vendors
        .upsert_payment_account(vendor_id, input)
        .await?;
    Ok(Json(ApiResponse::success(account)))
}

// Admin

async fn list_all_vendors(
    State(state): State<AppState>,
    Query(query): Query<VendorListQuery>,
) -> ApiResult<PaginatedResponse<vendor::Model>> {
    let params = PaginationParams {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }
    .clamped();
    let (vendors, total) = state
        .services
        .vendors
        .list_vendors(false, params.page, params.per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        vendors,
        params.page,
        params.per_page,
        total,
    ))))
}

async fn create_vendor(
    State(state): State<AppState>,
    Json(input): Json<CreateVendorInput>,
) -> ApiResult<vendor::Model> {
    let created = state.services.vendors.create_vendor(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

async fn update_vendor(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    Json(input): Json<UpdateVendorInput>,
) -> ApiResult<vendor::Model> {
    let updated = state
        .services
        .vendors
        .update_vendor(vendor_id, input)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn verify_payment_account(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> ApiResult<payment_account::Model> {
    let account = state
        .services
        .vendors
        .verify_payment_account(vendor_id)
        .await?;
    Ok(Json(ApiResponse::success(account)))
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/vendors", get(list_vendors))
        .route("/vendors/:slug", get(get_vendor_by_slug))
}

/// Vendor self-service; nested under /vendor.
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_own_profile).put(update_own_profile))
        .route(
            "/payment-account",
            get(get_own_payment_account).put(upsert_own_payment_account),
        )
}

/// Admin vendor management; nested under /admin.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/vendors", get(list_all_vendors).post(create_vendor))
        .route("/vendors/:id", put(update_vendor))
        .route(
            "/vendors/:id/payment-account/verify",
            post(verify_payment_account),
        )
}
