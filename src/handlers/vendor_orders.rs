use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::entities::{
    commission_entry, commission_entry::CommissionStatus, order::OrderStatus, vendor_order,
    vendor_order_item,
};
use crate::errors::ServiceError;
use crate::handlers::common::{PaginatedResponse, PaginationParams};
use crate::services::commissions::{CommissionFilter, CommissionSummary};
use crate::services::vendor_orders::VendorOrderFilter;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct VendorOrderListQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct CommissionListQuery {
    pub status: Option<CommissionStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct VendorOrderWithItems {
    #[serde(flatten)]
    pub vendor_order: vendor_order::Model,
    pub items: Vec<vendor_order_item::Model>,
}

fn pagination(page: Option<u64>, per_page: Option<u64>) -> PaginationParams {
    PaginationParams {
        page: page.unwrap_or(1),
        per_page: per_page.unwrap_or(20),
    }
    .clamped()
}

fn vendor_scope(user: &AuthenticatedUser) -> Result<Option<Uuid>, ServiceError> {
    if user.is_admin() {
        return Ok(None);
    }
    user.vendor_id.map(Some).ok_or_else(|| {
        ServiceError::Forbidden("Account is not linked to a vendor".to_string())
    })
}

/// Lists the authenticated vendor's sub-orders. Admins see all vendors.
async fn list_vendor_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<VendorOrderListQuery>,
) -> ApiResult<PaginatedResponse<vendor_order::Model>> {
    let params = pagination(query.page, query.per_page);
    let filter = VendorOrderFilter {
        vendor_id: vendor_scope(&user)?,
        status: query.status,
    };
    let (vendor_orders, total) = state
        .services
        .vendor_orders
        .list_vendor_orders(filter, params.page, params.per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        vendor_orders,
        params.page,
        params.per_page,
        total,
    ))))
}

async fn get_vendor_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(vendor_order_id): Path<Uuid>,
) -> ApiResult<VendorOrderWithItems> {
    let (found, items) = state
        .services
        .vendor_orders
        .get_vendor_order(vendor_order_id)
        .await?;
    if !user.can_act_for_vendor(found.vendor_id) {
        return Err(ServiceError::Forbidden(
            "You do not have access to this vendor order".to_string(),
        ));
    }
    Ok(Json(ApiResponse::success(VendorOrderWithItems {
        vendor_order: found,
        items,
    })))
}

/// Vendor: move a sub-order along the fulfillment ladder. Delivery settles
/// the commission.
async fn update_vendor_order_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(vendor_order_id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> ApiResult<vendor_order::Model> {
    let (found, _) = state
        .services
        .vendor_orders
        .get_vendor_order(vendor_order_id)
        .await?;
    if !user.can_act_for_vendor(found.vendor_id) {
        return Err(ServiceError::Forbidden(
            "You do not have access to this vendor order".to_string(),
        ));
    }
    let updated = state
        .services
        .vendor_orders
        .update_vendor_order_status(vendor_order_id, request.status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn cancel_vendor_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(vendor_order_id): Path<Uuid>,
) -> ApiResult<vendor_order::Model> {
    let (found, _) = state
        .services
        .vendor_orders
        .get_vendor_order(vendor_order_id)
        .await?;
    if !user.can_act_for_vendor(found.vendor_id) {
        return Err(ServiceError::Forbidden(
            "You do not have access to this vendor order".to_string(),
        ));
    }
    let updated = state
        .services
        .vendor_orders
        .cancel_vendor_order(vendor_order_id)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn list_commissions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<CommissionListQuery>,
) -> ApiResult<PaginatedResponse<commission_entry::Model>> {
    let params = pagination(query.page, query.per_page);
    let filter = CommissionFilter {
        vendor_id: vendor_scope(&user)?,
        status: query.status,
    };
    let (entries, total) = state
        .services
        .commissions
        .list_entries(filter, params.page, params.per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        entries,
        params.page,
        params.per_page,
        total,
    ))))
}

async fn commission_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<CommissionSummary> {
    let summary = state
        .services
        .commissions
        .summary(vendor_scope(&user)?)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// Admin: split a placed order into per-vendor sub-orders.
async fn forward_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Vec<vendor_order::Model>> {
    let created = state.services.vendor_orders.forward_order(order_id).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// Vendor portal routes; nested under /vendor with the vendor role gate.
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_vendor_orders))
        .route("/orders/:id", get(get_vendor_order))
        .route("/orders/:id/status", post(update_vendor_order_status))
        .route("/orders/:id/cancel", post(cancel_vendor_order))
        .route("/commissions", get(list_commissions))
        .route("/commissions/summary", get(commission_summary))
}

/// Admin routes; nested under /admin.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/:id/forward", post(forward_order))
        .route("/commissions", get(list_commissions))
        .route("/commissions/summary", get(commission_summary))
}
