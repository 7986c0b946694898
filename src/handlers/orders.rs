use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::entities::{order, order_item, order::OrderStatus};
use crate::errors::ServiceError;
use crate::handlers::common::{PaginatedResponse, PaginationParams};
use crate::services::orders::{CreateOrderInput, OrderFilter, OrderLineInput};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub currency: Option<String>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl OrderListQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(20),
        }
        .clamped()
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

fn assert_order_access(user: &AuthenticatedUser, order: &order::Model) -> Result<(), ServiceError> {
    if user.is_admin() || order.customer_id == user.user_id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "You do not have access to this order".to_string(),
        ))
    }
}

/// Places an order for the authenticated customer.
async fn place_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<PlaceOrderRequest>,
) -> ApiResult<OrderWithItems> {
    let (created, items) = state
        .services
        .orders
        .create_order(CreateOrderInput {
            customer_id: user.user_id,
            currency: request.currency,
            shipping_address: request.shipping_address,
            notes: request.notes,
            items: request.items,
        })
        .await?;
    Ok(Json(ApiResponse::success(OrderWithItems {
        order: created,
        items,
    })))
}

/// Lists orders. Customers see their own; admins see everything.
async fn list_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<PaginatedResponse<order::Model>> {
    let pagination = query.pagination();
    let filter = OrderFilter {
        customer_id: if user.is_admin() {
            None
        } else {
            Some(user.user_id)
        },
        status: query.status,
    };
    let (orders, total) = state
        .services
        .orders
        .list_orders(filter, pagination.page, pagination.per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        orders,
        pagination.page,
        pagination.per_page,
        total,
    ))))
}

async fn get_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<OrderWithItems> {
    let (found, items) = state.services.orders.get_order(order_id).await?;
    assert_order_access(&user, &found)?;
    Ok(Json(ApiResponse::success(OrderWithItems {
        order: found,
        items,
    })))
}

/// Lookup by the customer-facing order number.
async fn get_order_by_number(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_number): Path<String>,
) -> ApiResult<OrderWithItems> {
    let (found, items) = state
        .services
        .orders
        .get_order_by_number(&order_number)
        .await?;
    assert_order_access(&user, &found)?;
    Ok(Json(ApiResponse::success(OrderWithItems {
        order: found,
        items,
    })))
}

/// Cancels a single line. Conflicts once the order has been forwarded.
async fn cancel_order_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((order_id, item_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<order::Model> {
    let (found, _) = state.services.orders.get_order(order_id).await?;
    assert_order_access(&user, &found)?;
    let updated = state
        .services
        .orders
        .cancel_order_item(order_id, item_id)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn cancel_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<order::Model> {
    let (found, _) = state.services.orders.get_order(order_id).await?;
    assert_order_access(&user, &found)?;
    let updated = state.services.orders.cancel_order(order_id).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Admin: move an order along the fulfillment ladder.
async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> ApiResult<order::Model> {
    let updated = state
        .services
        .orders
        .update_order_status(order_id, request.status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Customer-facing order routes; require authentication.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(place_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/by-number/:number", get(get_order_by_number))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/items/:item_id/cancel", post(cancel_order_item))
}

/// Admin order routes; nested under /admin.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/orders/:id/status", put(update_order_status))
}
