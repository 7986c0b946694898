use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::entities::{
    inquiry::{self, InquiryStatus},
    inquiry_message,
    user::UserRole,
};
use crate::errors::ServiceError;
use crate::handlers::common::{PaginatedResponse, PaginationParams};
use crate::services::inquiries::{CreateInquiryInput, InquiryFilter, InquiryMetrics};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct OpenInquiryRequest {
    pub vendor_id: Uuid,
    pub product_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: InquiryStatus,
}

#[derive(Debug, Deserialize)]
pub struct InquiryListQuery {
    pub status: Option<InquiryStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct InquiryThread {
    #[serde(flatten)]
    pub inquiry: inquiry::Model,
    pub messages: Vec<inquiry_message::Model>,
}

fn assert_thread_access(
    user: &AuthenticatedUser,
    thread: &inquiry::Model,
) -> Result<(), ServiceError> {
    let allowed = user.is_admin()
        || thread.customer_id == user.user_id
        || user.vendor_id == Some(thread.vendor_id);
    if allowed {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "You do not have access to this inquiry".to_string(),
        ))
    }
}

/// Customer opens a thread with a vendor.
async fn open_inquiry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<OpenInquiryRequest>,
) -> ApiResult<InquiryThread> {
    let (created, first_message) = state
        .services
        .inquiries
        .create_inquiry(CreateInquiryInput {
            customer_id: user.user_id,
            vendor_id: request.vendor_id,
            product_id: request.product_id,
            order_id: request.order_id,
            subject: request.subject,
            body: request.body,
        })
        .await?;
    Ok(Json(ApiResponse::success(InquiryThread {
        inquiry: created,
        messages: vec![first_message],
    })))
}

/// Lists threads visible to the caller: own threads for customers, the
/// vendor's inbox for vendor accounts, everything for admins.
async fn list_inquiries(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<InquiryListQuery>,
) -> ApiResult<PaginatedResponse<inquiry::Model>> {
    let params = PaginationParams {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }
    .clamped();

    let filter = match user.role {
        UserRole::Admin => InquiryFilter {
            status: query.status,
            ..Default::default()
        },
        UserRole::Vendor => InquiryFilter {
            vendor_id: Some(user.vendor_id.ok_or_else(|| {
                ServiceError::Forbidden("Account is not linked to a vendor".to_string())
            })?),
            status: query.status,
            ..Default::default()
        },
        UserRole::Customer => InquiryFilter {
            customer_id: Some(user.user_id),
            status: query.status,
            ..Default::default()
        },
    };

    let (inquiries, total) = state
        .services
        .inquiries
        .list_inquiries(filter, params.page, params.per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        inquiries,
        params.page,
        params.per_page,
        total,
    ))))
}

async fn get_inquiry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(inquiry_id): Path<Uuid>,
) -> ApiResult<InquiryThread> {
    let (thread, messages) = state.services.inquiries.get_inquiry(inquiry_id).await?;
    assert_thread_access(&user, &thread)?;
    Ok(Json(ApiResponse::success(InquiryThread {
        inquiry: thread,
        messages,
    })))
}

async fn add_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(inquiry_id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> ApiResult<inquiry_message::Model> {
    let (thread, _) = state.services.inquiries.get_inquiry(inquiry_id).await?;
    assert_thread_access(&user, &thread)?;
    let message = state
        .services
        .inquiries
        .add_message(inquiry_id, user.user_id, user.role, request.body)
        .await?;
    Ok(Json(ApiResponse::success(message)))
}

/// Staff move a thread along its ladder; customers cannot.
async fn update_inquiry_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(inquiry_id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> ApiResult<inquiry::Model> {
    if user.role == UserRole::Customer {
        return Err(ServiceError::Forbidden(
            "Only vendors and admins can change inquiry status".to_string(),
        ));
    }
    let (thread, _) = state.services.inquiries.get_inquiry(inquiry_id).await?;
    assert_thread_access(&user, &thread)?;
    let updated = state
        .services
        .inquiries
        .update_status(inquiry_id, request.status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Vendor dashboard metrics, scoped to the vendor's own inbox.
async fn vendor_metrics(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<InquiryMetrics> {
    let vendor_id = if user.is_admin() {
        None
    } else {
        Some(user.vendor_id.ok_or_else(|| {
            ServiceError::Forbidden("Account is not linked to a vendor".to_string())
        })?)
    };
    let metrics = state.services.inquiries.metrics(vendor_id).await?;
    Ok(Json(ApiResponse::success(metrics)))
}

/// Marketplace-wide metrics.
async fn admin_metrics(State(state): State<AppState>) -> ApiResult<InquiryMetrics> {
    let metrics = state.services.inquiries.metrics(None).await?;
    Ok(Json(ApiResponse::success(metrics)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inquiries", post(open_inquiry).get(list_inquiries))
        .route("/inquiries/:id", get(get_inquiry))
        .route("/inquiries/:id/messages", post(add_message))
        .route("/inquiries/:id/status", post(update_inquiry_status))
}

/// Nested under /vendor.
pub fn vendor_routes() -> Router<AppState> {
    Router::new().route("/inquiries/metrics", get(vendor_metrics))
}

/// Nested under /admin.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/inquiries/metrics", get(admin_metrics))
}
