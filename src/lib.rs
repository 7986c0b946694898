/*!
 * Multi-vendor marketplace API.
 *
 * Storefront, vendor portal, and admin back-office over one REST surface:
 * catalog and categories, order placement and vendor forwarding, commission
 * tracking, customer inquiry threads, homepage curation, image optimization,
 * and SEO tooling.
 */

use axum::{routing::get, Json, Router};
use chrono::Utc;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod rate_limiter;
pub mod services;

use crate::auth::{AuthRouterExt, AuthService};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::entities::user::UserRole;
use crate::events::EventSender;
use crate::services::{
    catalog::CatalogService, commissions::CommissionService, homepage::HomepageService,
    images::ImagePipeline, inquiries::InquiryService, orders::OrderService, seo::SeoService,
    users::UserService, vendor_orders::VendorOrderService, vendors::VendorService,
};

/// How many products each homepage carousel resolves to.
const HOMEPAGE_SECTION_SIZE: u64 = 12;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
    pub event_sender: Arc<EventSender>,
    pub auth_service: Arc<AuthService>,
    pub services: AppServices,
}

/// All services, constructed once and cloned into handlers via state.
#[derive(Clone)]
pub struct AppServices {
    pub orders: OrderService,
    pub vendor_orders: VendorOrderService,
    pub commissions: CommissionService,
    pub inquiries: InquiryService,
    pub catalog: CatalogService,
    pub vendors: VendorService,
    pub users: UserService,
    pub homepage: HomepageService,
    pub seo: SeoService,
    pub images: ImagePipeline,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: Arc<AppConfig>, event_sender: Arc<EventSender>) -> Self {
        let auth_service = Arc::new(AuthService::new(
            config.jwt_secret.clone(),
            config.jwt_expiration as i64,
        ));

        let default_rate = Decimal::from_f64(config.default_commission_rate)
            .unwrap_or_else(|| Decimal::new(10, 2));

        let services = AppServices {
            orders: OrderService::new(db.clone(), event_sender.clone()),
            vendor_orders: VendorOrderService::new(db.clone(), event_sender.clone(), default_rate),
            commissions: CommissionService::new(db.clone()),
            inquiries: InquiryService::new(db.clone(), event_sender.clone()),
            catalog: CatalogService::new(db.clone(), event_sender.clone(), &config.uploads_dir),
            vendors: VendorService::new(db.clone(), event_sender.clone()),
            users: UserService::new(db.clone(), event_sender.clone(), auth_service.clone()),
            homepage: HomepageService::new(db.clone(), HOMEPAGE_SECTION_SIZE),
            seo: SeoService::new(db.clone(), config.public_base_url.clone()),
            images: ImagePipeline::new(
                config.image_jpeg_quality,
                config.watermark_text.is_some(),
            ),
        };

        Self {
            db,
            config,
            event_sender,
            auth_service,
            services,
        }
    }
}

/// Standard response envelope.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// The versioned API surface. Public storefront routes are open; vendor and
/// admin groups are gated by role.
pub fn api_v1_routes() -> Router<AppState> {
    let public = Router::new()
        .merge(handlers::health::routes())
        .merge(handlers::users::public_routes())
        .merge(handlers::products::public_routes())
        .merge(handlers::categories::public_routes())
        .merge(handlers::vendors::public_routes())
        .merge(handlers::homepage::public_routes());

    let authed = Router::new()
        .merge(handlers::users::authed_routes())
        .merge(handlers::orders::routes())
        .merge(handlers::inquiries::routes())
        .with_auth();

    let vendor = Router::new()
        .merge(handlers::vendor_orders::vendor_routes())
        .merge(handlers::products::vendor_routes())
        .merge(handlers::vendors::vendor_routes())
        .merge(handlers::inquiries::vendor_routes())
        .with_role(UserRole::Vendor);

    let admin = Router::new()
        .merge(handlers::orders::admin_routes())
        .merge(handlers::vendor_orders::admin_routes())
        .merge(handlers::categories::admin_routes())
        .merge(handlers::vendors::admin_routes())
        .merge(handlers::users::admin_routes())
        .merge(handlers::homepage::admin_routes())
        .merge(handlers::seo::admin_routes())
        .merge(handlers::inquiries::admin_routes())
        .with_role(UserRole::Admin);

    Router::new()
        .route("/status", get(api_status))
        .merge(public)
        .merge(authed)
        .nest("/vendor", vendor)
        .nest("/admin", admin)
}

async fn api_status() -> ApiResult<Value> {
    Ok(Json(ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
    }))))
}
