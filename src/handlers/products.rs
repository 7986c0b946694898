use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::entities::{product, product::ProductStatus, product_image};
use crate::errors::ServiceError;
use crate::handlers::common::{PaginatedResponse, PaginationParams};
use crate::services::catalog::{
    CreateProductInput, ProductFilter, RegisterImageInput, UpdateProductInput,
};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub category_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub featured: Option<bool>,
    pub premium: Option<bool>,
    pub q: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AltTextRequest {
    pub alt_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: product::Model,
    pub images: Vec<product_image::Model>,
}

fn pagination(page: Option<u64>, per_page: Option<u64>) -> PaginationParams {
    PaginationParams {
        page: page.unwrap_or(1),
        per_page: per_page.unwrap_or(20),
    }
    .clamped()
}

/// Ensures the acting vendor owns the product. Admins bypass.
async fn assert_product_ownership(
    state: &AppState,
    user: &AuthenticatedUser,
    product_id: Uuid,
) -> Result<(), ServiceError> {
    let (found, _) = state.services.catalog.get_product(product_id).await?;
    if user.can_act_for_vendor(found.vendor_id) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "You do not have access to this product".to_string(),
        ))
    }
}

/// Public storefront listing; only active products are visible.
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<PaginatedResponse<product::Model>> {
    let params = pagination(query.page, query.per_page);
    let filter = ProductFilter {
        vendor_id: query.vendor_id,
        category_id: query.category_id,
        status: Some(ProductStatus::Active),
        featured: query.featured,
        premium: query.premium,
        q: query.q,
    };
    let (products, total) = state
        .services
        .catalog
        .list_products(filter, params.page, params.per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        products,
        params.page,
        params.per_page,
        total,
    ))))
}

async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<ProductDetail> {
    let (found, images) = state.services.catalog.get_product_by_slug(&slug).await?;
    if found.status != ProductStatus::Active {
        return Err(ServiceError::NotFound(format!(
            "Product '{}' not found",
            slug
        )));
    }
    Ok(Json(ApiResponse::success(ProductDetail {
        product: found,
        images,
    })))
}

/// Vendor portal: list own products in any status.
async fn list_own_products(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<PaginatedResponse<product::Model>> {
    let params = pagination(query.page, query.per_page);
    let vendor_id = match user.vendor_id {
        Some(id) => Some(id),
        None if user.is_admin() => query.vendor_id,
        None => {
            return Err(ServiceError::Forbidden(
                "Account is not linked to a vendor".to_string(),
            ))
        }
    };
    let filter = ProductFilter {
        vendor_id,
        category_id: query.category_id,
        status: None,
        featured: query.featured,
        premium: query.premium,
        q: query.q,
    };
    let (products, total) = state
        .services
        .catalog
        .list_products(filter, params.page, params.per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        products,
        params.page,
        params.per_page,
        total,
    ))))
}

async fn create_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(mut input): Json<CreateProductInput>,
) -> ApiResult<product::Model> {
    // Vendors can only create products for themselves.
    if !user.is_admin() {
        input.vendor_id = user.vendor_id.ok_or_else(|| {
            ServiceError::Forbidden("Account is not linked to a vendor".to_string())
        })?;
    }
    let created = state.services.catalog.create_product(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

async fn update_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> ApiResult<product::Model> {
    assert_product_ownership(&state, &user, product_id).await?;
    let updated = state
        .services
        .catalog
        .update_product(product_id, input)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> ApiResult<()> {
    assert_product_ownership(&state, &user, product_id).await?;
    state.services.catalog.delete_product(product_id).await?;
    Ok(Json(ApiResponse::success(())))
}

async fn register_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<RegisterImageInput>,
) -> ApiResult<product_image::Model> {
    assert_product_ownership(&state, &user, product_id).await?;
    let image = state
        .services
        .catalog
        .register_image(product_id, input)
        .await?;
    Ok(Json(ApiResponse::success(image)))
}

async fn update_image_alt_text(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(image_id): Path<Uuid>,
    Json(request): Json<AltTextRequest>,
) -> ApiResult<product_image::Model> {
    // Look the image up first so ownership is checked before the write.
    let image = product_image::Entity::find_by_id(image_id)
        .one(&*state.db)
        .await
        .map_err(ServiceError::DatabaseError)?
        .ok_or_else(|| ServiceError::NotFound(format!("Image {} not found", image_id)))?;
    assert_product_ownership(&state, &user, image.product_id).await?;
    let updated = state
        .services
        .catalog
        .update_image_alt_text(image_id, request.alt_text)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(image_id): Path<Uuid>,
) -> ApiResult<()> {
    // Look the image up first so ownership is checked before deletion.
    let image = product_image::Entity::find_by_id(image_id)
        .one(&*state.db)
        .await
        .map_err(ServiceError::DatabaseError)?
        .ok_or_else(|| ServiceError::NotFound(format!("Image {} not found", image_id)))?;
    assert_product_ownership(&state, &user, image.product_id).await?;
    state.services.catalog.delete_image(image_id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:slug", get(get_product_by_slug))
}

/// Vendor product management; nested under /vendor.
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_own_products).post(create_product))
        .route(
            "/products/:id",
            put(update_product).delete(delete_product),
        )
        .route("/products/:id/images", post(register_image))
        .route("/images/:id/alt-text", put(update_image_alt_text))
        .route("/images/:id", delete(delete_image))
}
