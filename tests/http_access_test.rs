mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::{Extension, Router};
use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use marketplace_api::config::AppConfig;
use marketplace_api::entities::{
    product_image,
    user::{self, UserRole},
};
use marketplace_api::{api_v1_routes, handlers, AppState};

fn test_config(uploads_dir: &str) -> Arc<AppConfig> {
    let cfg: AppConfig = serde_json::from_value(serde_json::json!({
        "database_url": "sqlite::memory:",
        "jwt_secret":
            "integration_test_secret_0123456789_abcdefghijklmnopqrstuvwxyz_0123456789",
        "jwt_expiration": 3600,
        "host": "127.0.0.1",
        "environment": "development",
        "uploads_dir": uploads_dir,
    }))
    .expect("test config");
    Arc::new(cfg)
}

/// Same layout as the server binary: uploads and sitemap at the root, the
/// versioned API underneath.
fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::uploads::routes())
        .merge(handlers::seo::public_routes())
        .nest("/api/v1", api_v1_routes())
        .with_state(state.clone())
        .layer(Extension(state.auth_service.clone()))
}

fn vendor_token(state: &AppState, vendor_id: Uuid) -> String {
    let user = user::Model {
        id: Uuid::new_v4(),
        email: format!("vendor-{}@example.com", vendor_id.simple()),
        password_hash: String::new(),
        display_name: "Portal User".to_string(),
        role: UserRole::Vendor,
        vendor_id: Some(vendor_id),
        is_active: true,
        created_at: Utc::now(),
        updated_at: None,
    };
    state.auth_service.generate_token(&user).expect("token")
}

#[tokio::test]
async fn vendors_cannot_edit_alt_text_on_other_vendors_images() {
    let pool = common::test_pool().await;
    let uploads = tempfile::tempdir().unwrap();
    let state = AppState::new(
        pool.clone(),
        test_config(uploads.path().to_str().unwrap()),
        common::drained_events(),
    );

    let owner = common::seed_vendor(&pool, "Owner Co", None).await;
    let intruder = common::seed_vendor(&pool, "Intruder Co", None).await;
    let product = common::seed_product(&pool, owner.id, "Walnut Desk", dec!(100.00), 5).await;

    let image = product_image::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        file_path: Set("walnut-desk/main.jpg".to_string()),
        alt_text: Set(Some("Original alt text".to_string())),
        position: Set(0),
        width: Set(None),
        height: Set(None),
        file_size_bytes: Set(None),
        is_watermarked: Set(false),
    }
    .insert(&*pool)
    .await
    .unwrap();

    let token = vendor_token(&state, intruder.id);
    let response = app(state)
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/v1/vendor/images/{}/alt-text", image.id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"alt_text":"hijacked"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The rejected request must not have touched the row.
    let stored = product_image::Entity::find_by_id(image.id)
        .one(&*pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.alt_text.as_deref(), Some("Original alt text"));
}

#[tokio::test]
async fn uploads_only_serve_files_under_the_uploads_root() {
    let pool = common::test_pool().await;
    let uploads = tempfile::tempdir().unwrap();
    std::fs::write(uploads.path().join("inside.jpg"), b"inside bytes").unwrap();

    let outside = tempfile::tempdir().unwrap();
    let secret_path = outside.path().join("secret.txt");
    std::fs::write(&secret_path, b"outside the uploads root").unwrap();

    let state = AppState::new(
        pool,
        test_config(uploads.path().to_str().unwrap()),
        common::drained_events(),
    );
    let router = app(state);

    let ok = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/uploads/inside.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let bytes = to_bytes(ok.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"inside bytes");

    // A double slash makes the wildcard capture an absolute path.
    let absolute = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/uploads/{}", secret_path.display()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(absolute.status(), StatusCode::NOT_FOUND);

    let dotdot = router
        .oneshot(
            Request::builder()
                .uri("/uploads/../secret.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(dotdot.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sitemap_is_served_at_the_site_root() {
    let pool = common::test_pool().await;
    let uploads = tempfile::tempdir().unwrap();
    let state = AppState::new(
        pool,
        test_config(uploads.path().to_str().unwrap()),
        common::drained_events(),
    );

    let response = app(state)
        .oneshot(
            Request::builder()
                .uri("/sitemap.xml")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/xml"
    );
}
