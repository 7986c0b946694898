#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

use marketplace_api::db::{self, DbConfig, DbPool};
use marketplace_api::entities::{
    product::{self, ProductStatus},
    user::{self, UserRole},
    vendor,
};
use marketplace_api::events::{event_channel, EventSender};

/// Fresh in-memory database with all migrations applied. A single connection
/// keeps every query on the same sqlite instance.
pub async fn test_pool() -> Arc<DbPool> {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let pool = db::establish_connection_with_config(&config)
        .await
        .expect("in-memory database");
    db::run_migrations(&pool).await.expect("migrations");
    Arc::new(pool)
}

/// Event sender whose receiver is drained in the background, so services
/// under test never stall on a full channel.
pub fn drained_events() -> Arc<EventSender> {
    let (sender, mut receiver) = event_channel(64);
    tokio::spawn(async move { while receiver.recv().await.is_some() {} });
    Arc::new(sender)
}

pub async fn seed_vendor(
    db: &DbPool,
    name: &str,
    commission_rate: Option<Decimal>,
) -> vendor::Model {
    let id = Uuid::new_v4();
    vendor::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        slug: Set(format!("{}-{}", name.to_lowercase().replace(' ', "-"), id.simple())),
        email: Set(format!("{}@example.com", id.simple())),
        phone: Set(None),
        description: Set(None),
        logo_path: Set(None),
        commission_rate: Set(commission_rate),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("vendor fixture")
}

pub async fn seed_customer(db: &DbPool) -> user::Model {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        email: Set(format!("customer-{}@example.com", id.simple())),
        password_hash: Set("not-a-real-hash".to_string()),
        display_name: Set("Test Customer".to_string()),
        role: Set(UserRole::Customer),
        vendor_id: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("customer fixture")
}

pub async fn seed_product(
    db: &DbPool,
    vendor_id: Uuid,
    name: &str,
    price: Decimal,
    stock: i32,
) -> product::Model {
    let id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(id),
        vendor_id: Set(vendor_id),
        category_id: Set(None),
        name: Set(name.to_string()),
        slug: Set(format!("{}-{}", name.to_lowercase().replace(' ', "-"), id.simple())),
        description: Set(None),
        price: Set(price),
        compare_at_price: Set(None),
        currency: Set("USD".to_string()),
        stock_quantity: Set(stock),
        status: Set(ProductStatus::Active),
        is_featured: Set(false),
        is_premium: Set(false),
        meta_title: Set(None),
        meta_description: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("product fixture")
}
