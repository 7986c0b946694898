mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

use marketplace_api::db::DbPool;
use marketplace_api::entities::{
    commission_entry::{self, CommissionStatus},
    order::{self, OrderStatus},
    order_item,
};
use marketplace_api::errors::ServiceError;
use marketplace_api::services::commissions::{CommissionFilter, CommissionService};
use marketplace_api::services::orders::{CreateOrderInput, OrderLineInput, OrderService};
use marketplace_api::services::vendor_orders::VendorOrderService;

const DEFAULT_RATE: rust_decimal::Decimal = dec!(0.10);

struct Setup {
    pool: Arc<DbPool>,
    orders: OrderService,
    vendor_orders: VendorOrderService,
}

async fn setup() -> Setup {
    let pool = common::test_pool().await;
    let events = common::drained_events();
    Setup {
        orders: OrderService::new(pool.clone(), events.clone()),
        vendor_orders: VendorOrderService::new(pool.clone(), events, DEFAULT_RATE),
        pool,
    }
}

async fn place_two_vendor_order(s: &Setup) -> (order::Model, Uuid, Uuid) {
    let alpha = common::seed_vendor(&s.pool, "Alpha Goods", None).await;
    let beta = common::seed_vendor(&s.pool, "Beta Crafts", Some(dec!(0.20))).await;
    let customer = common::seed_customer(&s.pool).await;
    let pa = common::seed_product(&s.pool, alpha.id, "Alpha Item", dec!(100.00), 10).await;
    let pb = common::seed_product(&s.pool, beta.id, "Beta Item", dec!(50.00), 10).await;

    let (order, _) = s
        .orders
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            currency: None,
            shipping_address: None,
            notes: None,
            items: vec![
                OrderLineInput {
                    product_id: pa.id,
                    quantity: 1,
                },
                OrderLineInput {
                    product_id: pb.id,
                    quantity: 2,
                },
            ],
        })
        .await
        .unwrap();
    (order, alpha.id, beta.id)
}

#[tokio::test]
async fn forwarding_splits_per_vendor_with_commissions() {
    let s = setup().await;
    let (order, alpha_id, beta_id) = place_two_vendor_order(&s).await;

    let created = s.vendor_orders.forward_order(order.id).await.unwrap();
    assert_eq!(created.len(), 2);

    let alpha_vo = created.iter().find(|vo| vo.vendor_id == alpha_id).unwrap();
    assert_eq!(alpha_vo.subtotal, dec!(100.00));
    assert_eq!(alpha_vo.commission_rate, DEFAULT_RATE);
    assert_eq!(alpha_vo.commission_amount, dec!(10.00));
    assert_eq!(alpha_vo.status, OrderStatus::Processing);
    assert!(alpha_vo
        .vendor_order_number
        .starts_with(&order.order_number));

    // Beta carries a 20% override on a 100.00 subtotal.
    let beta_vo = created.iter().find(|vo| vo.vendor_id == beta_id).unwrap();
    assert_eq!(beta_vo.subtotal, dec!(100.00));
    assert_eq!(beta_vo.commission_rate, dec!(0.20));
    assert_eq!(beta_vo.commission_amount, dec!(20.00));

    let parent = order::Entity::find_by_id(order.id)
        .one(&*s.pool)
        .await
        .unwrap()
        .unwrap();
    assert!(parent.forwarded_at.is_some());
    assert_eq!(parent.status, OrderStatus::Processing);

    let commissions = CommissionService::new(s.pool.clone());
    let (entries, total) = commissions
        .list_entries(CommissionFilter::default(), 1, 20)
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert!(entries
        .iter()
        .all(|e| e.status == CommissionStatus::Pending));
}

#[tokio::test]
async fn forwarding_twice_is_a_conflict() {
    let s = setup().await;
    let (order, _, _) = place_two_vendor_order(&s).await;

    s.vendor_orders.forward_order(order.id).await.unwrap();
    let second = s.vendor_orders.forward_order(order.id).await;
    assert_matches!(second, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn forwarded_orders_freeze_parent_line_cancellation() {
    let s = setup().await;
    let (order, _, _) = place_two_vendor_order(&s).await;
    s.vendor_orders.forward_order(order.id).await.unwrap();

    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .all(&*s.pool)
        .await
        .unwrap();

    let blocked = s.orders.cancel_order_item(order.id, items[0].id).await;
    assert_matches!(blocked, Err(ServiceError::Conflict(_)));

    let whole = s.orders.cancel_order(order.id).await;
    assert_matches!(whole, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn delivery_settles_the_commission_and_rolls_up() {
    let s = setup().await;
    let (order, _, _) = place_two_vendor_order(&s).await;
    let created = s.vendor_orders.forward_order(order.id).await.unwrap();

    for vo in &created {
        s.vendor_orders
            .update_vendor_order_status(vo.id, OrderStatus::Shipped)
            .await
            .unwrap();
    }
    let parent = order::Entity::find_by_id(order.id)
        .one(&*s.pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(parent.status, OrderStatus::Shipped);

    for vo in &created {
        s.vendor_orders
            .update_vendor_order_status(vo.id, OrderStatus::Delivered)
            .await
            .unwrap();
    }
    let parent = order::Entity::find_by_id(order.id)
        .one(&*s.pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(parent.status, OrderStatus::Delivered);

    let entries = commission_entry::Entity::find()
        .all(&*s.pool)
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    for entry in &entries {
        assert_eq!(entry.status, CommissionStatus::Settled);
        assert!(entry.settled_at.is_some());
    }

    let commissions = CommissionService::new(s.pool.clone());
    let summary = commissions.summary(None).await.unwrap();
    assert_eq!(summary.settled_total, dec!(30.00));
    assert_eq!(summary.pending_total, dec!(0.00));
}

#[tokio::test]
async fn cancelling_a_vendor_order_reverses_commission_and_syncs_parent() {
    let s = setup().await;
    let (order, alpha_id, _) = place_two_vendor_order(&s).await;
    let created = s.vendor_orders.forward_order(order.id).await.unwrap();
    let alpha_vo = created.iter().find(|vo| vo.vendor_id == alpha_id).unwrap();

    let cancelled = s.vendor_orders.cancel_vendor_order(alpha_vo.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let entry = commission_entry::Entity::find()
        .filter(commission_entry::Column::VendorOrderId.eq(alpha_vo.id))
        .one(&*s.pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, CommissionStatus::Reversed);

    // The parent drops the alpha line (100.00) and keeps beta's 100.00.
    let parent = order::Entity::find_by_id(order.id)
        .one(&*s.pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(parent.status, OrderStatus::PartiallyCancelled);
    assert_eq!(parent.total_amount, dec!(100.00));
}

#[tokio::test]
async fn vendor_order_cancellation_goes_through_the_dedicated_path() {
    let s = setup().await;
    let (order, _, _) = place_two_vendor_order(&s).await;
    let created = s.vendor_orders.forward_order(order.id).await.unwrap();

    let rejected = s
        .vendor_orders
        .update_vendor_order_status(created[0].id, OrderStatus::Cancelled)
        .await;
    assert_matches!(rejected, Err(ServiceError::InvalidOperation(_)));

    let skipped = s
        .vendor_orders
        .update_vendor_order_status(created[0].id, OrderStatus::Delivered)
        .await;
    assert_matches!(skipped, Err(ServiceError::InvalidStatus(_)));
}
