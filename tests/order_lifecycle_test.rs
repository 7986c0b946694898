mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;

use marketplace_api::entities::order::OrderStatus;
use marketplace_api::errors::ServiceError;
use marketplace_api::services::orders::{CreateOrderInput, OrderFilter, OrderLineInput, OrderService};

#[tokio::test]
async fn placing_an_order_snapshots_lines_and_decrements_stock() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Oak Works", None).await;
    let customer = common::seed_customer(&pool).await;
    let table = common::seed_product(&pool, vendor.id, "Oak Table", dec!(120.00), 5).await;
    let chair = common::seed_product(&pool, vendor.id, "Oak Chair", dec!(40.00), 10).await;

    let service = OrderService::new(pool.clone(), common::drained_events());
    let (order, items) = service
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            currency: None,
            shipping_address: Some("1 Main St".to_string()),
            notes: None,
            items: vec![
                OrderLineInput {
                    product_id: table.id,
                    quantity: 1,
                },
                OrderLineInput {
                    product_id: chair.id,
                    quantity: 4,
                },
            ],
        })
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, dec!(280.00));
    assert!(order.order_number.starts_with("MP-"));
    assert_eq!(items.len(), 2);

    let table_line = items.iter().find(|i| i.product_id == table.id).unwrap();
    assert_eq!(table_line.product_name, "Oak Table");
    assert_eq!(table_line.unit_price, dec!(120.00));
    assert_eq!(table_line.vendor_id, vendor.id);

    let (_, total) = service
        .list_orders(
            OrderFilter {
                customer_id: Some(customer.id),
                status: None,
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert_eq!(total, 1);

    use marketplace_api::entities::product;
    use sea_orm::EntityTrait;
    let chair_after = product::Entity::find_by_id(chair.id)
        .one(&*pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chair_after.stock_quantity, 6);
}

#[tokio::test]
async fn order_placement_validates_lines_and_stock() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Scarce Goods", None).await;
    let customer = common::seed_customer(&pool).await;
    let rare = common::seed_product(&pool, vendor.id, "Rare Lamp", dec!(99.00), 1).await;

    let service = OrderService::new(pool.clone(), common::drained_events());

    let empty = service
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            currency: None,
            shipping_address: None,
            notes: None,
            items: vec![],
        })
        .await;
    assert_matches!(empty, Err(ServiceError::ValidationError(_)));

    let zero_qty = service
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            currency: None,
            shipping_address: None,
            notes: None,
            items: vec![OrderLineInput {
                product_id: rare.id,
                quantity: 0,
            }],
        })
        .await;
    assert_matches!(zero_qty, Err(ServiceError::ValidationError(_)));

    let oversold = service
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            currency: None,
            shipping_address: None,
            notes: None,
            items: vec![OrderLineInput {
                product_id: rare.id,
                quantity: 2,
            }],
        })
        .await;
    assert_matches!(oversold, Err(ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn cancelling_one_line_recomputes_the_total_from_survivors() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Two Lines", None).await;
    let customer = common::seed_customer(&pool).await;
    let a = common::seed_product(&pool, vendor.id, "Item A", dec!(30.00), 10).await;
    let b = common::seed_product(&pool, vendor.id, "Item B", dec!(20.00), 10).await;

    let service = OrderService::new(pool.clone(), common::drained_events());
    let (order, items) = service
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            currency: None,
            shipping_address: None,
            notes: None,
            items: vec![
                OrderLineInput {
                    product_id: a.id,
                    quantity: 2,
                },
                OrderLineInput {
                    product_id: b.id,
                    quantity: 1,
                },
            ],
        })
        .await
        .unwrap();
    assert_eq!(order.total_amount, dec!(80.00));

    let line_b = items.iter().find(|i| i.product_id == b.id).unwrap();
    let updated = service.cancel_order_item(order.id, line_b.id).await.unwrap();

    assert_eq!(updated.total_amount, dec!(60.00));
    assert_eq!(updated.status, OrderStatus::PartiallyCancelled);

    let again = service.cancel_order_item(order.id, line_b.id).await;
    assert_matches!(again, Err(ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn cancelling_every_line_cancels_the_order() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "One Line", None).await;
    let customer = common::seed_customer(&pool).await;
    let only = common::seed_product(&pool, vendor.id, "Only Item", dec!(15.00), 3).await;

    let service = OrderService::new(pool.clone(), common::drained_events());
    let (order, items) = service
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            currency: None,
            shipping_address: None,
            notes: None,
            items: vec![OrderLineInput {
                product_id: only.id,
                quantity: 1,
            }],
        })
        .await
        .unwrap();

    let updated = service
        .cancel_order_item(order.id, items[0].id)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Cancelled);
    assert_eq!(updated.total_amount, dec!(0.00));
}

#[tokio::test]
async fn whole_order_cancellation_zeroes_the_total() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Cancel All", None).await;
    let customer = common::seed_customer(&pool).await;
    let p = common::seed_product(&pool, vendor.id, "Thing", dec!(10.00), 10).await;

    let service = OrderService::new(pool.clone(), common::drained_events());
    let (order, _) = service
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            currency: None,
            shipping_address: None,
            notes: None,
            items: vec![OrderLineInput {
                product_id: p.id,
                quantity: 3,
            }],
        })
        .await
        .unwrap();

    let cancelled = service.cancel_order(order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.total_amount, dec!(0.00));

    let again = service.cancel_order(order.id).await;
    assert_matches!(again, Err(ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn status_ladder_rejects_skips() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Ladder", None).await;
    let customer = common::seed_customer(&pool).await;
    let p = common::seed_product(&pool, vendor.id, "Widget", dec!(5.00), 10).await;

    let service = OrderService::new(pool.clone(), common::drained_events());
    let (order, _) = service
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            currency: None,
            shipping_address: None,
            notes: None,
            items: vec![OrderLineInput {
                product_id: p.id,
                quantity: 1,
            }],
        })
        .await
        .unwrap();

    let skip = service
        .update_order_status(order.id, OrderStatus::Delivered)
        .await;
    assert_matches!(skip, Err(ServiceError::InvalidStatus(_)));

    let processing = service
        .update_order_status(order.id, OrderStatus::Processing)
        .await
        .unwrap();
    assert_eq!(processing.status, OrderStatus::Processing);
}

#[tokio::test]
async fn repair_fixes_a_drifted_total() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Drift", None).await;
    let customer = common::seed_customer(&pool).await;
    let p = common::seed_product(&pool, vendor.id, "Drifty", dec!(25.00), 10).await;

    let service = OrderService::new(pool.clone(), common::drained_events());
    let (order, _) = service
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            currency: None,
            shipping_address: None,
            notes: None,
            items: vec![OrderLineInput {
                product_id: p.id,
                quantity: 2,
            }],
        })
        .await
        .unwrap();

    // Corrupt the stored total behind the service's back.
    use marketplace_api::entities::order;
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};
    let mut active: order::ActiveModel = order::Entity::find_by_id(order.id)
        .one(&*pool)
        .await
        .unwrap()
        .unwrap()
        .into();
    active.total_amount = Set(dec!(999.99));
    active.update(&*pool).await.unwrap();

    let repaired = service.repair_all_order_totals().await.unwrap();
    assert_eq!(repaired, vec![order.id]);

    let after = order::Entity::find_by_id(order.id)
        .one(&*pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.total_amount, dec!(50.00));

    assert!(!service.repair_order_total(order.id).await.unwrap());
}
