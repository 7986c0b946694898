use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    order::{self, OrderStatus},
    order_item,
    product::{self, ProductStatus},
    vendor_order,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub customer_id: Uuid,
    pub currency: Option<String>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderLineInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

/// Order placement, listing, and the customer-facing cancellation paths.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    fn generate_order_number() -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(|c| (c as char).to_ascii_uppercase())
            .collect();
        format!("MP-{}-{}", Utc::now().format("%Y%m%d"), suffix)
    }

    /// Places an order. Product name and price are snapshotted per line and
    /// the total is the sum of line totals.
    #[instrument(skip(self, input))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item".to_string(),
            ));
        }
        for line in &input.items {
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "Item quantity must be positive".to_string(),
                ));
            }
        }

        let txn = self.db_pool.begin().await?;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let mut items = Vec::with_capacity(input.items.len());
        let mut total = Decimal::ZERO;

        for line in &input.items {
            let product = product::Entity::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", line.product_id))
                })?;

            if product.status != ProductStatus::Active {
                return Err(ServiceError::InvalidOperation(format!(
                    "Product '{}' is not available for purchase",
                    product.name
                )));
            }
            if product.stock_quantity < line.quantity {
                return Err(ServiceError::InvalidOperation(format!(
                    "Insufficient stock for '{}'",
                    product.name
                )));
            }

            total += product.price * Decimal::from(line.quantity);
            items.push(order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product.id),
                vendor_id: Set(product.vendor_id),
                product_name: Set(product.name.clone()),
                unit_price: Set(product.price),
                quantity: Set(line.quantity),
                is_cancelled: Set(false),
                cancelled_at: Set(None),
                created_at: Set(now),
            });

            let mut stock_update: product::ActiveModel = product.clone().into();
            stock_update.stock_quantity = Set(product.stock_quantity - line.quantity);
            stock_update.updated_at = Set(Some(now));
            stock_update.update(&txn).await?;
        }

        let currency = input.currency.unwrap_or_else(|| "USD".to_string());
        let order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(Self::generate_order_number()),
            customer_id: Set(input.customer_id),
            status: Set(OrderStatus::Pending),
            total_amount: Set(total),
            currency: Set(currency),
            shipping_address: Set(input.shipping_address),
            notes: Set(input.notes),
            forwarded_at: Set(None),
            placed_at: Set(now),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut inserted_items = Vec::with_capacity(items.len());
        for item in items {
            inserted_items.push(item.insert(&txn).await?);
        }

        txn.commit().await?;

        info!(order_id = %order.id, order_number = %order.order_number, "order placed");
        self.event_sender.send_or_log(Event::OrderPlaced(order.id)).await;

        Ok((order, inserted_items))
    }

    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        let order = self.find_order(order_id).await?;
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok((order, items))
    }

    #[instrument(skip(self))]
    pub async fn get_order_by_number(
        &self,
        order_number: &str,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        let order = order::Entity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order '{}' not found", order_number))
            })?;
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok((order, items))
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let mut query = order::Entity::find().order_by_desc(order::Column::PlacedAt);
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(order::Column::CustomerId.eq(customer_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db_pool, per_page.max(1));
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((orders, total))
    }

    /// Moves an order along the fulfillment ladder.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let order = self.find_order(order_id).await?;
        let old_status = order.status;

        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot move order from {:?} to {:?}",
                old_status, new_status
            )));
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db_pool).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: format!("{:?}", old_status),
                new_status: format!("{:?}", new_status),
            })
            .await;

        Ok(updated)
    }

    /// Cancels a single line of an unforwarded order and recomputes the total
    /// from the surviving lines.
    ///
    /// Once vendor sub-orders exist the parent lines are frozen and
    /// cancellation must go through the vendor order instead.
    #[instrument(skip(self))]
    pub async fn cancel_order_item(
        &self,
        order_id: Uuid,
        item_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let order = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.status.is_terminal() {
            return Err(ServiceError::InvalidOperation(
                "Order is already in a terminal state".to_string(),
            ));
        }

        let forwarded = order.forwarded_at.is_some()
            || vendor_order::Entity::find()
                .filter(vendor_order::Column::OrderId.eq(order_id))
                .count(&txn)
                .await?
                > 0;
        if forwarded {
            return Err(ServiceError::Conflict(
                "Order has been forwarded to vendors; cancel through the vendor order".to_string(),
            ));
        }

        let item = order_item::Entity::find_by_id(item_id)
            .one(&txn)
            .await?
            .filter(|i| i.order_id == order_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Order item {} not found", item_id)))?;

        if item.is_cancelled {
            return Err(ServiceError::InvalidOperation(
                "Order item is already cancelled".to_string(),
            ));
        }

        let now = Utc::now();
        let mut item_active: order_item::ActiveModel = item.into();
        item_active.is_cancelled = Set(true);
        item_active.cancelled_at = Set(Some(now));
        item_active.update(&txn).await?;

        let remaining = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&txn)
            .await?;
        let new_total: Decimal = remaining.iter().map(|i| i.effective_total()).sum();
        let all_cancelled = remaining.iter().all(|i| i.is_cancelled);

        let mut order_active: order::ActiveModel = order.into();
        order_active.total_amount = Set(new_total);
        order_active.status = Set(if all_cancelled {
            OrderStatus::Cancelled
        } else {
            OrderStatus::PartiallyCancelled
        });
        order_active.updated_at = Set(Some(now));
        let updated = order_active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderItemCancelled {
                order_id,
                order_item_id: item_id,
            })
            .await;

        Ok(updated)
    }

    /// Cancels an entire unforwarded order.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let order = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.status.is_terminal() {
            return Err(ServiceError::InvalidOperation(
                "Order is already in a terminal state".to_string(),
            ));
        }
        if order.forwarded_at.is_some() {
            return Err(ServiceError::Conflict(
                "Order has been forwarded to vendors; cancel the vendor orders instead"
                    .to_string(),
            ));
        }

        let now = Utc::now();
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .filter(order_item::Column::IsCancelled.eq(false))
            .all(&txn)
            .await?;
        for item in items {
            let mut active: order_item::ActiveModel = item.into();
            active.is_cancelled = Set(true);
            active.cancelled_at = Set(Some(now));
            active.update(&txn).await?;
        }

        let mut order_active: order::ActiveModel = order.into();
        order_active.status = Set(OrderStatus::Cancelled);
        order_active.total_amount = Set(Decimal::ZERO);
        order_active.updated_at = Set(Some(now));
        let updated = order_active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender.send_or_log(Event::OrderCancelled(order_id)).await;
        Ok(updated)
    }

    /// Recomputes `total_amount` from the surviving lines. Returns true when
    /// the stored total was stale.
    #[instrument(skip(self))]
    pub async fn repair_order_total(&self, order_id: Uuid) -> Result<bool, ServiceError> {
        let order = self.find_order(order_id).await?;
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db_pool)
            .await?;
        let expected: Decimal = items.iter().map(|i| i.effective_total()).sum();

        if order.total_amount == expected {
            return Ok(false);
        }

        info!(
            order_id = %order_id,
            stored = %order.total_amount,
            expected = %expected,
            "repairing stale order total"
        );
        let mut active: order::ActiveModel = order.into();
        active.total_amount = Set(expected);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db_pool).await?;
        Ok(true)
    }

    /// Runs [`Self::repair_order_total`] across all orders and returns the ids
    /// that needed repair.
    pub async fn repair_all_order_totals(&self) -> Result<Vec<Uuid>, ServiceError> {
        let order_ids: Vec<Uuid> = order::Entity::find()
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|o| o.id)
            .collect();

        let mut repaired = Vec::new();
        for order_id in order_ids {
            if self.repair_order_total(order_id).await? {
                repaired.push(order_id);
            }
        }
        Ok(repaired)
    }

    async fn find_order(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(order_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_carry_prefix_date_and_random_suffix() {
        let a = OrderService::generate_order_number();
        let b = OrderService::generate_order_number();
        let today = Utc::now().format("%Y%m%d").to_string();
        assert!(a.starts_with(&format!("MP-{}-", today)));
        assert_eq!(a.len(), "MP-".len() + 8 + 1 + 6);
        assert_ne!(a, b);
    }
}
