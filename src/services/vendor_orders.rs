use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    commission_entry::{self, CommissionStatus},
    order::{self, OrderStatus},
    order_item, vendor,
    vendor_order::{self},
    vendor_order_item,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorOrderFilter {
    pub vendor_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

/// Splits forwarded orders into per-vendor sub-orders and drives their
/// lifecycle, accruing and settling commissions along the way.
#[derive(Clone)]
pub struct VendorOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    default_commission_rate: Decimal,
}

impl VendorOrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        default_commission_rate: Decimal,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            default_commission_rate,
        }
    }

    /// Splits an order into one sub-order per vendor with surviving lines.
    ///
    /// Idempotency: forwarding an already-forwarded order is a conflict, not
    /// a second split.
    #[instrument(skip(self))]
    pub async fn forward_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<vendor_order::Model>, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let order = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.forwarded_at.is_some() {
            return Err(ServiceError::Conflict(
                "Order has already been forwarded".to_string(),
            ));
        }
        if order.status.is_terminal() {
            return Err(ServiceError::InvalidOperation(
                "Cannot forward an order in a terminal state".to_string(),
            ));
        }

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .filter(order_item::Column::IsCancelled.eq(false))
            .all(&txn)
            .await?;
        if items.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "Order has no active items to forward".to_string(),
            ));
        }

        // Group lines per vendor, ordered deterministically.
        let mut by_vendor: BTreeMap<Uuid, Vec<&order_item::Model>> = BTreeMap::new();
        for item in &items {
            by_vendor.entry(item.vendor_id).or_default().push(item);
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(by_vendor.len());

        for (index, (vendor_id, lines)) in by_vendor.iter().enumerate() {
            let vendor = vendor::Entity::find_by_id(*vendor_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Vendor {} not found", vendor_id))
                })?;

            let rate = vendor
                .commission_rate
                .unwrap_or(self.default_commission_rate);
            let subtotal: Decimal = lines.iter().map(|i| i.effective_total()).sum();
            let commission = (subtotal * rate).round_dp(2);

            let vendor_order = vendor_order::ActiveModel {
                id: Set(Uuid::new_v4()),
                vendor_order_number: Set(format!("{}-V{}", order.order_number, index + 1)),
                order_id: Set(order_id),
                vendor_id: Set(*vendor_id),
                status: Set(OrderStatus::Processing),
                subtotal: Set(subtotal),
                commission_rate: Set(rate),
                commission_amount: Set(commission),
                forwarded_at: Set(now),
                created_at: Set(now),
                updated_at: Set(None),
            }
            .insert(&txn)
            .await?;

            for line in lines {
                vendor_order_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    vendor_order_id: Set(vendor_order.id),
                    order_item_id: Set(line.id),
                    product_id: Set(line.product_id),
                    product_name: Set(line.product_name.clone()),
                    unit_price: Set(line.unit_price),
                    quantity: Set(line.quantity),
                }
                .insert(&txn)
                .await?;
            }

            commission_entry::ActiveModel {
                id: Set(Uuid::new_v4()),
                vendor_order_id: Set(vendor_order.id),
                vendor_id: Set(*vendor_id),
                order_id: Set(order_id),
                base_amount: Set(subtotal),
                rate: Set(rate),
                amount: Set(commission),
                status: Set(CommissionStatus::Pending),
                settled_at: Set(None),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;

            self.event_sender
                .send_or_log(Event::CommissionAccrued {
                    vendor_order_id: vendor_order.id,
                    vendor_id: *vendor_id,
                })
                .await;

            created.push(vendor_order);
        }

        let mut order_active: order::ActiveModel = order.clone().into();
        order_active.forwarded_at = Set(Some(now));
        if order.status == OrderStatus::Pending {
            order_active.status = Set(OrderStatus::Processing);
        }
        order_active.updated_at = Set(Some(now));
        order_active.update(&txn).await?;

        txn.commit().await?;

        info!(order_id = %order_id, sub_orders = created.len(), "order forwarded");
        self.event_sender
            .send_or_log(Event::OrderForwarded {
                order_id,
                vendor_order_ids: created.iter().map(|vo| vo.id).collect(),
            })
            .await;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_vendor_order(
        &self,
        vendor_order_id: Uuid,
    ) -> Result<(vendor_order::Model, Vec<vendor_order_item::Model>), ServiceError> {
        let vendor_order = self.find_vendor_order(vendor_order_id).await?;
        let items = vendor_order_item::Entity::find()
            .filter(vendor_order_item::Column::VendorOrderId.eq(vendor_order_id))
            .all(&*self.db_pool)
            .await?;
        Ok((vendor_order, items))
    }

    #[instrument(skip(self))]
    pub async fn list_vendor_orders(
        &self,
        filter: VendorOrderFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<vendor_order::Model>, u64), ServiceError> {
        let mut query =
            vendor_order::Entity::find().order_by_desc(vendor_order::Column::ForwardedAt);
        if let Some(vendor_id) = filter.vendor_id {
            query = query.filter(vendor_order::Column::VendorId.eq(vendor_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(vendor_order::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db_pool, per_page.max(1));
        let total = paginator.num_items().await?;
        let vendor_orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((vendor_orders, total))
    }

    /// Moves a vendor order along the fulfillment ladder. Delivery settles
    /// the pending commission.
    #[instrument(skip(self))]
    pub async fn update_vendor_order_status(
        &self,
        vendor_order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<vendor_order::Model, ServiceError> {
        if new_status == OrderStatus::Cancelled || new_status == OrderStatus::PartiallyCancelled {
            return Err(ServiceError::InvalidOperation(
                "Use the cancellation endpoint to cancel a vendor order".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let vendor_order = vendor_order::Entity::find_by_id(vendor_order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Vendor order {} not found", vendor_order_id))
            })?;
        let old_status = vendor_order.status;

        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot move vendor order from {:?} to {:?}",
                old_status, new_status
            )));
        }

        let now = Utc::now();
        let mut active: vendor_order::ActiveModel = vendor_order.into();
        active.status = Set(new_status);
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        if new_status == OrderStatus::Delivered {
            self.settle_commission(&txn, vendor_order_id).await?;
        }

        self.sync_parent_order(&txn, updated.order_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::VendorOrderStatusChanged {
                vendor_order_id,
                old_status: format!("{:?}", old_status),
                new_status: format!("{:?}", new_status),
            })
            .await;

        Ok(updated)
    }

    /// Cancels a vendor order, reverses its pending commission, and cancels
    /// the mirrored lines on the parent order.
    #[instrument(skip(self))]
    pub async fn cancel_vendor_order(
        &self,
        vendor_order_id: Uuid,
    ) -> Result<vendor_order::Model, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let vendor_order = vendor_order::Entity::find_by_id(vendor_order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Vendor order {} not found", vendor_order_id))
            })?;

        if vendor_order.status.is_terminal() {
            return Err(ServiceError::InvalidOperation(
                "Vendor order is already in a terminal state".to_string(),
            ));
        }

        let now = Utc::now();
        let mut active: vendor_order::ActiveModel = vendor_order.clone().into();
        active.status = Set(OrderStatus::Cancelled);
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        // Reverse the commission unless it was already settled.
        let entries = commission_entry::Entity::find()
            .filter(commission_entry::Column::VendorOrderId.eq(vendor_order_id))
            .filter(commission_entry::Column::Status.eq(CommissionStatus::Pending))
            .all(&txn)
            .await?;
        for entry in entries {
            let entry_id = entry.id;
            let mut entry_active: commission_entry::ActiveModel = entry.into();
            entry_active.status = Set(CommissionStatus::Reversed);
            entry_active.update(&txn).await?;
            self.event_sender
                .send_or_log(Event::CommissionReversed(entry_id))
                .await;
        }

        // Cancel the parent lines this sub-order mirrors, then bring the
        // parent total back in line with its surviving lines.
        let mirrored = vendor_order_item::Entity::find()
            .filter(vendor_order_item::Column::VendorOrderId.eq(vendor_order_id))
            .all(&txn)
            .await?;
        for mirror in &mirrored {
            if let Some(item) = order_item::Entity::find_by_id(mirror.order_item_id)
                .one(&txn)
                .await?
            {
                if !item.is_cancelled {
                    let mut item_active: order_item::ActiveModel = item.into();
                    item_active.is_cancelled = Set(true);
                    item_active.cancelled_at = Set(Some(now));
                    item_active.update(&txn).await?;
                }
            }
        }

        let order = order::Entity::find_by_id(vendor_order.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", vendor_order.order_id))
            })?;
        let remaining = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
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
        order_active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::VendorOrderCancelled(vendor_order_id))
            .await;

        Ok(updated)
    }

    async fn settle_commission(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        vendor_order_id: Uuid,
    ) -> Result<(), ServiceError> {
        let entries = commission_entry::Entity::find()
            .filter(commission_entry::Column::VendorOrderId.eq(vendor_order_id))
            .filter(commission_entry::Column::Status.eq(CommissionStatus::Pending))
            .all(txn)
            .await?;
        for entry in entries {
            let entry_id = entry.id;
            let mut active: commission_entry::ActiveModel = entry.into();
            active.status = Set(CommissionStatus::Settled);
            active.settled_at = Set(Some(Utc::now()));
            active.update(txn).await?;
            self.event_sender
                .send_or_log(Event::CommissionSettled(entry_id))
                .await;
        }
        Ok(())
    }

    /// Rolls sub-order progress up to the parent: the parent is delivered
    /// when every live sub-order is delivered, shipped when every live
    /// sub-order has at least shipped.
    async fn sync_parent_order(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        order_id: Uuid,
    ) -> Result<(), ServiceError> {
        let order = match order::Entity::find_by_id(order_id).one(txn).await? {
            Some(order) if !order.status.is_terminal() => order,
            _ => return Ok(()),
        };

        let sub_orders = vendor_order::Entity::find()
            .filter(vendor_order::Column::OrderId.eq(order_id))
            .all(txn)
            .await?;
        let live: Vec<_> = sub_orders
            .iter()
            .filter(|vo| vo.status != OrderStatus::Cancelled)
            .collect();
        if live.is_empty() {
            return Ok(());
        }

        let target = if live.iter().all(|vo| vo.status == OrderStatus::Delivered) {
            Some(OrderStatus::Delivered)
        } else if live
            .iter()
            .all(|vo| matches!(vo.status, OrderStatus::Shipped | OrderStatus::Delivered))
        {
            Some(OrderStatus::Shipped)
        } else {
            None
        };

        if let Some(target) = target {
            if order.status != target {
                let mut active: order::ActiveModel = order.into();
                active.status = Set(target);
                active.updated_at = Set(Some(Utc::now()));
                active.update(txn).await?;
            }
        }
        Ok(())
    }

    async fn find_vendor_order(
        &self,
        vendor_order_id: Uuid,
    ) -> Result<vendor_order::Model, ServiceError> {
        vendor_order::Entity::find_by_id(vendor_order_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Vendor order {} not found", vendor_order_id))
            })
    }
}
