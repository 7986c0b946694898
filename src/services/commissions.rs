use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::commission_entry::{self, CommissionStatus};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommissionFilter {
    pub vendor_id: Option<Uuid>,
    pub status: Option<CommissionStatus>,
}

/// Aggregate commission position, typically scoped to one vendor.
#[derive(Debug, Clone, Serialize)]
pub struct CommissionSummary {
    pub pending_total: Decimal,
    pub settled_total: Decimal,
    pub reversed_total: Decimal,
    pub entry_count: u64,
}

/// Read-side of the commission ledger. Entries are written by the vendor
/// order lifecycle; this service only reports on them.
#[derive(Clone)]
pub struct CommissionService {
    db_pool: Arc<DbPool>,
}

impl CommissionService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_entries(
        &self,
        filter: CommissionFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<commission_entry::Model>, u64), ServiceError> {
        let mut query =
            commission_entry::Entity::find().order_by_desc(commission_entry::Column::CreatedAt);
        if let Some(vendor_id) = filter.vendor_id {
            query = query.filter(commission_entry::Column::VendorId.eq(vendor_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(commission_entry::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db_pool, per_page.max(1));
        let total = paginator.num_items().await?;
        let entries = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((entries, total))
    }

    #[instrument(skip(self))]
    pub async fn summary(&self, vendor_id: Option<Uuid>) -> Result<CommissionSummary, ServiceError> {
        let mut query = commission_entry::Entity::find();
        if let Some(vendor_id) = vendor_id {
            query = query.filter(commission_entry::Column::VendorId.eq(vendor_id));
        }
        let entries = query.all(&*self.db_pool).await?;

        let mut summary = CommissionSummary {
            pending_total: Decimal::ZERO,
            settled_total: Decimal::ZERO,
            reversed_total: Decimal::ZERO,
            entry_count: entries.len() as u64,
        };
        for entry in entries {
            match entry.status {
                CommissionStatus::Pending => summary.pending_total += entry.amount,
                CommissionStatus::Settled => summary.settled_total += entry.amount,
                CommissionStatus::Reversed => summary.reversed_total += entry.amount,
            }
        }
        Ok(summary)
    }
}
