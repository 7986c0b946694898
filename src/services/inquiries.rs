use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    inquiry::{self, InquiryStatus},
    inquiry_message,
    user::UserRole,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInquiryInput {
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub product_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InquiryFilter {
    pub vendor_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub status: Option<InquiryStatus>,
}

/// Response-time figures for the inquiry dashboard, in whole seconds.
#[derive(Debug, Clone, Serialize)]
pub struct InquiryMetrics {
    pub total: u64,
    pub open: u64,
    pub resolved: u64,
    pub answered: u64,
    pub avg_first_response_secs: Option<i64>,
    pub avg_resolution_secs: Option<i64>,
}

/// Customer-vendor message threads.
#[derive(Clone)]
pub struct InquiryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl InquiryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Opens a thread with the customer's first message.
    #[instrument(skip(self, input))]
    pub async fn create_inquiry(
        &self,
        input: CreateInquiryInput,
    ) -> Result<(inquiry::Model, inquiry_message::Model), ServiceError> {
        if input.subject.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Inquiry subject is required".to_string(),
            ));
        }
        if input.body.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Inquiry body is required".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let now = Utc::now();

        let inquiry = inquiry::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(input.customer_id),
            vendor_id: Set(input.vendor_id),
            product_id: Set(input.product_id),
            order_id: Set(input.order_id),
            subject: Set(input.subject.trim().to_string()),
            status: Set(InquiryStatus::Open),
            first_response_at: Set(None),
            resolved_at: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let message = inquiry_message::ActiveModel {
            id: Set(Uuid::new_v4()),
            inquiry_id: Set(inquiry.id),
            author_id: Set(input.customer_id),
            author_role: Set(UserRole::Customer),
            body: Set(input.body),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::InquiryOpened(inquiry.id))
            .await;

        Ok((inquiry, message))
    }

    /// Appends a message to a thread.
    ///
    /// The first staff reply stamps `first_response_at` exactly once and moves
    /// an open thread to in-progress. A customer reply moves a
    /// waiting-customer thread back to in-progress. Closed threads reject new
    /// messages.
    #[instrument(skip(self, body))]
    pub async fn add_message(
        &self,
        inquiry_id: Uuid,
        author_id: Uuid,
        author_role: UserRole,
        body: String,
    ) -> Result<inquiry_message::Model, ServiceError> {
        if body.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Message body is required".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;

        let inquiry = inquiry::Entity::find_by_id(inquiry_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inquiry {} not found", inquiry_id)))?;

        if inquiry.status == InquiryStatus::Closed {
            return Err(ServiceError::InquiryError(
                "Cannot reply to a closed inquiry".to_string(),
            ));
        }

        let now = Utc::now();
        let message = inquiry_message::ActiveModel {
            id: Set(Uuid::new_v4()),
            inquiry_id: Set(inquiry_id),
            author_id: Set(author_id),
            author_role: Set(author_role),
            body: Set(body),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let staff_reply = message.is_staff_reply();
        let mut active: inquiry::ActiveModel = inquiry.clone().into();
        let mut dirty = false;

        if staff_reply && inquiry.first_response_at.is_none() {
            active.first_response_at = Set(Some(now));
            dirty = true;
        }
        if staff_reply && inquiry.status == InquiryStatus::Open {
            active.status = Set(InquiryStatus::InProgress);
            dirty = true;
        }
        // A customer reply un-parks a thread waiting on them.
        if !staff_reply && inquiry.status == InquiryStatus::WaitingCustomer {
            active.status = Set(InquiryStatus::InProgress);
            dirty = true;
        }
        if dirty {
            active.updated_at = Set(Some(now));
            active.update(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::InquiryReplied {
                inquiry_id,
                staff_reply,
            })
            .await;

        Ok(message)
    }

    #[instrument(skip(self))]
    pub async fn get_inquiry(
        &self,
        inquiry_id: Uuid,
    ) -> Result<(inquiry::Model, Vec<inquiry_message::Model>), ServiceError> {
        let inquiry = inquiry::Entity::find_by_id(inquiry_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inquiry {} not found", inquiry_id)))?;
        let messages = inquiry_message::Entity::find()
            .filter(inquiry_message::Column::InquiryId.eq(inquiry_id))
            .order_by_asc(inquiry_message::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok((inquiry, messages))
    }

    #[instrument(skip(self))]
    pub async fn list_inquiries(
        &self,
        filter: InquiryFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<inquiry::Model>, u64), ServiceError> {
        let mut query = inquiry::Entity::find().order_by_desc(inquiry::Column::CreatedAt);
        if let Some(vendor_id) = filter.vendor_id {
            query = query.filter(inquiry::Column::VendorId.eq(vendor_id));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(inquiry::Column::CustomerId.eq(customer_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(inquiry::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db_pool, per_page.max(1));
        let total = paginator.num_items().await?;
        let inquiries = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((inquiries, total))
    }

    /// Moves a thread along its status ladder. Resolution stamps
    /// `resolved_at`.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        inquiry_id: Uuid,
        new_status: InquiryStatus,
    ) -> Result<inquiry::Model, ServiceError> {
        let inquiry = inquiry::Entity::find_by_id(inquiry_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inquiry {} not found", inquiry_id)))?;
        let old_status = inquiry.status;

        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot move inquiry from {:?} to {:?}",
                old_status, new_status
            )));
        }

        let now = Utc::now();
        let mut active: inquiry::ActiveModel = inquiry.into();
        active.status = Set(new_status);
        if new_status == InquiryStatus::Resolved {
            active.resolved_at = Set(Some(now));
        }
        active.updated_at = Set(Some(now));
        let updated = active.update(&*self.db_pool).await?;

        self.event_sender
            .send_or_log(Event::InquiryStatusChanged {
                inquiry_id,
                old_status: format!("{:?}", old_status),
                new_status: format!("{:?}", new_status),
            })
            .await;

        Ok(updated)
    }

    /// Dashboard counters plus average first-response and resolution times,
    /// computed over threads that have the respective timestamps.
    #[instrument(skip(self))]
    pub async fn metrics(&self, vendor_id: Option<Uuid>) -> Result<InquiryMetrics, ServiceError> {
        let mut query = inquiry::Entity::find();
        if let Some(vendor_id) = vendor_id {
            query = query.filter(inquiry::Column::VendorId.eq(vendor_id));
        }
        let inquiries = query.all(&*self.db_pool).await?;

        let total = inquiries.len() as u64;
        let open = inquiries
            .iter()
            .filter(|i| {
                matches!(
                    i.status,
                    InquiryStatus::Open | InquiryStatus::InProgress | InquiryStatus::WaitingCustomer
                )
            })
            .count() as u64;
        let resolved = inquiries
            .iter()
            .filter(|i| matches!(i.status, InquiryStatus::Resolved | InquiryStatus::Closed))
            .count() as u64;

        let response_times: Vec<i64> = inquiries
            .iter()
            .filter_map(|i| {
                i.first_response_at
                    .map(|t| (t - i.created_at).num_seconds())
            })
            .collect();
        let resolution_times: Vec<i64> = inquiries
            .iter()
            .filter_map(|i| i.resolved_at.map(|t| (t - i.created_at).num_seconds()))
            .collect();

        let avg = |values: &[i64]| {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<i64>() / values.len() as i64)
            }
        };

        Ok(InquiryMetrics {
            total,
            open,
            resolved,
            answered: response_times.len() as u64,
            avg_first_response_secs: avg(&response_times),
            avg_resolution_secs: avg(&resolution_times),
        })
    }
}
