use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{payment_account, vendor};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::catalog::slugify;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVendorInput {
    pub name: String,
    pub slug: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub description: Option<String>,
    /// Per-vendor override of the marketplace default rate.
    pub commission_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVendorInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub logo_path: Option<Option<String>>,
    pub commission_rate: Option<Option<Decimal>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentAccountInput {
    pub bank_name: String,
    pub account_holder: String,
    pub account_number: String,
    pub iban: Option<String>,
}

fn validate_rate(rate: Decimal) -> Result<(), ServiceError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(ServiceError::ValidationError(
            "Commission rate must be between 0 and 1".to_string(),
        ));
    }
    Ok(())
}

/// Vendor profiles and their payout accounts.
#[derive(Clone)]
pub struct VendorService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl VendorService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create_vendor(
        &self,
        input: CreateVendorInput,
    ) -> Result<vendor::Model, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Vendor name is required".to_string(),
            ));
        }
        if let Some(rate) = input.commission_rate {
            validate_rate(rate)?;
        }

        let slug = slugify(input.slug.as_deref().unwrap_or(&input.name));
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Slug must contain at least one alphanumeric character".to_string(),
            ));
        }
        let email = input.email.trim().to_lowercase();

        let clash = vendor::Entity::find()
            .filter(
                sea_orm::Condition::any()
                    .add(vendor::Column::Slug.eq(slug.clone()))
                    .add(vendor::Column::Email.eq(email.clone())),
            )
            .count(&*self.db_pool)
            .await?;
        if clash > 0 {
            return Err(ServiceError::Conflict(
                "A vendor with this slug or email already exists".to_string(),
            ));
        }

        let created = vendor::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            slug: Set(slug),
            email: Set(email),
            phone: Set(input.phone),
            description: Set(input.description),
            logo_path: Set(None),
            commission_rate: Set(input.commission_rate),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(vendor_id = %created.id, slug = %created.slug, "vendor created");
        self.event_sender
            .send_or_log(Event::VendorCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_vendor(
        &self,
        vendor_id: Uuid,
        input: UpdateVendorInput,
    ) -> Result<vendor::Model, ServiceError> {
        let vendor = self.find_vendor(vendor_id).await?;
        let mut active: vendor::ActiveModel = vendor.into();

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Vendor name is required".to_string(),
                ));
            }
            active.name = Set(name.trim().to_string());
        }
        if let Some(email) = input.email {
            let email = email.trim().to_lowercase();
            let clash = vendor::Entity::find()
                .filter(vendor::Column::Email.eq(email.clone()))
                .filter(vendor::Column::Id.ne(vendor_id))
                .count(&*self.db_pool)
                .await?;
            if clash > 0 {
                return Err(ServiceError::Conflict(
                    "A vendor with this email already exists".to_string(),
                ));
            }
            active.email = Set(email);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(logo_path) = input.logo_path {
            active.logo_path = Set(logo_path);
        }
        if let Some(commission_rate) = input.commission_rate {
            if let Some(rate) = commission_rate {
                validate_rate(rate)?;
            }
            active.commission_rate = Set(commission_rate);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_vendor(&self, vendor_id: Uuid) -> Result<vendor::Model, ServiceError> {
        self.find_vendor(vendor_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_vendor_by_slug(&self, slug: &str) -> Result<vendor::Model, ServiceError> {
        vendor::Entity::find()
            .filter(vendor::Column::Slug.eq(slug))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Vendor '{}' not found", slug)))
    }

    #[instrument(skip(self))]
    pub async fn list_vendors(
        &self,
        only_active: bool,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<vendor::Model>, u64), ServiceError> {
        let mut query = vendor::Entity::find().order_by_asc(vendor::Column::Name);
        if only_active {
            query = query.filter(vendor::Column::IsActive.eq(true));
        }
        let paginator = query.paginate(&*self.db_pool, per_page.max(1));
        let total = paginator.num_items().await?;
        let vendors = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((vendors, total))
    }

    /// Creates or replaces the vendor's payout account. Re-submitting resets
    /// verification.
    #[instrument(skip(self, input))]
    pub async fn upsert_payment_account(
        &self,
        vendor_id: Uuid,
        input: PaymentAccountInput,
    ) -> Result<payment_account::Model, ServiceError> {
        self.find_vendor(vendor_id).await?;
        if input.account_number.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Account number is required".to_string(),
            ));
        }

        let now = Utc::now();
        let existing = payment_account::Entity::find()
            .filter(payment_account::Column::VendorId.eq(vendor_id))
            .one(&*self.db_pool)
            .await?;

        let account = match existing {
            Some(account) => {
                let mut active: payment_account::ActiveModel = account.into();
                active.bank_name = Set(input.bank_name);
                active.account_holder = Set(input.account_holder);
                active.account_number = Set(input.account_number);
                active.iban = Set(input.iban);
                active.is_verified = Set(false);
                active.updated_at = Set(now);
                active.update(&*self.db_pool).await?
            }
            None => {
                payment_account::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    vendor_id: Set(vendor_id),
                    bank_name: Set(input.bank_name),
                    account_holder: Set(input.account_holder),
                    account_number: Set(input.account_number),
                    iban: Set(input.iban),
                    is_verified: Set(false),
                    updated_at: Set(now),
                }
                .insert(&*self.db_pool)
                .await?
            }
        };
        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn get_payment_account(
        &self,
        vendor_id: Uuid,
    ) -> Result<Option<payment_account::Model>, ServiceError> {
        Ok(payment_account::Entity::find()
            .filter(payment_account::Column::VendorId.eq(vendor_id))
            .one(&*self.db_pool)
            .await?)
    }

    /// Admin verification of a submitted payout account.
    #[instrument(skip(self))]
    pub async fn verify_payment_account(
        &self,
        vendor_id: Uuid,
    ) -> Result<payment_account::Model, ServiceError> {
        let account = payment_account::Entity::find()
            .filter(payment_account::Column::VendorId.eq(vendor_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Vendor {} has no payment account", vendor_id))
            })?;
        let mut active: payment_account::ActiveModel = account.into();
        active.is_verified = Set(true);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db_pool).await?)
    }

    async fn find_vendor(&self, vendor_id: Uuid) -> Result<vendor::Model, ServiceError> {
        vendor::Entity::find_by_id(vendor_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Vendor {} not found", vendor_id)))
    }
}
