use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "vendors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[validate(length(min = 1, max = 120, message = "Vendor name is required"))]
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[validate(email(message = "Must be a valid email address"))]
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub logo_path: Option<String>,
    /// Overrides the configured default commission rate when set.
    pub commission_rate: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    #[sea_orm(has_many = "super::vendor_order::Entity")]
    VendorOrders,
    #[sea_orm(has_one = "super::payment_account::Entity")]
    PaymentAccount,
    #[sea_orm(has_many = "super::inquiry::Entity")]
    Inquiries,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::vendor_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VendorOrders.def()
    }
}

impl Related<super::payment_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
