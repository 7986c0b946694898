use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer-vendor support thread, optionally tied to a product or order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inquiries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub product_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub subject: String,
    pub status: InquiryStatus,
    /// Written at most once, by the first vendor/admin-authored message.
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inquiry_message::Entity")]
    Messages,
    #[sea_orm(
        belongs_to = "super::vendor::Entity",
        from = "Column::VendorId",
        to = "super::vendor::Column::Id"
    )]
    Vendor,
}

impl Related<super::inquiry_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl Related<super::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "waiting_customer")]
    WaitingCustomer,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl InquiryStatus {
    pub fn can_transition_to(self, next: InquiryStatus) -> bool {
        use InquiryStatus::*;
        matches!(
            (self, next),
            (Open, InProgress)
                | (Open, WaitingCustomer)
                | (Open, Resolved)
                | (InProgress, WaitingCustomer)
                | (InProgress, Resolved)
                | (WaitingCustomer, InProgress)
                | (WaitingCustomer, Resolved)
                | (Resolved, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, InquiryStatus::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::InquiryStatus::*;

    #[test]
    fn thread_ladder_is_enforced() {
        assert!(Open.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(WaitingCustomer));
        assert!(WaitingCustomer.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Resolved));
        assert!(Resolved.can_transition_to(Closed));

        assert!(!Closed.can_transition_to(Open));
        assert!(!Resolved.can_transition_to(InProgress));
        assert!(!Open.can_transition_to(Closed));
    }
}
