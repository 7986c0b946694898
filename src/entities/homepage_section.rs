use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ordered storefront carousel: featured picks, premium picks, or a category
/// spotlight.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "homepage_sections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub kind: SectionKind,
    /// Required when `kind` is `Category`.
    pub category_id: Option<Uuid>,
    pub position: i32,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    #[sea_orm(string_value = "featured")]
    Featured,
    #[sea_orm(string_value = "premium")]
    Premium,
    #[sea_orm(string_value = "category")]
    Category,
}
