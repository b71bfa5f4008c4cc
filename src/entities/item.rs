use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog item. `spec` holds a JSON object serialized as text.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub sku: String,
    pub name: String,
    pub category_id: Option<i32>,
    pub base_uom_id: Option<i32>,
    pub brand: Option<String>,
    pub active: bool,
    #[sea_orm(column_type = "Text")]
    pub spec: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item_category::Entity",
        from = "Column::CategoryId",
        to = "super::item_category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::uom::Entity",
        from = "Column::BaseUomId",
        to = "super::uom::Column::Id"
    )]
    BaseUom,
}

impl Related<super::item_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::uom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BaseUom.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
