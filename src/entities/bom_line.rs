use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bom_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub bom_id: i32,
    pub component_item_id: i32,
    #[sea_orm(column_type = "Decimal(None)")]
    pub qty_per: Decimal,
    pub uom_id: Option<i32>,
    #[sea_orm(column_type = "Decimal(None)")]
    pub scrap_pct: Decimal,
    pub is_optional: bool,
    pub alt_group: Option<String>,
    pub color_match_rule: Option<String>,
    pub size_rule: Option<String>,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bom::Entity",
        from = "Column::BomId",
        to = "super::bom::Column::Id",
        on_delete = "Cascade"
    )]
    Bom,
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ComponentItemId",
        to = "super::item::Column::Id"
    )]
    ComponentItem,
    #[sea_orm(
        belongs_to = "super::uom::Entity",
        from = "Column::UomId",
        to = "super::uom::Column::Id"
    )]
    Uom,
}

impl Related<super::bom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bom.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ComponentItem.def()
    }
}

impl Related<super::uom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Uom.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
