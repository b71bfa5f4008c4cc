use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "po_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub po_id: i32,
    pub item_id: i32,
    #[sea_orm(column_type = "Decimal(None)")]
    pub qty: Decimal,
    pub uom_id: Option<i32>,
    #[sea_orm(column_type = "Decimal(None)")]
    pub price: Decimal,
    pub lot_request: Option<String>,
    pub shade_request: Option<String>,
}

impl Model {
    /// Extended amount of the line.
    pub fn amount(&self) -> Decimal {
        self.qty * self.price
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PoId",
        to = "super::purchase_order::Column::Id",
        on_delete = "Cascade"
    )]
    PurchaseOrder,
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
    #[sea_orm(
        belongs_to = "super::uom::Entity",
        from = "Column::UomId",
        to = "super::uom::Column::Id"
    )]
    Uom,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl Related<super::uom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Uom.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
