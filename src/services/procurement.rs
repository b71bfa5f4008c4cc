use crate::{
    db::{self, references, DbPool},
    entities::{item, po_line, purchase_order, supplier, supplier_item, uom},
    errors::ServiceError,
    services::decimals,
};
use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Clone)]
pub struct CreateSupplierInput {
    pub name: String,
    pub country: Option<String>,
    pub payment_terms: Option<String>,
    pub lead_time_days: Option<i32>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateSupplierItemInput {
    pub supplier_id: i32,
    pub item_id: i32,
    pub vendor_sku: Option<String>,
    pub price: Option<Decimal>,
    pub moq: Option<Decimal>,
    pub incoterms: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: i32,
    pub po_number: Option<String>,
    pub status: Option<String>,
    pub eta: Option<NaiveDate>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AddPoLineInput {
    pub item_id: i32,
    pub qty: Decimal,
    pub price: Decimal,
    pub uom_id: Option<i32>,
    pub lot_request: Option<String>,
    pub shade_request: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SupplierView {
    pub id: i32,
    pub name: String,
    pub country: Option<String>,
    pub payment_terms: Option<String>,
    pub lead_time_days: Option<i32>,
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<supplier::Model> for SupplierView {
    fn from(s: supplier::Model) -> Self {
        Self {
            id: s.id,
            name: s.name,
            country: s.country,
            payment_terms: s.payment_terms,
            lead_time_days: s.lead_time_days,
            currency: s.currency,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Supplier-item price link; decimals are null when not recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SupplierItemView {
    pub id: i32,
    pub supplier_id: i32,
    pub item_id: i32,
    pub vendor_sku: Option<String>,
    pub price: Option<Decimal>,
    pub moq: Option<Decimal>,
    pub incoterms: Option<String>,
}

impl From<supplier_item::Model> for SupplierItemView {
    fn from(si: supplier_item::Model) -> Self {
        Self {
            id: si.id,
            supplier_id: si.supplier_id,
            item_id: si.item_id,
            vendor_sku: si.vendor_sku,
            price: si.price.map(|p| p.normalize()),
            moq: si.moq.map(|m| m.normalize()),
            incoterms: si.incoterms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PurchaseOrderView {
    pub id: i32,
    pub supplier_id: i32,
    pub po_number: Option<String>,
    pub status: Option<String>,
    pub eta: Option<NaiveDate>,
    pub currency: Option<String>,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<purchase_order::Model> for PurchaseOrderView {
    fn from(po: purchase_order::Model) -> Self {
        Self {
            id: po.id,
            supplier_id: po.supplier_id,
            po_number: po.po_number,
            status: po.status,
            eta: po.eta,
            currency: po.currency,
            total: po.total.normalize(),
            created_at: po.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PoLineView {
    pub id: i32,
    pub item_id: i32,
    pub qty: Decimal,
    pub uom_id: Option<i32>,
    pub price: Decimal,
    pub lot_request: Option<String>,
    pub shade_request: Option<String>,
}

impl From<po_line::Model> for PoLineView {
    fn from(line: po_line::Model) -> Self {
        Self {
            id: line.id,
            item_id: line.item_id,
            qty: line.qty.normalize(),
            uom_id: line.uom_id,
            price: line.price.normalize(),
            lot_request: line.lot_request,
            shade_request: line.shade_request,
        }
    }
}

/// Purchase order header together with its lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PurchaseOrderDetail {
    pub id: i32,
    pub supplier_id: i32,
    pub po_number: Option<String>,
    pub status: Option<String>,
    pub eta: Option<NaiveDate>,
    pub currency: Option<String>,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<PoLineView>,
}

/// Result of adding a line: the new line id and the recomputed PO total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PoLineAdded {
    pub id: i32,
    pub po_total: Decimal,
}

/// Sums `qty * price` over the given lines.
pub fn po_total<'a, I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = &'a po_line::Model>,
{
    lines
        .into_iter()
        .fold(Decimal::ZERO, |acc, line| acc + line.amount())
}

/// Procurement ledger: suppliers, supplier items and purchase orders
#[derive(Clone)]
pub struct ProcurementService {
    db_pool: Arc<DbPool>,
}

impl ProcurementService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_supplier(&self, input: CreateSupplierInput) -> Result<i32, ServiceError> {
        let db = &*self.db_pool;

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError("name is required".to_string()));
        }
        if matches!(input.lead_time_days, Some(days) if days < 0) {
            return Err(ServiceError::ValidationError(
                "lead_time_days must not be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let model = supplier::ActiveModel {
            id: NotSet,
            name: Set(name),
            country: Set(input.country),
            payment_terms: Set(input.payment_terms),
            lead_time_days: Set(input.lead_time_days),
            currency: Set(input.currency),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(supplier_id = model.id, "Supplier created");
        Ok(model.id)
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(&self) -> Result<Vec<SupplierView>, ServiceError> {
        let db = &*self.db_pool;
        let suppliers = supplier::Entity::find()
            .order_by_asc(supplier::Column::Id)
            .all(db)
            .await?;
        Ok(suppliers.into_iter().map(SupplierView::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn create_supplier_item(
        &self,
        input: CreateSupplierItemInput,
    ) -> Result<i32, ServiceError> {
        let db = &*self.db_pool;

        let price = input
            .price
            .map(|p| decimals::check_input("price", p))
            .transpose()?;
        let moq = input
            .moq
            .map(|m| decimals::check_input("moq", m))
            .transpose()?;

        references::ensure_exists::<supplier::Entity, _, _>(db, input.supplier_id, || {
            ServiceError::ReferenceError(format!("supplier {} not found", input.supplier_id))
        })
        .await?;
        references::ensure_exists::<item::Entity, _, _>(db, input.item_id, || {
            ServiceError::ReferenceError(format!("item {} not found", input.item_id))
        })
        .await?;

        let model = supplier_item::ActiveModel {
            id: NotSet,
            supplier_id: Set(input.supplier_id),
            item_id: Set(input.item_id),
            vendor_sku: Set(input.vendor_sku),
            price: Set(price),
            moq: Set(moq),
            incoterms: Set(input.incoterms),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write(e, "supplier item"))?;

        info!(supplier_item_id = model.id, "Supplier item created");
        Ok(model.id)
    }

    #[instrument(skip(self))]
    pub async fn list_supplier_items(&self) -> Result<Vec<SupplierItemView>, ServiceError> {
        let db = &*self.db_pool;
        let items = supplier_item::Entity::find()
            .order_by_asc(supplier_item::Column::Id)
            .all(db)
            .await?;
        Ok(items.into_iter().map(SupplierItemView::from).collect())
    }

    /// Creates a purchase order with a zero total
    #[instrument(skip(self))]
    pub async fn create_purchase_order(
        &self,
        input: CreatePurchaseOrderInput,
    ) -> Result<i32, ServiceError> {
        let db = &*self.db_pool;

        references::ensure_exists::<supplier::Entity, _, _>(db, input.supplier_id, || {
            ServiceError::ReferenceError(format!("supplier {} not found", input.supplier_id))
        })
        .await?;

        let model = purchase_order::ActiveModel {
            id: NotSet,
            supplier_id: Set(input.supplier_id),
            po_number: Set(input.po_number),
            status: Set(input.status),
            eta: Set(input.eta),
            currency: Set(input.currency),
            total: Set(Decimal::ZERO),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write(e, "purchase order"))?;

        info!(po_id = model.id, "Purchase order created");
        Ok(model.id)
    }

    #[instrument(skip(self))]
    pub async fn list_purchase_orders(&self) -> Result<Vec<PurchaseOrderView>, ServiceError> {
        let db = &*self.db_pool;
        let pos = purchase_order::Entity::find()
            .order_by_asc(purchase_order::Column::Id)
            .all(db)
            .await?;
        Ok(pos.into_iter().map(PurchaseOrderView::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_purchase_order(&self, id: i32) -> Result<PurchaseOrderDetail, ServiceError> {
        let db = &*self.db_pool;

        let po = purchase_order::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("purchase order {} not found", id)))?;
        let lines = po_line::Entity::find()
            .filter(po_line::Column::PoId.eq(id))
            .order_by_asc(po_line::Column::Id)
            .all(db)
            .await?;

        Ok(PurchaseOrderDetail {
            id: po.id,
            supplier_id: po.supplier_id,
            po_number: po.po_number,
            status: po.status,
            eta: po.eta,
            currency: po.currency,
            total: po.total.normalize(),
            created_at: po.created_at,
            lines: lines.into_iter().map(PoLineView::from).collect(),
        })
    }

    /// Adds a line and recomputes the PO total from every persisted line.
    ///
    /// The transaction opens with a write to the PO row, so it holds the
    /// row lock (Postgres) or the database write lock (SQLite) before it
    /// reads anything. Concurrent additions to the same PO queue behind it
    /// instead of losing each other's contribution.
    #[instrument(skip(self, input), fields(item_id = input.item_id))]
    pub async fn add_po_line(
        &self,
        po_id: i32,
        input: AddPoLineInput,
    ) -> Result<PoLineAdded, ServiceError> {
        let qty = decimals::check_input("qty", input.qty)?;
        let price = decimals::check_input("price", input.price)?;
        if qty <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "qty must be greater than 0".to_string(),
            ));
        }
        if price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }

        let added = db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let touched = purchase_order::Entity::update_many()
                    .col_expr(
                        purchase_order::Column::Total,
                        Expr::col(purchase_order::Column::Total).into(),
                    )
                    .filter(purchase_order::Column::Id.eq(po_id))
                    .exec(txn)
                    .await?;
                if touched.rows_affected == 0 {
                    return Err(ServiceError::NotFound(format!(
                        "purchase order {} not found",
                        po_id
                    )));
                }

                let po = purchase_order::Entity::find_by_id(po_id)
                    .lock_exclusive()
                    .one(txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("purchase order {} not found", po_id))
                    })?;

                references::ensure_exists::<item::Entity, _, _>(txn, input.item_id, || {
                    ServiceError::ReferenceError(format!("item {} not found", input.item_id))
                })
                .await?;
                if let Some(uom_id) = input.uom_id {
                    references::ensure_exists::<uom::Entity, _, _>(txn, uom_id, || {
                        ServiceError::ReferenceError(format!("uom {} not found", uom_id))
                    })
                    .await?;
                }

                let line = po_line::ActiveModel {
                    id: NotSet,
                    po_id: Set(po_id),
                    item_id: Set(input.item_id),
                    qty: Set(qty),
                    uom_id: Set(input.uom_id),
                    price: Set(price),
                    lot_request: Set(input.lot_request),
                    shade_request: Set(input.shade_request),
                }
                .insert(txn)
                .await
                .map_err(|e| ServiceError::from_write(e, "purchase order line"))?;

                let total = recompute_total(txn, po).await?;

                Ok(PoLineAdded {
                    id: line.id,
                    po_total: total,
                })
            })
        })
        .await?;

        counter!("satorial_procurement.po_lines_added", 1);
        info!(po_id, line_id = added.id, po_total = %added.po_total, "PO line added");
        Ok(added)
    }
}

async fn recompute_total<C: ConnectionTrait>(
    conn: &C,
    po: purchase_order::Model,
) -> Result<Decimal, ServiceError> {
    let lines = po_line::Entity::find()
        .filter(po_line::Column::PoId.eq(po.id))
        .all(conn)
        .await?;
    let total = decimals::check_storable("purchase order total", po_total(&lines))?;

    let mut active = po.into_active_model();
    active.total = Set(total);
    active.update(conn).await?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn line(qty: Decimal, price: Decimal) -> po_line::Model {
        po_line::Model {
            id: 0,
            po_id: 1,
            item_id: 1,
            qty,
            uom_id: None,
            price,
            lot_request: None,
            shade_request: None,
        }
    }

    #[test]
    fn total_of_no_lines_is_zero() {
        assert_eq!(po_total(&Vec::<po_line::Model>::new()), Decimal::ZERO);
    }

    #[test]
    fn total_is_exact_for_fractional_prices() {
        let lines: Vec<_> = (0..10).map(|_| line(dec!(1), dec!(0.1))).collect();
        assert_eq!(po_total(&lines), dec!(1.0));
    }

    #[test]
    fn views_render_decimals_as_strings() {
        let view = PoLineView::from(line(dec!(2.0000), dec!(5.2500)));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["qty"], "2");
        assert_eq!(json["price"], "5.25");
    }

    proptest! {
        #[test]
        fn total_matches_sum_in_any_order(
            raw in prop::collection::vec((1i64..10_000, 0i64..1_000_000), 0..20)
        ) {
            let lines: Vec<_> = raw
                .iter()
                .map(|(q, p)| line(Decimal::new(*q, 2), Decimal::new(*p, 4)))
                .collect();
            let expected = raw.iter().fold(Decimal::ZERO, |acc, (q, p)| {
                acc + Decimal::new(*q, 2) * Decimal::new(*p, 4)
            });

            let mut reversed = lines.clone();
            reversed.reverse();

            prop_assert_eq!(po_total(&lines), expected);
            prop_assert_eq!(po_total(&reversed), expected);
        }
    }
}
