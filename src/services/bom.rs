use crate::{
    db::{self, references, DbPool},
    entities::{bom, bom_line, item, uom},
    errors::ServiceError,
    services::decimals,
};
use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

const MAX_SCRAP_PCT: Decimal = Decimal::ONE_HUNDRED;

/// Input for creating a BOM with its lines
#[derive(Debug, Clone)]
pub struct CreateBomInput {
    pub product_item_id: i32,
    pub version: i32,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub notes: Option<String>,
    pub lines: Vec<CreateBomLineInput>,
}

#[derive(Debug, Clone)]
pub struct CreateBomLineInput {
    pub component_item_id: i32,
    pub qty_per: Decimal,
    pub uom_id: Option<i32>,
    pub scrap_pct: Decimal,
    pub is_optional: bool,
    pub alt_group: Option<String>,
    pub color_match_rule: Option<String>,
    pub size_rule: Option<String>,
    pub notes: Option<String>,
}

/// Summary view returned when listing BOMs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BomSummary {
    pub id: i32,
    pub product_item_id: i32,
    pub version: i32,
}

/// BOM line with exact decimal quantities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BomLineView {
    pub id: i32,
    pub component_item_id: i32,
    pub qty_per: Decimal,
    pub uom_id: Option<i32>,
    pub scrap_pct: Decimal,
    pub is_optional: bool,
    pub alt_group: Option<String>,
    pub color_match_rule: Option<String>,
    pub size_rule: Option<String>,
    pub notes: Option<String>,
}

impl From<bom_line::Model> for BomLineView {
    fn from(line: bom_line::Model) -> Self {
        Self {
            id: line.id,
            component_item_id: line.component_item_id,
            qty_per: line.qty_per.normalize(),
            uom_id: line.uom_id,
            scrap_pct: line.scrap_pct.normalize(),
            is_optional: line.is_optional,
            alt_group: line.alt_group,
            color_match_rule: line.color_match_rule,
            size_rule: line.size_rule,
            notes: line.notes,
        }
    }
}

/// Detailed BOM view including its lines in creation order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BomDetail {
    pub id: i32,
    pub product_item_id: i32,
    pub version: i32,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<BomLineView>,
}

/// BOM engine: versioned bills of materials and their component lines
#[derive(Clone)]
pub struct BomService {
    db_pool: Arc<DbPool>,
}

impl BomService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates a BOM and all of its lines in one transaction.
    ///
    /// Either every line is persisted together with the header or nothing is.
    #[instrument(skip(self, input), fields(product_item_id = input.product_item_id, lines = input.lines.len()))]
    pub async fn create_bom(&self, input: CreateBomInput) -> Result<i32, ServiceError> {
        validate_header(&input)?;
        for (idx, line) in input.lines.iter().enumerate() {
            validate_line(idx, line)?;
        }

        let bom_id = db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                // Write first so SQLite takes its write lock before any read.
                let header = bom::ActiveModel {
                    id: NotSet,
                    product_item_id: Set(input.product_item_id),
                    version: Set(input.version),
                    effective_from: Set(input.effective_from),
                    effective_to: Set(input.effective_to),
                    notes: Set(input.notes),
                    created_at: Set(Utc::now()),
                }
                .insert(txn)
                .await
                .map_err(|e| as_validation(e, "bom"))?;

                references::ensure_exists::<item::Entity, _, _>(txn, input.product_item_id, || {
                    ServiceError::ValidationError(format!(
                        "product item {} does not exist",
                        input.product_item_id
                    ))
                })
                .await?;

                for (idx, line) in input.lines.into_iter().enumerate() {
                    insert_line(txn, header.id, input.product_item_id, idx, line).await?;
                }

                Ok(header.id)
            })
        })
        .await?;

        counter!("satorial_bom.created", 1);
        info!(bom_id, "BOM created");
        Ok(bom_id)
    }

    #[instrument(skip(self))]
    pub async fn get_bom(&self, id: i32) -> Result<BomDetail, ServiceError> {
        let db = &*self.db_pool;

        let header = bom::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("bom {} not found", id)))?;

        let lines = bom_line::Entity::find()
            .filter(bom_line::Column::BomId.eq(id))
            .order_by_asc(bom_line::Column::Id)
            .all(db)
            .await?;

        Ok(BomDetail {
            id: header.id,
            product_item_id: header.product_item_id,
            version: header.version,
            effective_from: header.effective_from,
            effective_to: header.effective_to,
            notes: header.notes,
            created_at: header.created_at,
            lines: lines.into_iter().map(BomLineView::from).collect(),
        })
    }

    #[instrument(skip(self))]
    pub async fn list_boms(&self) -> Result<Vec<BomSummary>, ServiceError> {
        let db = &*self.db_pool;
        let boms = bom::Entity::find()
            .order_by_asc(bom::Column::Id)
            .all(db)
            .await?;

        Ok(boms
            .into_iter()
            .map(|b| BomSummary {
                id: b.id,
                product_item_id: b.product_item_id,
                version: b.version,
            })
            .collect())
    }
}

async fn insert_line<C: ConnectionTrait>(
    conn: &C,
    bom_id: i32,
    product_item_id: i32,
    idx: usize,
    line: CreateBomLineInput,
) -> Result<(), ServiceError> {
    references::ensure_exists::<item::Entity, _, _>(conn, line.component_item_id, || {
        ServiceError::ValidationError(format!(
            "line {}: component item {} does not exist",
            idx, line.component_item_id
        ))
    })
    .await?;
    if let Some(uom_id) = line.uom_id {
        references::ensure_exists::<uom::Entity, _, _>(conn, uom_id, || {
            ServiceError::ValidationError(format!("line {}: uom {} does not exist", idx, uom_id))
        })
        .await?;
    }
    if line.component_item_id == product_item_id {
        warn!(
            bom_id,
            component_item_id = line.component_item_id,
            "BOM line lists the product as its own component"
        );
    }

    bom_line::ActiveModel {
        id: NotSet,
        bom_id: Set(bom_id),
        component_item_id: Set(line.component_item_id),
        qty_per: Set(line.qty_per),
        uom_id: Set(line.uom_id),
        scrap_pct: Set(line.scrap_pct),
        is_optional: Set(line.is_optional),
        alt_group: Set(line.alt_group),
        color_match_rule: Set(line.color_match_rule),
        size_rule: Set(line.size_rule),
        notes: Set(line.notes),
    }
    .insert(conn)
    .await
    .map_err(|e| as_validation(e, &format!("line {}", idx)))?;

    Ok(())
}

// Constraint failures inside a BOM batch are reported as validation errors.
fn as_validation(err: DbErr, context: &str) -> ServiceError {
    match ServiceError::from_write(err, context) {
        ServiceError::ReferenceError(msg) => ServiceError::ValidationError(msg),
        other => other,
    }
}

fn validate_header(input: &CreateBomInput) -> Result<(), ServiceError> {
    if input.version < 1 {
        return Err(ServiceError::ValidationError(format!(
            "version must be at least 1, got {}",
            input.version
        )));
    }
    if let (Some(from), Some(to)) = (input.effective_from, input.effective_to) {
        if to < from {
            return Err(ServiceError::ValidationError(format!(
                "effective_to {} is before effective_from {}",
                to, from
            )));
        }
    }
    Ok(())
}

fn validate_line(idx: usize, line: &CreateBomLineInput) -> Result<(), ServiceError> {
    decimals::check_input(&format!("line {}: qty_per", idx), line.qty_per)?;
    decimals::check_input(&format!("line {}: scrap_pct", idx), line.scrap_pct)?;
    if line.qty_per <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "line {}: qty_per must be greater than 0",
            idx
        )));
    }
    if line.scrap_pct < Decimal::ZERO || line.scrap_pct >= MAX_SCRAP_PCT {
        return Err(ServiceError::ValidationError(format!(
            "line {}: scrap_pct must be in [0, 100)",
            idx
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(qty_per: Decimal, scrap_pct: Decimal) -> CreateBomLineInput {
        CreateBomLineInput {
            component_item_id: 2,
            qty_per,
            uom_id: None,
            scrap_pct,
            is_optional: false,
            alt_group: None,
            color_match_rule: None,
            size_rule: None,
            notes: None,
        }
    }

    fn header(version: i32) -> CreateBomInput {
        CreateBomInput {
            product_item_id: 1,
            version,
            effective_from: None,
            effective_to: None,
            notes: None,
            lines: vec![],
        }
    }

    #[test]
    fn qty_per_must_be_positive() {
        assert!(validate_line(0, &line(dec!(0), dec!(0))).is_err());
        assert!(validate_line(0, &line(dec!(-1.5), dec!(0))).is_err());
        assert!(validate_line(0, &line(dec!(0.0001), dec!(0))).is_ok());
    }

    #[test]
    fn scrap_pct_is_half_open() {
        assert!(validate_line(0, &line(dec!(1), dec!(0))).is_ok());
        assert!(validate_line(0, &line(dec!(1), dec!(99.99))).is_ok());
        assert!(validate_line(0, &line(dec!(1), dec!(100))).is_err());
        assert!(validate_line(0, &line(dec!(1), dec!(-0.01))).is_err());
    }

    #[test]
    fn line_decimals_are_bounded() {
        assert!(validate_line(0, &line(dec!(0.00001), dec!(0))).is_err());
        assert!(validate_line(0, &line(dec!(1234567890123.4567), dec!(0))).is_err());
        assert!(validate_line(0, &line(dec!(1), dec!(2.00005))).is_err());
        assert!(validate_line(0, &line(dec!(12345678901.2345), dec!(99.9999))).is_ok());
    }

    #[test]
    fn version_must_be_at_least_one() {
        assert!(validate_header(&header(0)).is_err());
        assert!(validate_header(&header(1)).is_ok());
    }

    #[test]
    fn inverted_effective_range_is_rejected() {
        let mut input = header(1);
        input.effective_from = NaiveDate::from_ymd_opt(2024, 6, 1);
        input.effective_to = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert!(matches!(
            validate_header(&input),
            Err(ServiceError::ValidationError(_))
        ));

        input.effective_to = NaiveDate::from_ymd_opt(2024, 6, 1);
        assert!(validate_header(&input).is_ok());
    }

    #[test]
    fn line_view_renders_normalized_decimals() {
        let view = BomLineView::from(bom_line::Model {
            id: 1,
            bom_id: 1,
            component_item_id: 2,
            qty_per: dec!(2.5000),
            uom_id: None,
            scrap_pct: dec!(0.0000),
            is_optional: false,
            alt_group: None,
            color_match_rule: None,
            size_rule: None,
            notes: None,
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["qty_per"], "2.5");
        assert_eq!(json["scrap_pct"], "0");
    }
}
