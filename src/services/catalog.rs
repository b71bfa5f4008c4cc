use crate::{
    db::DbPool,
    entities::{item, item_category, uom},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Input for creating a catalog item
#[derive(Debug, Clone)]
pub struct CreateItemInput {
    pub sku: String,
    pub name: String,
    pub category_code: String,
    pub base_uom_code: String,
    pub brand: Option<String>,
    pub active: bool,
    pub spec: Map<String, Value>,
}

/// Filters for listing items; both are optional and combine with AND
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub category_code: Option<String>,
    pub name_contains: Option<String>,
}

/// Item projection with category and UoM resolved to their codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemView {
    pub id: i32,
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub base_uom: Option<String>,
    pub brand: Option<String>,
    pub active: bool,
    #[schema(value_type = Object)]
    pub spec: Map<String, Value>,
}

/// A category or unit of measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CodeView {
    pub id: i32,
    pub code: String,
}

impl From<item_category::Model> for CodeView {
    fn from(model: item_category::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
        }
    }
}

impl From<uom::Model> for CodeView {
    fn from(model: uom::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
        }
    }
}

/// Catalog store: items, categories and units of measure
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates an item after resolving its category and UoM codes
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_item(&self, input: CreateItemInput) -> Result<i32, ServiceError> {
        let db = &*self.db_pool;

        let sku = input.sku.trim().to_string();
        let name = input.name.trim().to_string();
        if sku.is_empty() {
            return Err(ServiceError::ValidationError("sku is required".to_string()));
        }
        if name.is_empty() {
            return Err(ServiceError::ValidationError("name is required".to_string()));
        }

        let category = item_category::Entity::find()
            .filter(item_category::Column::Code.eq(input.category_code.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "unknown category code '{}'",
                    input.category_code
                ))
            })?;
        let base_uom = uom::Entity::find()
            .filter(uom::Column::Code.eq(input.base_uom_code.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("unknown uom code '{}'", input.base_uom_code))
            })?;

        let existing = item::Entity::find()
            .filter(item::Column::Sku.eq(sku.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "item with sku {} already exists",
                sku
            )));
        }

        let spec = serde_json::to_string(&input.spec)?;

        let model = item::ActiveModel {
            id: NotSet,
            sku: Set(sku.clone()),
            name: Set(name),
            category_id: Set(Some(category.id)),
            base_uom_id: Set(Some(base_uom.id)),
            brand: Set(input.brand),
            active: Set(input.active),
            spec: Set(spec),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write(e, &format!("item with sku {}", sku)))?;

        info!(item_id = model.id, "Item created");
        Ok(model.id)
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: i32) -> Result<ItemView, ServiceError> {
        let db = &*self.db_pool;

        let (item, category) = item::Entity::find_by_id(id)
            .find_also_related(item_category::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("item {} not found", id)))?;

        let mut views = self.project(vec![(item, category)]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::InternalError(format!("item {} lost during projection", id)))
    }

    /// Lists items in id order, applying the category and name filters when set
    #[instrument(skip(self))]
    pub async fn list_items(&self, filter: ItemFilter) -> Result<Vec<ItemView>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = item::Entity::find().find_also_related(item_category::Entity);

        if let Some(code) = filter.category_code.filter(|c| !c.is_empty()) {
            query = query.filter(item_category::Column::Code.eq(code));
        }
        let mut rows = query.order_by_asc(item::Column::Id).all(db).await?;

        // SQLite's lower() only folds ASCII, so the name match runs here.
        if let Some(needle) = filter.name_contains.filter(|q| !q.is_empty()) {
            let needle = needle.to_lowercase();
            rows.retain(|(item, _)| name_matches(&item.name, &needle));
        }

        self.project(rows).await
    }

    async fn project(
        &self,
        rows: Vec<(item::Model, Option<item_category::Model>)>,
    ) -> Result<Vec<ItemView>, ServiceError> {
        let db = &*self.db_pool;

        let uom_ids: Vec<i32> = rows.iter().filter_map(|(i, _)| i.base_uom_id).collect();
        let uoms: HashMap<i32, String> = if uom_ids.is_empty() {
            HashMap::new()
        } else {
            uom::Entity::find()
                .filter(uom::Column::Id.is_in(uom_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|u| (u.id, u.code))
                .collect()
        };

        rows.into_iter()
            .map(|(item, category)| -> Result<ItemView, ServiceError> {
                let spec: Map<String, Value> = serde_json::from_str(&item.spec)?;
                Ok(ItemView {
                    id: item.id,
                    base_uom: item.base_uom_id.and_then(|id| uoms.get(&id).cloned()),
                    category: category.map(|c| c.code),
                    sku: item.sku,
                    name: item.name,
                    brand: item.brand,
                    active: item.active,
                    spec,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    pub async fn create_category(&self, code: &str) -> Result<i32, ServiceError> {
        let db = &*self.db_pool;
        let code = normalize_code(code)?;

        let existing = item_category::Entity::find()
            .filter(item_category::Column::Code.eq(code.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "category {} already exists",
                code
            )));
        }

        let model = item_category::ActiveModel {
            id: NotSet,
            code: Set(code.clone()),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write(e, &format!("category {}", code)))?;

        info!(category_id = model.id, "Category created");
        Ok(model.id)
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CodeView>, ServiceError> {
        let db = &*self.db_pool;
        let categories = item_category::Entity::find()
            .order_by_asc(item_category::Column::Id)
            .all(db)
            .await?;
        Ok(categories.into_iter().map(CodeView::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn create_uom(&self, code: &str) -> Result<i32, ServiceError> {
        let db = &*self.db_pool;
        let code = normalize_code(code)?;

        let existing = uom::Entity::find()
            .filter(uom::Column::Code.eq(code.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!("uom {} already exists", code)));
        }

        let model = uom::ActiveModel {
            id: NotSet,
            code: Set(code.clone()),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write(e, &format!("uom {}", code)))?;

        info!(uom_id = model.id, "Unit of measure created");
        Ok(model.id)
    }

    #[instrument(skip(self))]
    pub async fn list_uoms(&self) -> Result<Vec<CodeView>, ServiceError> {
        let db = &*self.db_pool;
        let uoms = uom::Entity::find()
            .order_by_asc(uom::Column::Id)
            .all(db)
            .await?;
        Ok(uoms.into_iter().map(CodeView::from).collect())
    }
}

/// Case-insensitive substring match; `needle` must already be lowercased.
fn name_matches(name: &str, needle: &str) -> bool {
    name.to_lowercase().contains(needle)
}

fn normalize_code(code: &str) -> Result<String, ServiceError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ServiceError::ValidationError("code is required".to_string()));
    }
    Ok(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_codes_are_rejected() {
        assert!(matches!(
            normalize_code("   "),
            Err(ServiceError::ValidationError(_))
        ));
        assert_eq!(normalize_code(" pcs ").unwrap(), "pcs");
    }

    #[test]
    fn name_match_folds_non_ascii_case() {
        assert!(name_matches("ÉTÉ Linen", "été"));
        assert!(name_matches("Straße Twill", "straße"));
        assert!(!name_matches("Oxford Cloth", "linen"));
    }
}
