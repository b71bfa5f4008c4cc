use crate::{
    db::{references, DbPool},
    entities::{location, warehouse},
    errors::ServiceError,
};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Clone)]
pub struct CreateWarehouseInput {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CreateLocationInput {
    pub warehouse_id: i32,
    pub code: String,
    pub location_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WarehouseView {
    pub id: i32,
    pub code: String,
    pub name: String,
}

impl From<warehouse::Model> for WarehouseView {
    fn from(model: warehouse::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationView {
    pub id: i32,
    pub warehouse_id: i32,
    pub code: String,
    #[serde(rename = "type")]
    pub location_type: Option<String>,
}

impl From<location::Model> for LocationView {
    fn from(model: location::Model) -> Self {
        Self {
            id: model.id,
            warehouse_id: model.warehouse_id,
            code: model.code,
            location_type: model.location_type,
        }
    }
}

/// Warehouses and the storage locations inside them
#[derive(Clone)]
pub struct WarehouseService {
    db_pool: Arc<DbPool>,
}

impl WarehouseService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_warehouse(&self, input: CreateWarehouseInput) -> Result<i32, ServiceError> {
        let db = &*self.db_pool;
        let code = required("code", &input.code)?;
        let name = required("name", &input.name)?;

        let existing = warehouse::Entity::find()
            .filter(warehouse::Column::Code.eq(code.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "warehouse {} already exists",
                code
            )));
        }

        let model = warehouse::ActiveModel {
            id: NotSet,
            code: Set(code.clone()),
            name: Set(name),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write(e, &format!("warehouse {}", code)))?;

        info!(warehouse_id = model.id, "Warehouse created");
        Ok(model.id)
    }

    #[instrument(skip(self))]
    pub async fn list_warehouses(&self) -> Result<Vec<WarehouseView>, ServiceError> {
        let db = &*self.db_pool;
        let warehouses = warehouse::Entity::find()
            .order_by_asc(warehouse::Column::Id)
            .all(db)
            .await?;
        Ok(warehouses.into_iter().map(WarehouseView::from).collect())
    }

    /// Creates a location; codes are unique within their warehouse.
    #[instrument(skip(self, input), fields(warehouse_id = input.warehouse_id))]
    pub async fn create_location(&self, input: CreateLocationInput) -> Result<i32, ServiceError> {
        let db = &*self.db_pool;
        let code = required("code", &input.code)?;

        references::ensure_exists::<warehouse::Entity, _, _>(db, input.warehouse_id, || {
            ServiceError::ReferenceError(format!("warehouse {} not found", input.warehouse_id))
        })
        .await?;

        let existing = location::Entity::find()
            .filter(location::Column::WarehouseId.eq(input.warehouse_id))
            .filter(location::Column::Code.eq(code.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "location {} already exists in warehouse {}",
                code, input.warehouse_id
            )));
        }

        let model = location::ActiveModel {
            id: NotSet,
            warehouse_id: Set(input.warehouse_id),
            code: Set(code.clone()),
            location_type: Set(input.location_type),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write(e, &format!("location {}", code)))?;

        info!(location_id = model.id, "Location created");
        Ok(model.id)
    }

    /// Lists locations in id order, optionally only those of one warehouse
    #[instrument(skip(self))]
    pub async fn list_locations(
        &self,
        warehouse_id: Option<i32>,
    ) -> Result<Vec<LocationView>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = location::Entity::find();
        if let Some(id) = warehouse_id {
            query = query.filter(location::Column::WarehouseId.eq(id));
        }
        let locations = query.order_by_asc(location::Column::Id).all(db).await?;
        Ok(locations.into_iter().map(LocationView::from).collect())
    }
}

fn required(field: &str, value: &str) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::ValidationError(format!("{} is required", field)));
    }
    Ok(value.to_string())
}
