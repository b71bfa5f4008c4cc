use super::common::{created_response, require, success_response, CreatedId, ValidatedJson};
use crate::{
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::warehouses::{CreateLocationInput, CreateWarehouseInput, LocationView, WarehouseView},
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Creates the router for warehouse and location endpoints
pub fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/warehouses", get(list_warehouses).post(create_warehouse))
        .route("/locations", get(list_locations).post(create_location))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateWarehouseRequest {
    #[validate(length(max = 32))]
    pub code: Option<String>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLocationRequest {
    pub warehouse_id: Option<i32>,
    #[validate(length(max = 64))]
    pub code: Option<String>,
    /// Free-form kind, e.g. "bin", "rack", "staging"
    #[serde(rename = "type")]
    pub location_type: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationQuery {
    /// Only locations of this warehouse
    pub warehouse_id: Option<i32>,
}

#[utoipa::path(
    post,
    path = "/warehouses",
    request_body = CreateWarehouseRequest,
    responses(
        (status = 201, description = "Warehouse created", body = CreatedId),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Duplicate code", body = ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn create_warehouse(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateWarehouseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = CreateWarehouseInput {
        code: require(payload.code, "code")?,
        name: require(payload.name, "name")?,
    };

    let id = state.services.warehouses.create_warehouse(input).await?;
    Ok(created_response(CreatedId { id }))
}

#[utoipa::path(
    get,
    path = "/warehouses",
    responses(
        (status = 200, description = "Warehouses listed", body = [WarehouseView])
    ),
    tag = "warehouses"
)]
pub async fn list_warehouses(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouses = state.services.warehouses.list_warehouses().await?;
    Ok(success_response(warehouses))
}

#[utoipa::path(
    post,
    path = "/locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = CreatedId),
        (status = 400, description = "Missing or unknown warehouse", body = ErrorResponse),
        (status = 409, description = "Code already used in this warehouse", body = ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn create_location(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateLocationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = CreateLocationInput {
        warehouse_id: require(payload.warehouse_id, "warehouse_id")?,
        code: require(payload.code, "code")?,
        location_type: payload.location_type,
    };

    let id = state.services.warehouses.create_location(input).await?;
    Ok(created_response(CreatedId { id }))
}

#[utoipa::path(
    get,
    path = "/locations",
    params(LocationQuery),
    responses(
        (status = 200, description = "Locations listed", body = [LocationView])
    ),
    tag = "warehouses"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let locations = state
        .services
        .warehouses
        .list_locations(query.warehouse_id)
        .await?;
    Ok(success_response(locations))
}
