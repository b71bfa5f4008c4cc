use super::common::{
    created_response, require, success_response, ApiPath, CreatedId, ValidatedJson,
};
use crate::{
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::catalog::{CodeView, CreateItemInput, ItemFilter, ItemView},
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Creates the router for catalog endpoints
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", get(get_item))
        .route("/categories", get(list_categories).post(create_category))
        .route("/uoms", get(list_uoms).post(create_uom))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(max = 64))]
    pub sku: Option<String>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    /// Category code
    pub category: Option<String>,
    /// Base unit of measure code
    pub base_uom: Option<String>,
    pub brand: Option<String>,
    pub active: Option<bool>,
    #[schema(value_type = Option<Object>)]
    pub spec: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCodeRequest {
    #[validate(length(max = 32))]
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemQuery {
    /// Exact category code
    pub category: Option<String>,
    /// Case-insensitive substring of the item name
    pub q: Option<String>,
}

#[utoipa::path(
    get,
    path = "/items",
    params(ItemQuery),
    responses(
        (status = 200, description = "Items listed", body = [ItemView])
    ),
    tag = "catalog"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state
        .services
        .catalog
        .list_items(ItemFilter {
            category_code: query.category,
            name_contains: query.q,
        })
        .await?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/items/{id}",
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item fetched", body = ItemView),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.catalog.get_item(id).await?;
    Ok(success_response(item))
}

#[utoipa::path(
    post,
    path = "/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = CreatedId),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Duplicate SKU", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_item(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = CreateItemInput {
        sku: require(payload.sku, "sku")?,
        name: require(payload.name, "name")?,
        category_code: require(payload.category, "category")?,
        base_uom_code: require(payload.base_uom, "base_uom")?,
        brand: payload.brand,
        active: payload.active.unwrap_or(true),
        spec: payload.spec.unwrap_or_default(),
    };

    let id = state.services.catalog.create_item(input).await?;
    Ok(created_response(CreatedId { id }))
}

#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "Categories listed", body = [CodeView])
    ),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(success_response(categories))
}

#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCodeRequest,
    responses(
        (status = 201, description = "Category created", body = CreatedId),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Duplicate code", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateCodeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let code = require(payload.code, "code")?;
    let id = state.services.catalog.create_category(&code).await?;
    Ok(created_response(CreatedId { id }))
}

#[utoipa::path(
    get,
    path = "/uoms",
    responses(
        (status = 200, description = "Units of measure listed", body = [CodeView])
    ),
    tag = "catalog"
)]
pub async fn list_uoms(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let uoms = state.services.catalog.list_uoms().await?;
    Ok(success_response(uoms))
}

#[utoipa::path(
    post,
    path = "/uoms",
    request_body = CreateCodeRequest,
    responses(
        (status = 201, description = "Unit of measure created", body = CreatedId),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Duplicate code", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_uom(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateCodeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let code = require(payload.code, "code")?;
    let id = state.services.catalog.create_uom(&code).await?;
    Ok(created_response(CreatedId { id }))
}
