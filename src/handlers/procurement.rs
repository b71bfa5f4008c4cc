use super::common::{
    created_response, require, success_response, ApiPath, CreatedId, ValidatedJson,
};
use crate::{
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::procurement::{
        AddPoLineInput, CreatePurchaseOrderInput, CreateSupplierInput, CreateSupplierItemInput,
        PoLineAdded, PurchaseOrderDetail, PurchaseOrderView, SupplierItemView, SupplierView,
    },
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Creates the router for supplier and purchase order endpoints
pub fn procurement_routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/supplier_items",
            get(list_supplier_items).post(create_supplier_item),
        )
        .route("/pos", get(list_purchase_orders).post(create_purchase_order))
        .route("/pos/:id", get(get_purchase_order))
        .route("/pos/:id/lines", post(add_po_line))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    pub country: Option<String>,
    pub payment_terms: Option<String>,
    pub lead_time_days: Option<i32>,
    #[validate(length(max = 3))]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierItemRequest {
    pub supplier_id: Option<i32>,
    pub item_id: Option<i32>,
    pub vendor_sku: Option<String>,
    pub price: Option<Decimal>,
    pub moq: Option<Decimal>,
    pub incoterms: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderRequest {
    pub supplier_id: Option<i32>,
    pub po_number: Option<String>,
    pub status: Option<String>,
    pub eta: Option<NaiveDate>,
    #[validate(length(max = 3))]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddPoLineRequest {
    pub item_id: Option<i32>,
    pub qty: Option<Decimal>,
    pub price: Option<Decimal>,
    pub uom_id: Option<i32>,
    pub lot_request: Option<String>,
    pub shade_request: Option<String>,
}

#[utoipa::path(
    post,
    path = "/suppliers",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created", body = CreatedId),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "procurement"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = CreateSupplierInput {
        name: require(payload.name, "name")?,
        country: payload.country,
        payment_terms: payload.payment_terms,
        lead_time_days: payload.lead_time_days,
        currency: payload.currency,
    };

    let id = state.services.procurement.create_supplier(input).await?;
    Ok(created_response(CreatedId { id }))
}

#[utoipa::path(
    get,
    path = "/suppliers",
    responses(
        (status = 200, description = "Suppliers listed", body = [SupplierView])
    ),
    tag = "procurement"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let suppliers = state.services.procurement.list_suppliers().await?;
    Ok(success_response(suppliers))
}

#[utoipa::path(
    post,
    path = "/supplier_items",
    request_body = CreateSupplierItemRequest,
    responses(
        (status = 201, description = "Supplier item created", body = CreatedId),
        (status = 400, description = "Missing or unknown supplier/item", body = ErrorResponse)
    ),
    tag = "procurement"
)]
pub async fn create_supplier_item(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateSupplierItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = CreateSupplierItemInput {
        supplier_id: require(payload.supplier_id, "supplier_id")?,
        item_id: require(payload.item_id, "item_id")?,
        vendor_sku: payload.vendor_sku,
        price: payload.price,
        moq: payload.moq,
        incoterms: payload.incoterms,
    };

    let id = state.services.procurement.create_supplier_item(input).await?;
    Ok(created_response(CreatedId { id }))
}

#[utoipa::path(
    get,
    path = "/supplier_items",
    responses(
        (status = 200, description = "Supplier items listed", body = [SupplierItemView])
    ),
    tag = "procurement"
)]
pub async fn list_supplier_items(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.services.procurement.list_supplier_items().await?;
    Ok(success_response(items))
}

#[utoipa::path(
    post,
    path = "/pos",
    request_body = CreatePurchaseOrderRequest,
    responses(
        (status = 201, description = "Purchase order created with a zero total", body = CreatedId),
        (status = 400, description = "Missing or unknown supplier", body = ErrorResponse)
    ),
    tag = "procurement"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = CreatePurchaseOrderInput {
        supplier_id: require(payload.supplier_id, "supplier_id")?,
        po_number: payload.po_number,
        status: payload.status,
        eta: payload.eta,
        currency: payload.currency,
    };

    let id = state
        .services
        .procurement
        .create_purchase_order(input)
        .await?;
    Ok(created_response(CreatedId { id }))
}

#[utoipa::path(
    get,
    path = "/pos",
    responses(
        (status = 200, description = "Purchase orders listed", body = [PurchaseOrderView])
    ),
    tag = "procurement"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let pos = state.services.procurement.list_purchase_orders().await?;
    Ok(success_response(pos))
}

#[utoipa::path(
    get,
    path = "/pos/{id}",
    params(
        ("id" = i32, Path, description = "Purchase order ID")
    ),
    responses(
        (status = 200, description = "Purchase order with lines", body = PurchaseOrderDetail),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    tag = "procurement"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let po = state.services.procurement.get_purchase_order(id).await?;
    Ok(success_response(po))
}

#[utoipa::path(
    post,
    path = "/pos/{id}/lines",
    request_body = AddPoLineRequest,
    params(
        ("id" = i32, Path, description = "Purchase order ID")
    ),
    responses(
        (status = 201, description = "Line added; returns the recomputed total", body = PoLineAdded),
        (status = 400, description = "Invalid line or unknown item", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    tag = "procurement"
)]
pub async fn add_po_line(
    State(state): State<AppState>,
    ApiPath(po_id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<AddPoLineRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = AddPoLineInput {
        item_id: require(payload.item_id, "item_id")?,
        qty: require(payload.qty, "qty")?,
        price: require(payload.price, "price")?,
        uom_id: payload.uom_id,
        lot_request: payload.lot_request,
        shade_request: payload.shade_request,
    };

    let added = state.services.procurement.add_po_line(po_id, input).await?;
    Ok(created_response(added))
}
