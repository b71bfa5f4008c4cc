use super::common::{
    created_response, require, success_response, ApiPath, CreatedId, ValidatedJson,
};
use crate::{
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::bom::{BomDetail, BomSummary, CreateBomInput, CreateBomLineInput},
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Creates the router for BOM endpoints
pub fn bom_routes() -> Router<AppState> {
    Router::new()
        .route("/boms", get(list_boms).post(create_bom))
        .route("/boms/:id", get(get_bom))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBomRequest {
    pub product_item_id: Option<i32>,
    /// Defaults to 1
    pub version: Option<i32>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default)]
    pub lines: Vec<BomLineRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BomLineRequest {
    pub component_item_id: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub qty_per: Option<Decimal>,
    pub uom_id: Option<i32>,
    /// Defaults to 0
    #[schema(value_type = Option<String>)]
    pub scrap_pct: Option<Decimal>,
    #[serde(default)]
    pub is_optional: bool,
    pub alt_group: Option<String>,
    pub color_match_rule: Option<String>,
    pub size_rule: Option<String>,
    pub notes: Option<String>,
}

impl BomLineRequest {
    fn into_input(self, idx: usize) -> Result<CreateBomLineInput, ServiceError> {
        Ok(CreateBomLineInput {
            component_item_id: require(
                self.component_item_id,
                &format!("line {}: component_item_id", idx),
            )?,
            qty_per: require(self.qty_per, &format!("line {}: qty_per", idx))?,
            uom_id: self.uom_id,
            scrap_pct: self.scrap_pct.unwrap_or(Decimal::ZERO),
            is_optional: self.is_optional,
            alt_group: self.alt_group,
            color_match_rule: self.color_match_rule,
            size_rule: self.size_rule,
            notes: self.notes,
        })
    }
}

// Handler functions

#[utoipa::path(
    post,
    path = "/boms",
    request_body = CreateBomRequest,
    responses(
        (status = 201, description = "BOM created with all of its lines", body = CreatedId),
        (status = 400, description = "Invalid BOM or line; nothing persisted", body = ErrorResponse)
    ),
    tag = "boms"
)]
pub async fn create_bom(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateBomRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let lines = payload
        .lines
        .into_iter()
        .enumerate()
        .map(|(idx, line)| line.into_input(idx))
        .collect::<Result<Vec<_>, _>>()?;

    let input = CreateBomInput {
        product_item_id: require(payload.product_item_id, "product_item_id")?,
        version: payload.version.unwrap_or(1),
        effective_from: payload.effective_from,
        effective_to: payload.effective_to,
        notes: payload.notes,
        lines,
    };

    let id = state.services.bom.create_bom(input).await?;
    Ok(created_response(CreatedId { id }))
}

#[utoipa::path(
    get,
    path = "/boms/{id}",
    params(
        ("id" = i32, Path, description = "BOM ID")
    ),
    responses(
        (status = 200, description = "BOM with lines in creation order", body = BomDetail),
        (status = 404, description = "BOM not found", body = ErrorResponse)
    ),
    tag = "boms"
)]
pub async fn get_bom(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let bom = state.services.bom.get_bom(id).await?;
    Ok(success_response(bom))
}

#[utoipa::path(
    get,
    path = "/boms",
    responses(
        (status = 200, description = "BOMs listed without lines", body = [BomSummary])
    ),
    tag = "boms"
)]
pub async fn list_boms(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let boms = state.services.bom.list_boms().await?;
    Ok(success_response(boms))
}
