use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Satorial API",
        version = "0.1.0",
        description = r#"
# Satorial inventory and procurement API

Record keeping for an item catalog, versioned bills of materials, suppliers and purchase orders.

## Decimals

Quantities, prices, scrap percentages and totals are exact decimals. They are rendered as
strings (`"10.5"`) and accepted as either JSON numbers or strings.

## Errors

Every failure uses the same body:

```json
{
  "error": "Bad Request",
  "message": "Validation error: qty must be greater than 0",
  "request_id": "6d0f...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "catalog", description = "Items, categories and units of measure"),
        (name = "boms", description = "Bills of materials"),
        (name = "procurement", description = "Suppliers, supplier items and purchase orders"),
        (name = "warehouses", description = "Warehouses and storage locations"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        // Catalog
        crate::handlers::catalog::list_items,
        crate::handlers::catalog::get_item,
        crate::handlers::catalog::create_item,
        crate::handlers::catalog::list_categories,
        crate::handlers::catalog::create_category,
        crate::handlers::catalog::list_uoms,
        crate::handlers::catalog::create_uom,

        // BOMs
        crate::handlers::bom::create_bom,
        crate::handlers::bom::get_bom,
        crate::handlers::bom::list_boms,

        // Procurement
        crate::handlers::procurement::create_supplier,
        crate::handlers::procurement::list_suppliers,
        crate::handlers::procurement::create_supplier_item,
        crate::handlers::procurement::list_supplier_items,
        crate::handlers::procurement::create_purchase_order,
        crate::handlers::procurement::list_purchase_orders,
        crate::handlers::procurement::get_purchase_order,
        crate::handlers::procurement::add_po_line,

        // Warehouses
        crate::handlers::warehouses::create_warehouse,
        crate::handlers::warehouses::list_warehouses,
        crate::handlers::warehouses::create_location,
        crate::handlers::warehouses::list_locations,

        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::handlers::common::CreatedId,

            // Catalog types
            crate::handlers::catalog::CreateItemRequest,
            crate::handlers::catalog::CreateCodeRequest,
            crate::services::catalog::ItemView,
            crate::services::catalog::CodeView,

            // BOM types
            crate::handlers::bom::CreateBomRequest,
            crate::handlers::bom::BomLineRequest,
            crate::services::bom::BomSummary,
            crate::services::bom::BomDetail,
            crate::services::bom::BomLineView,

            // Procurement types
            crate::handlers::procurement::CreateSupplierRequest,
            crate::handlers::procurement::CreateSupplierItemRequest,
            crate::handlers::procurement::CreatePurchaseOrderRequest,
            crate::handlers::procurement::AddPoLineRequest,
            crate::services::procurement::SupplierView,
            crate::services::procurement::SupplierItemView,
            crate::services::procurement::PurchaseOrderView,
            crate::services::procurement::PurchaseOrderDetail,
            crate::services::procurement::PoLineView,
            crate::services::procurement::PoLineAdded,

            // Warehouse types
            crate::handlers::warehouses::CreateWarehouseRequest,
            crate::handlers::warehouses::CreateLocationRequest,
            crate::services::warehouses::WarehouseView,
            crate::services::warehouses::LocationView,

            crate::handlers::health::HealthResponse,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        for path in [
            "/items",
            "/items/{id}",
            "/categories",
            "/uoms",
            "/boms",
            "/boms/{id}",
            "/suppliers",
            "/supplier_items",
            "/pos",
            "/pos/{id}",
            "/pos/{id}/lines",
            "/warehouses",
            "/locations",
            "/health",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
    }
}
