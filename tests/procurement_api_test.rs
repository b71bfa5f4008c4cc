mod common;

use axum::http::StatusCode;
use common::{response_json, TestApp};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal serialized as string")).unwrap()
}

#[tokio::test]
async fn purchase_order_total_tracks_its_lines() {
    let app = TestApp::new().await;
    app.seed_catalog().await;
    let item = app.seed_item("FAB-1", "Oxford Cloth").await;
    let supplier = app.seed_supplier("Acme Mills").await;

    let po = app
        .create(
            "/pos",
            json!({ "supplier_id": supplier, "po_number": "PO-1001", "currency": "USD" }),
        )
        .await;

    let pos = response_json(app.get("/pos").await).await;
    assert_eq!(pos.as_array().unwrap().len(), 1);
    assert_eq!(pos[0]["id"], po);
    assert_eq!(decimal(&pos[0]["total"]), Decimal::ZERO);

    let first = app
        .post(
            &format!("/pos/{}/lines", po),
            json!({ "item_id": item, "qty": "2", "price": "5" }),
        )
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = response_json(first).await;
    assert!(first["id"].as_i64().is_some());
    assert_eq!(decimal(&first["po_total"]), Decimal::from(10));

    let second = app
        .post(
            &format!("/pos/{}/lines", po),
            json!({ "item_id": item, "qty": "4", "price": "3", "shade_request": "navy" }),
        )
        .await;
    assert_eq!(second.status(), StatusCode::CREATED);
    let second = response_json(second).await;
    assert_eq!(decimal(&second["po_total"]), Decimal::from(22));

    let detail = response_json(app.get(&format!("/pos/{}", po)).await).await;
    assert_eq!(decimal(&detail["total"]), Decimal::from(22));
    assert_eq!(detail["po_number"], "PO-1001");
    let lines = detail["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(decimal(&lines[0]["qty"]), Decimal::from(2));
    assert_eq!(lines[1]["shade_request"], "navy");

    let pos = response_json(app.get("/pos").await).await;
    assert_eq!(decimal(&pos[0]["total"]), Decimal::from(22));
}

#[tokio::test]
async fn fractional_amounts_are_summed_exactly() {
    let app = TestApp::new().await;
    app.seed_catalog().await;
    let item = app.seed_item("FAB-1", "Oxford Cloth").await;
    let supplier = app.seed_supplier("Acme Mills").await;
    let po = app.create("/pos", json!({ "supplier_id": supplier })).await;

    for _ in 0..3 {
        app.create(
            &format!("/pos/{}/lines", po),
            json!({ "item_id": item, "qty": "0.5", "price": "0.25" }),
        )
        .await;
    }

    let detail = response_json(app.get(&format!("/pos/{}", po)).await).await;
    assert_eq!(decimal(&detail["total"]), Decimal::new(375, 3));
}

#[tokio::test]
async fn stored_total_matches_the_returned_total() {
    let app = TestApp::new().await;
    app.seed_catalog().await;
    let item = app.seed_item("FAB-1", "Oxford Cloth").await;
    let supplier = app.seed_supplier("Acme Mills").await;
    let po = app.create("/pos", json!({ "supplier_id": supplier })).await;

    let response = app
        .post(
            &format!("/pos/{}/lines", po),
            json!({ "item_id": item, "qty": "0.3333", "price": "0.3333" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let added = response_json(response).await;
    assert_eq!(decimal(&added["po_total"]), Decimal::new(11108889, 8));

    let detail = response_json(app.get(&format!("/pos/{}", po)).await).await;
    assert_eq!(decimal(&detail["total"]), decimal(&added["po_total"]));
    assert_eq!(decimal(&detail["lines"][0]["qty"]), Decimal::new(3333, 4));
}

#[tokio::test]
async fn over_precise_amounts_are_rejected() {
    let app = TestApp::new().await;
    app.seed_catalog().await;
    let item = app.seed_item("FAB-1", "Oxford Cloth").await;
    let supplier = app.seed_supplier("Acme Mills").await;
    let po = app.create("/pos", json!({ "supplier_id": supplier })).await;
    let lines_uri = format!("/pos/{}/lines", po);

    let too_many_places = app
        .post(&lines_uri, json!({ "item_id": item, "qty": "0.00001", "price": "1" }))
        .await;
    assert_eq!(too_many_places.status(), StatusCode::BAD_REQUEST);

    let too_many_digits = app
        .post(
            &lines_uri,
            json!({ "item_id": item, "qty": "1", "price": "123456789012.3456" }),
        )
        .await;
    assert_eq!(too_many_digits.status(), StatusCode::BAD_REQUEST);
    let error = response_json(too_many_digits).await;
    assert_eq!(error["error"], "Bad Request");

    let supplier_price = app
        .post(
            "/supplier_items",
            json!({ "supplier_id": supplier, "item_id": item, "price": "1.23456" }),
        )
        .await;
    assert_eq!(supplier_price.status(), StatusCode::BAD_REQUEST);

    let detail = response_json(app.get(&format!("/pos/{}", po)).await).await;
    assert_eq!(decimal(&detail["total"]), Decimal::ZERO);
    assert!(detail["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn supplier_requires_a_name() {
    let app = TestApp::new().await;

    let blank = app.post("/suppliers", json!({ "name": "" })).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let missing = app.post("/suppliers", json!({ "country": "PT" })).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let suppliers = response_json(app.get("/suppliers").await).await;
    assert!(suppliers.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn suppliers_list_in_creation_order() {
    let app = TestApp::new().await;

    let a = app
        .create(
            "/suppliers",
            json!({ "name": "Acme Mills", "country": "PT", "lead_time_days": 30, "currency": "EUR" }),
        )
        .await;
    let b = app.seed_supplier("Acme Mills").await;

    let suppliers = response_json(app.get("/suppliers").await).await;
    let suppliers = suppliers.as_array().unwrap();
    assert_eq!(suppliers.len(), 2);
    assert_eq!(suppliers[0]["id"], a);
    assert_eq!(suppliers[0]["lead_time_days"], 30);
    assert_eq!(suppliers[0]["currency"], "EUR");
    assert_eq!(suppliers[1]["id"], b);
    assert!(suppliers[1]["country"].is_null());
}

#[tokio::test]
async fn supplier_items_validate_their_references() {
    let app = TestApp::new().await;
    app.seed_catalog().await;
    let item = app.seed_item("FAB-1", "Oxford Cloth").await;
    let supplier = app.seed_supplier("Acme Mills").await;

    let missing_ids = app
        .post("/supplier_items", json!({ "vendor_sku": "V-1" }))
        .await;
    assert_eq!(missing_ids.status(), StatusCode::BAD_REQUEST);

    let unknown_supplier = app
        .post("/supplier_items", json!({ "supplier_id": 999, "item_id": item }))
        .await;
    assert_eq!(unknown_supplier.status(), StatusCode::BAD_REQUEST);

    let unknown_item = app
        .post("/supplier_items", json!({ "supplier_id": supplier, "item_id": 999 }))
        .await;
    assert_eq!(unknown_item.status(), StatusCode::BAD_REQUEST);

    let priced = app
        .create(
            "/supplier_items",
            json!({
                "supplier_id": supplier,
                "item_id": item,
                "vendor_sku": "AC-OX-01",
                "price": "4.75",
                "moq": "100",
                "incoterms": "FOB"
            }),
        )
        .await;
    let bare = app
        .create(
            "/supplier_items",
            json!({ "supplier_id": supplier, "item_id": item }),
        )
        .await;

    let listed = response_json(app.get("/supplier_items").await).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], priced);
    assert_eq!(decimal(&listed[0]["price"]), Decimal::new(475, 2));
    assert_eq!(decimal(&listed[0]["moq"]), Decimal::from(100));
    assert_eq!(listed[1]["id"], bare);
    assert!(listed[1]["price"].is_null());
    assert!(listed[1]["moq"].is_null());
}

#[tokio::test]
async fn purchase_order_requires_a_known_supplier() {
    let app = TestApp::new().await;

    let unknown = app.post("/pos", json!({ "supplier_id": 404 })).await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

    let missing = app.post("/pos", json!({ "po_number": "PO-1" })).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let pos = response_json(app.get("/pos").await).await;
    assert!(pos.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_lines_leave_the_total_untouched() {
    let app = TestApp::new().await;
    app.seed_catalog().await;
    let item = app.seed_item("FAB-1", "Oxford Cloth").await;
    let supplier = app.seed_supplier("Acme Mills").await;
    let po = app.create("/pos", json!({ "supplier_id": supplier })).await;
    let lines_uri = format!("/pos/{}/lines", po);

    app.create(&lines_uri, json!({ "item_id": item, "qty": "1", "price": "7" }))
        .await;

    let unknown_po = app
        .post("/pos/9999/lines", json!({ "item_id": item, "qty": "1", "price": "1" }))
        .await;
    assert_eq!(unknown_po.status(), StatusCode::NOT_FOUND);

    let unknown_item = app
        .post(&lines_uri, json!({ "item_id": 9999, "qty": "1", "price": "1" }))
        .await;
    assert_eq!(unknown_item.status(), StatusCode::BAD_REQUEST);

    let zero_qty = app
        .post(&lines_uri, json!({ "item_id": item, "qty": "0", "price": "1" }))
        .await;
    assert_eq!(zero_qty.status(), StatusCode::BAD_REQUEST);

    let negative_price = app
        .post(&lines_uri, json!({ "item_id": item, "qty": "1", "price": "-1" }))
        .await;
    assert_eq!(negative_price.status(), StatusCode::BAD_REQUEST);

    let missing_price = app
        .post(&lines_uri, json!({ "item_id": item, "qty": "1" }))
        .await;
    assert_eq!(missing_price.status(), StatusCode::BAD_REQUEST);

    let detail = response_json(app.get(&format!("/pos/{}", po)).await).await;
    assert_eq!(decimal(&detail["total"]), Decimal::from(7));
    assert_eq!(detail["lines"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_purchase_order_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/pos/31").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
