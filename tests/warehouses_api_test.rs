mod common;

use axum::http::StatusCode;
use common::{response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn warehouses_are_created_and_listed() {
    let app = TestApp::new().await;

    let main = app
        .create("/warehouses", json!({ "code": "MAIN", "name": "Main Warehouse" }))
        .await;
    let annex = app
        .create("/warehouses", json!({ "code": " ANNEX ", "name": "Annex" }))
        .await;

    let listed = response_json(app.get("/warehouses").await).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], main);
    assert_eq!(listed[0]["code"], "MAIN");
    assert_eq!(listed[0]["name"], "Main Warehouse");
    assert_eq!(listed[1]["id"], annex);
    assert_eq!(listed[1]["code"], "ANNEX");
}

#[tokio::test]
async fn warehouse_codes_are_unique_and_fields_required() {
    let app = TestApp::new().await;
    app.create("/warehouses", json!({ "code": "MAIN", "name": "Main" }))
        .await;

    let duplicate = app
        .post("/warehouses", json!({ "code": "MAIN", "name": "Other" }))
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let missing_name = app.post("/warehouses", json!({ "code": "EAST" })).await;
    assert_eq!(missing_name.status(), StatusCode::BAD_REQUEST);
    let error = response_json(missing_name).await;
    assert_eq!(error["error"], "Bad Request");

    let blank_code = app
        .post("/warehouses", json!({ "code": "  ", "name": "East" }))
        .await;
    assert_eq!(blank_code.status(), StatusCode::BAD_REQUEST);

    let listed = response_json(app.get("/warehouses").await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn location_codes_are_unique_within_a_warehouse() {
    let app = TestApp::new().await;
    let main = app
        .create("/warehouses", json!({ "code": "MAIN", "name": "Main" }))
        .await;
    let annex = app
        .create("/warehouses", json!({ "code": "ANNEX", "name": "Annex" }))
        .await;

    let bin = app
        .create(
            "/locations",
            json!({ "warehouse_id": main, "code": "A-01", "type": "bin" }),
        )
        .await;

    let duplicate = app
        .post("/locations", json!({ "warehouse_id": main, "code": "A-01" }))
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let other = app
        .create("/locations", json!({ "warehouse_id": annex, "code": "A-01" }))
        .await;

    let all = response_json(app.get("/locations").await).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["id"], bin);
    assert_eq!(all[0]["warehouse_id"], main);
    assert_eq!(all[0]["type"], "bin");
    assert_eq!(all[1]["id"], other);
    assert!(all[1]["type"].is_null());

    let annex_only =
        response_json(app.get(&format!("/locations?warehouse_id={}", annex)).await).await;
    let annex_only = annex_only.as_array().unwrap();
    assert_eq!(annex_only.len(), 1);
    assert_eq!(annex_only[0]["id"], other);
}

#[tokio::test]
async fn location_requires_a_known_warehouse() {
    let app = TestApp::new().await;

    let unknown = app
        .post("/locations", json!({ "warehouse_id": 404, "code": "A-01" }))
        .await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

    let missing = app.post("/locations", json!({ "code": "A-01" })).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let locations = response_json(app.get("/locations").await).await;
    assert!(locations.as_array().unwrap().is_empty());
}
