//! Satorial API library
//!
//! Inventory and procurement records: an item catalog, versioned bills of
//! materials, suppliers and purchase orders, served over HTTP.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod telemetry;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone());
        Self {
            db,
            config,
            services,
        }
    }
}

/// Routes for the catalog, BOM, procurement and warehouse stores plus the health check.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(handlers::catalog::catalog_routes())
        .merge(handlers::bom::bom_routes())
        .merge(handlers::procurement::procurement_routes())
        .merge(handlers::warehouses::warehouse_routes())
        .route("/health", get(handlers::health::health_check))
}

/// Full application router with request ids, HTTP tracing and the API docs.
pub fn app_router(state: AppState) -> Router {
    api_routes()
        .with_state(state)
        .merge(openapi::swagger_ui())
        .layer(telemetry::configure_http_tracing())
        .layer(axum::middleware::from_fn(telemetry::request_id_middleware))
}
