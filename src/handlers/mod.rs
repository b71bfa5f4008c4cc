pub mod bom;
pub mod catalog;
pub mod common;
pub mod health;
pub mod procurement;
pub mod warehouses;

use crate::db::DbPool;
use crate::services::{
    bom::BomService, catalog::CatalogService, procurement::ProcurementService,
    warehouses::WarehouseService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub bom: Arc<BomService>,
    pub procurement: Arc<ProcurementService>,
    pub warehouses: Arc<WarehouseService>,
}

impl AppServices {
    /// Builds every store over the same connection pool.
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            bom: Arc::new(BomService::new(db_pool.clone())),
            procurement: Arc::new(ProcurementService::new(db_pool.clone())),
            warehouses: Arc::new(WarehouseService::new(db_pool)),
        }
    }
}
