// Catalog store: items, categories, units of measure
pub mod catalog;

// BOM engine
pub mod bom;

// Procurement ledger: suppliers, supplier items, purchase orders
pub mod procurement;

// Stock locations: warehouses and their storage locations
pub mod warehouses;

// Bounds shared by every decimal the stores persist
pub mod decimals;
