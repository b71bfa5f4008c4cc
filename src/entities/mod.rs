// Catalog
pub mod item;
pub mod item_category;
pub mod uom;

// Bills of materials
pub mod bom;
pub mod bom_line;

// Procurement
pub mod po_line;
pub mod purchase_order;
pub mod supplier;
pub mod supplier_item;

// Stock locations
pub mod location;
pub mod warehouse;
