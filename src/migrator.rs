use anyhow::Result;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::{error, info};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_catalog_tables::Migration),
            Box::new(m20240301_000002_create_bom_tables::Migration),
            Box::new(m20240301_000003_create_procurement_tables::Migration),
            Box::new(m20240315_000004_create_stock_location_tables::Migration),
        ]
    }
}

// Identifiers shared by the migrations that reference catalog tables.
#[derive(DeriveIden)]
enum Items {
    Table,
    Id,
    Sku,
    Name,
    CategoryId,
    BaseUomId,
    Brand,
    Active,
    Spec,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ItemCategories {
    Table,
    Id,
    Code,
}

#[derive(DeriveIden)]
enum Uoms {
    Table,
    Id,
    Code,
}

mod m20240301_000001_create_catalog_tables {
    use super::{ItemCategories, Items, Uoms};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ItemCategories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemCategories::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ItemCategories::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Uoms::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Uoms::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Uoms::Code).string().not_null().unique_key())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Items::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Items::Sku).string().not_null().unique_key())
                        .col(ColumnDef::new(Items::Name).string().not_null())
                        .col(ColumnDef::new(Items::CategoryId).integer().null())
                        .col(ColumnDef::new(Items::BaseUomId).integer().null())
                        .col(ColumnDef::new(Items::Brand).string().null())
                        .col(
                            ColumnDef::new(Items::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Items::Spec).text().not_null().default("{}"))
                        .col(
                            ColumnDef::new(Items::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_category_id")
                                .from(Items::Table, Items::CategoryId)
                                .to(ItemCategories::Table, ItemCategories::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_base_uom_id")
                                .from(Items::Table, Items::BaseUomId)
                                .to(Uoms::Table, Uoms::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_items_category_id")
                        .table(Items::Table)
                        .col(Items::CategoryId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Uoms::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ItemCategories::Table).to_owned())
                .await
        }
    }
}

mod m20240301_000002_create_bom_tables {
    use super::{Items, Uoms};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_bom_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Boms::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Boms::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Boms::ProductItemId).integer().not_null())
                        .col(ColumnDef::new(Boms::Version).integer().not_null().default(1))
                        .col(ColumnDef::new(Boms::EffectiveFrom).date().null())
                        .col(ColumnDef::new(Boms::EffectiveTo).date().null())
                        .col(ColumnDef::new(Boms::Notes).text().null())
                        .col(
                            ColumnDef::new(Boms::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_boms_product_item_id")
                                .from(Boms::Table, Boms::ProductItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BomLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BomLines::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(BomLines::BomId).integer().not_null())
                        .col(ColumnDef::new(BomLines::ComponentItemId).integer().not_null())
                        .col(ColumnDef::new(BomLines::QtyPer).decimal().not_null())
                        .col(ColumnDef::new(BomLines::UomId).integer().null())
                        .col(
                            ColumnDef::new(BomLines::ScrapPct)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BomLines::IsOptional)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(BomLines::AltGroup).string().null())
                        .col(ColumnDef::new(BomLines::ColorMatchRule).string().null())
                        .col(ColumnDef::new(BomLines::SizeRule).string().null())
                        .col(ColumnDef::new(BomLines::Notes).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bom_lines_bom_id")
                                .from(BomLines::Table, BomLines::BomId)
                                .to(Boms::Table, Boms::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bom_lines_component_item_id")
                                .from(BomLines::Table, BomLines::ComponentItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bom_lines_uom_id")
                                .from(BomLines::Table, BomLines::UomId)
                                .to(Uoms::Table, Uoms::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_bom_lines_bom_id")
                        .table(BomLines::Table)
                        .col(BomLines::BomId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BomLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Boms::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Boms {
        Table,
        Id,
        ProductItemId,
        Version,
        EffectiveFrom,
        EffectiveTo,
        Notes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum BomLines {
        Table,
        Id,
        BomId,
        ComponentItemId,
        QtyPer,
        UomId,
        ScrapPct,
        IsOptional,
        AltGroup,
        ColorMatchRule,
        SizeRule,
        Notes,
    }
}

mod m20240301_000003_create_procurement_tables {
    use super::{Items, Uoms};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_procurement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::Country).string().null())
                        .col(ColumnDef::new(Suppliers::PaymentTerms).string().null())
                        .col(ColumnDef::new(Suppliers::LeadTimeDays).integer().null())
                        .col(ColumnDef::new(Suppliers::Currency).string().null())
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(SupplierItems::SupplierId).integer().not_null())
                        .col(ColumnDef::new(SupplierItems::ItemId).integer().not_null())
                        .col(ColumnDef::new(SupplierItems::VendorSku).string().null())
                        .col(ColumnDef::new(SupplierItems::Price).decimal().null())
                        .col(ColumnDef::new(SupplierItems::Moq).decimal().null())
                        .col(ColumnDef::new(SupplierItems::Incoterms).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_items_supplier_id")
                                .from(SupplierItems::Table, SupplierItems::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_items_item_id")
                                .from(SupplierItems::Table, SupplierItems::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::SupplierId).integer().not_null())
                        .col(ColumnDef::new(PurchaseOrders::PoNumber).string().null())
                        .col(ColumnDef::new(PurchaseOrders::Status).string().null())
                        .col(ColumnDef::new(PurchaseOrders::Eta).date().null())
                        .col(ColumnDef::new(PurchaseOrders::Currency).string().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::Total)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_supplier_id")
                                .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PoLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PoLines::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PoLines::PoId).integer().not_null())
                        .col(ColumnDef::new(PoLines::ItemId).integer().not_null())
                        .col(ColumnDef::new(PoLines::Qty).decimal().not_null())
                        .col(ColumnDef::new(PoLines::UomId).integer().null())
                        .col(ColumnDef::new(PoLines::Price).decimal().not_null())
                        .col(ColumnDef::new(PoLines::LotRequest).string().null())
                        .col(ColumnDef::new(PoLines::ShadeRequest).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_po_lines_po_id")
                                .from(PoLines::Table, PoLines::PoId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_po_lines_item_id")
                                .from(PoLines::Table, PoLines::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_po_lines_uom_id")
                                .from(PoLines::Table, PoLines::UomId)
                                .to(Uoms::Table, Uoms::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_po_lines_po_id")
                        .table(PoLines::Table)
                        .col(PoLines::PoId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PoLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SupplierItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Suppliers {
        Table,
        Id,
        Name,
        Country,
        PaymentTerms,
        LeadTimeDays,
        Currency,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SupplierItems {
        Table,
        Id,
        SupplierId,
        ItemId,
        VendorSku,
        Price,
        Moq,
        Incoterms,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrders {
        Table,
        Id,
        SupplierId,
        PoNumber,
        Status,
        Eta,
        Currency,
        Total,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PoLines {
        Table,
        Id,
        PoId,
        ItemId,
        Qty,
        UomId,
        Price,
        LotRequest,
        ShadeRequest,
    }
}

mod m20240315_000004_create_stock_location_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240315_000004_create_stock_location_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Warehouses::Code).string().not_null().unique_key())
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Locations::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Locations::WarehouseId).integer().not_null())
                        .col(ColumnDef::new(Locations::Code).string().not_null())
                        .col(ColumnDef::new(Locations::Type).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_locations_warehouse_id")
                                .from(Locations::Table, Locations::WarehouseId)
                                .to(Warehouses::Table, Warehouses::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_locations_warehouse_code")
                        .table(Locations::Table)
                        .col(Locations::WarehouseId)
                        .col(Locations::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Warehouses {
        Table,
        Id,
        Code,
        Name,
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
        WarehouseId,
        Code,
        Type,
    }
}

// Database migration CLI runner
pub async fn run_migration(db_url: &str) -> Result<()> {
    info!("Setting up database connection for migrations");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(4)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;

    info!("Running database migrations");

    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
    use std::str::FromStr;

    const TABLES: [&str; 11] = [
        "item_categories",
        "uoms",
        "items",
        "boms",
        "bom_lines",
        "suppliers",
        "supplier_items",
        "purchase_orders",
        "po_lines",
        "warehouses",
        "locations",
    ];

    #[tokio::test]
    async fn migrations_apply_and_revert_on_sqlite() {
        let db = Database::connect("sqlite::memory:").await.unwrap();

        Migrator::up(&db, None).await.unwrap();
        let manager = SchemaManager::new(&db);
        for table in TABLES {
            assert!(manager.has_table(table).await.unwrap(), "{} missing", table);
        }

        Migrator::down(&db, None).await.unwrap();
        for table in TABLES {
            assert!(!manager.has_table(table).await.unwrap(), "{} left behind", table);
        }
    }

    #[tokio::test]
    async fn decimal_columns_keep_fifteen_significant_digits() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        db.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "INSERT INTO suppliers (name, created_at, updated_at) \
             VALUES ('Acme', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        ))
        .await
        .unwrap();
        db.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "INSERT INTO purchase_orders (supplier_id, total, created_at) \
             VALUES (1, '12345678901.2345', '2024-01-01T00:00:00Z')",
        ))
        .await
        .unwrap();

        let row = db
            .query_one(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT total FROM purchase_orders WHERE id = 1",
            ))
            .await
            .unwrap()
            .unwrap();
        let total: Decimal = row.try_get("", "total").unwrap();
        assert_eq!(total, Decimal::from_str("12345678901.2345").unwrap());
    }
}
