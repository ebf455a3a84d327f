pub use sea_orm_migration::prelude::*;

mod m20260801_000001_create_products_table;
mod m20260801_000002_create_product_types_table;
mod m20260801_000003_create_spareparts_table;
mod m20260801_000004_create_vendors_table;
mod m20260801_000005_create_contact_persons_table;
mod m20260801_000006_create_sparepart_purchases_table;
mod m20260801_000007_create_sparepart_purchase_items_table;
mod m20260801_000008_create_inventory_units_table;
mod m20260801_000009_create_technicians_table;
mod m20260801_000010_create_testings_table;
mod m20260801_000011_create_customers_table;
mod m20260801_000012_create_sales_table;
mod m20260801_000013_create_sale_items_table;
mod m20260801_000014_create_service_orders_table;
mod m20260801_000015_create_service_order_items_table;
mod m20260801_000016_create_service_part_usages_table;
mod m20260801_000017_create_service_deliveries_table;
mod m20260801_000018_create_service_delivery_items_table;
mod m20260802_000019_add_lookup_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_products_table::Migration),
            Box::new(m20260801_000002_create_product_types_table::Migration),
            Box::new(m20260801_000003_create_spareparts_table::Migration),
            Box::new(m20260801_000004_create_vendors_table::Migration),
            Box::new(m20260801_000005_create_contact_persons_table::Migration),
            Box::new(m20260801_000006_create_sparepart_purchases_table::Migration),
            Box::new(m20260801_000007_create_sparepart_purchase_items_table::Migration),
            Box::new(m20260801_000008_create_inventory_units_table::Migration),
            Box::new(m20260801_000009_create_technicians_table::Migration),
            Box::new(m20260801_000010_create_testings_table::Migration),
            Box::new(m20260801_000011_create_customers_table::Migration),
            Box::new(m20260801_000012_create_sales_table::Migration),
            Box::new(m20260801_000013_create_sale_items_table::Migration),
            Box::new(m20260801_000014_create_service_orders_table::Migration),
            Box::new(m20260801_000015_create_service_order_items_table::Migration),
            Box::new(m20260801_000016_create_service_part_usages_table::Migration),
            Box::new(m20260801_000017_create_service_deliveries_table::Migration),
            Box::new(m20260801_000018_create_service_delivery_items_table::Migration),
            Box::new(m20260802_000019_add_lookup_indexes::Migration),
        ]
    }
}
