pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users_table;
mod m20250301_000002_create_addresses_table;
mod m20250301_000003_create_categories_table;
mod m20250301_000004_create_brands_table;
mod m20250301_000005_create_products_table;
mod m20250301_000006_create_product_images_table;
mod m20250301_000007_create_carts_table;
mod m20250301_000008_create_cart_items_table;
mod m20250301_000009_create_coupons_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_table::Migration),
            Box::new(m20250301_000002_create_addresses_table::Migration),
            Box::new(m20250301_000003_create_categories_table::Migration),
            Box::new(m20250301_000004_create_brands_table::Migration),
            Box::new(m20250301_000005_create_products_table::Migration),
            Box::new(m20250301_000006_create_product_images_table::Migration),
            Box::new(m20250301_000007_create_carts_table::Migration),
            Box::new(m20250301_000008_create_cart_items_table::Migration),
            Box::new(m20250301_000009_create_coupons_table::Migration),
        ]
    }
}
