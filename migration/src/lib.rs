pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_profiles_table;
mod m20250301_000002_create_main_wallets_table;
mod m20250301_000003_create_sub_wallets_tables;
mod m20250301_000004_create_circles_tables;
mod m20250301_000005_create_transactions_table;
mod m20250301_000006_create_webhook_events_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_profiles_table::Migration),
            Box::new(m20250301_000002_create_main_wallets_table::Migration),
            Box::new(m20250301_000003_create_sub_wallets_tables::Migration),
            Box::new(m20250301_000004_create_circles_tables::Migration),
            Box::new(m20250301_000005_create_transactions_table::Migration),
            Box::new(m20250301_000006_create_webhook_events_table::Migration)
        ]
    }
}
