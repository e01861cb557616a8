pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260810_000001_core_tables;
mod m20260810_000002_delivery_events;
mod m20260810_000003_ad_stats_daily;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260810_000001_core_tables::Migration),
            Box::new(m20260810_000002_delivery_events::Migration),
            Box::new(m20260810_000003_ad_stats_daily::Migration),
        ]
    }
}
