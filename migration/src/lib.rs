pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260310_000001_initial_tables;
mod m20260415_000001_conversion_workflow;
mod m20260601_000001_reporting_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260310_000001_initial_tables::Migration),
            Box::new(m20260415_000001_conversion_workflow::Migration),
            Box::new(m20260601_000001_reporting_indexes::Migration),
        ]
    }
}
