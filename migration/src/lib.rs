pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_title;
mod m20250301_000002_create_auth;
mod m20250301_000003_create_journal;
mod m20250302_000001_create_lists;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_title::Migration),
            Box::new(m20250301_000002_create_auth::Migration),
            Box::new(m20250301_000003_create_journal::Migration),
            Box::new(m20250302_000001_create_lists::Migration),
        ]
    }
}
