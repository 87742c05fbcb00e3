pub use sea_orm_migration::prelude::*;

mod m20260801_100000_create_user_table;
mod m20260801_100001_create_provider_identity_table;
mod m20260801_100002_create_secret_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_100000_create_user_table::Migration),
            Box::new(m20260801_100001_create_provider_identity_table::Migration),
            Box::new(m20260801_100002_create_secret_table::Migration),
        ]
    }
}
