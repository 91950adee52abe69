use sea_orm_migration::prelude::*;

mod m20250301_000001_create_venues_table;
mod m20250301_000002_create_submissions_table;
mod m20250301_000003_create_feedback_table;
mod m20250301_000004_create_photos_table;
mod m20250301_000005_create_profiles_and_favorites;
mod m20250301_000006_add_lookup_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_venues_table::Migration),
            Box::new(m20250301_000002_create_submissions_table::Migration),
            Box::new(m20250301_000003_create_feedback_table::Migration),
            Box::new(m20250301_000004_create_photos_table::Migration),
            Box::new(m20250301_000005_create_profiles_and_favorites::Migration),
            Box::new(m20250301_000006_add_lookup_indexes::Migration),
        ]
    }
}
