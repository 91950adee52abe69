use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_feedback_venue_status_created
             ON feedback (venue_id, status, created_at DESC)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_submissions_status_created
             ON submissions (status, created_at DESC)",
        )
        .await?;

        db.execute_unprepared("CREATE INDEX IF NOT EXISTS idx_venues_suburb ON venues (suburb)")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP INDEX IF EXISTS idx_feedback_venue_status_created")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_submissions_status_created")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_venues_suburb")
            .await?;

        Ok(())
    }
}
