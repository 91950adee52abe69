use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Submissions {
    Table,
    Id,
    Name,
    Suburb,
    Region,
    Address,
    Latitude,
    Longitude,
    CourtType,
    Surface,
    CourtCount,
    Features,
    Notes,
    SubmittedBy,
    Status,
    RejectionReason,
    VenueId,
    ReviewedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Venues {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Submissions::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Submissions::Suburb).string_len(100).not_null())
                    .col(ColumnDef::new(Submissions::Region).string_len(100).not_null())
                    .col(ColumnDef::new(Submissions::Address).string_len(300).null())
                    .col(ColumnDef::new(Submissions::Latitude).double().null())
                    .col(ColumnDef::new(Submissions::Longitude).double().null())
                    .col(
                        ColumnDef::new(Submissions::CourtType)
                            .string_len(20)
                            .not_null()
                            .default("outdoor"),
                    )
                    .col(ColumnDef::new(Submissions::Surface).string_len(50).null())
                    .col(ColumnDef::new(Submissions::CourtCount).integer().null())
                    .col(
                        ColumnDef::new(Submissions::Features)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Submissions::Notes).text().null())
                    .col(ColumnDef::new(Submissions::SubmittedBy).uuid().null())
                    .col(
                        ColumnDef::new(Submissions::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Submissions::RejectionReason).text().null())
                    .col(ColumnDef::new(Submissions::VenueId).integer().null())
                    .col(ColumnDef::new(Submissions::ReviewedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Submissions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_venue_id")
                            .from(Submissions::Table, Submissions::VenueId)
                            .to(Venues::Table, Venues::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await
    }
}
