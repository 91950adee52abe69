use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Venues {
    Table,
    Id,
    Slug,
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
    PlaceId,
    ExternalRating,
    ExternalRatingCount,
    Phone,
    Website,
    OpeningHours,
    PhotoRefs,
    EnrichedAt,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Venues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Venues::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Venues::Slug)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Venues::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Venues::Suburb).string_len(100).not_null())
                    .col(ColumnDef::new(Venues::Region).string_len(100).not_null())
                    .col(ColumnDef::new(Venues::Address).string_len(300).null())
                    .col(ColumnDef::new(Venues::Latitude).double().null())
                    .col(ColumnDef::new(Venues::Longitude).double().null())
                    .col(
                        ColumnDef::new(Venues::CourtType)
                            .string_len(20)
                            .not_null()
                            .default("outdoor"),
                    )
                    .col(ColumnDef::new(Venues::Surface).string_len(50).null())
                    .col(ColumnDef::new(Venues::CourtCount).integer().null())
                    .col(
                        ColumnDef::new(Venues::Features)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Venues::PlaceId).string_len(200).null())
                    .col(ColumnDef::new(Venues::ExternalRating).double().null())
                    .col(ColumnDef::new(Venues::ExternalRatingCount).integer().null())
                    .col(ColumnDef::new(Venues::Phone).string_len(50).null())
                    .col(ColumnDef::new(Venues::Website).string_len(500).null())
                    .col(ColumnDef::new(Venues::OpeningHours).json_binary().null())
                    .col(ColumnDef::new(Venues::PhotoRefs).json_binary().null())
                    .col(ColumnDef::new(Venues::EnrichedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Venues::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Venues::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Venues::Table).to_owned())
            .await
    }
}
