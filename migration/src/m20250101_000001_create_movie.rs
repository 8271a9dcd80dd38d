use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // AUTOINCREMENT on SQLite keeps deleted ids from being handed out again.
        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(string_len(Movie::Title, 255))
                    .col(text_null(Movie::Description))
                    .col(integer_null(Movie::ReleaseYear))
                    .col(integer_null(Movie::RatingTenths))
                    .col(string_len_null(Movie::ImageUrl, 255))
                    .col(big_integer(Movie::CreatedAt))
                    .col(big_integer(Movie::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    Title,
    Description,
    ReleaseYear,
    RatingTenths,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}
