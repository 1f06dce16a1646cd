use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Transactions::Table)
                .if_not_exists()
                .col(ColumnDef::new(Transactions::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Transactions::UserId).uuid().not_null())
                .col(ColumnDef::new(Transactions::Mode).string_len(10).not_null())
                .col(ColumnDef::new(Transactions::Reference).string_len(40).not_null())
                .col(ColumnDef::new(Transactions::TransactionType).string_len(20).not_null())
                .col(ColumnDef::new(Transactions::ActivityType).string_len(30).not_null())
                .col(ColumnDef::new(Transactions::SourceKind).string_len(20).not_null())
                .col(ColumnDef::new(Transactions::SourceId).uuid().null())
                .col(ColumnDef::new(Transactions::DestinationKind).string_len(20).not_null())
                .col(ColumnDef::new(Transactions::DestinationId).uuid().null())
                .col(ColumnDef::new(Transactions::Sender).string().not_null())
                .col(ColumnDef::new(Transactions::Receiver).string().not_null())
                .col(ColumnDef::new(Transactions::Amount).big_integer().not_null())
                .col(ColumnDef::new(Transactions::Description).text().not_null())
                .col(ColumnDef::new(Transactions::Status).string_len(20).not_null())
                .col(ColumnDef::new(Transactions::CircleId).uuid().null())
                .col(ColumnDef::new(Transactions::IdempotencyKey).string_len(120).null())
                .col(
                    ColumnDef::new(Transactions::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_transactions_reference")
                .table(Transactions::Table)
                .col(Transactions::Reference)
                .unique()
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_transactions_idempotency_key")
                .table(Transactions::Table)
                .col(Transactions::IdempotencyKey)
                .unique()
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_transactions_user_mode_created")
                .table(Transactions::Table)
                .col(Transactions::UserId)
                .col(Transactions::Mode)
                .col(Transactions::CreatedAt)
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_transactions_circle")
                .table(Transactions::Table)
                .col(Transactions::CircleId)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Transactions::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    UserId,
    Mode,
    Reference,
    TransactionType,
    ActivityType,
    SourceKind,
    SourceId,
    DestinationKind,
    DestinationId,
    Sender,
    Receiver,
    Amount,
    Description,
    Status,
    CircleId,
    IdempotencyKey,
    CreatedAt,
}
