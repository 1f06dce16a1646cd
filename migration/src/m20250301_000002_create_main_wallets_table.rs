use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(MainWallets::Table)
                .if_not_exists()
                .col(ColumnDef::new(MainWallets::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(MainWallets::UserId).uuid().not_null())
                .col(ColumnDef::new(MainWallets::Mode).string_len(10).not_null())
                .col(ColumnDef::new(MainWallets::Balance).big_integer().not_null().default(0))
                .col(ColumnDef::new(MainWallets::Currency).string_len(3).not_null())
                .col(ColumnDef::new(MainWallets::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(MainWallets::UpdatedAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_main_wallets_profile")
                        .from(MainWallets::Table, MainWallets::UserId)
                        .to(Profiles::Table, Profiles::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        // One main wallet per user and mode
        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_main_wallets_user_mode")
                .table(MainWallets::Table)
                .col(MainWallets::UserId)
                .col(MainWallets::Mode)
                .unique()
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MainWallets::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum MainWallets {
    Table,
    Id,
    UserId,
    Mode,
    Balance,
    Currency,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
}
