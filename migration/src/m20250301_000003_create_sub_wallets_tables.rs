use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(BudgetWallets::Table)
                .if_not_exists()
                .col(ColumnDef::new(BudgetWallets::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(BudgetWallets::UserId).uuid().not_null())
                .col(ColumnDef::new(BudgetWallets::Mode).string_len(10).not_null())
                .col(ColumnDef::new(BudgetWallets::Name).string_len(60).not_null())
                .col(ColumnDef::new(BudgetWallets::Category).string_len(40).null())
                .col(ColumnDef::new(BudgetWallets::SpendLimit).big_integer().null())
                .col(ColumnDef::new(BudgetWallets::Balance).big_integer().not_null().default(0))
                .col(ColumnDef::new(BudgetWallets::IsLocked).boolean().not_null().default(false))
                .col(ColumnDef::new(BudgetWallets::LockUntil).timestamp_with_time_zone().null())
                .col(
                    ColumnDef::new(BudgetWallets::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                )
                .col(
                    ColumnDef::new(BudgetWallets::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_budget_wallets_profile")
                        .from(BudgetWallets::Table, BudgetWallets::UserId)
                        .to(Profiles::Table, Profiles::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_budget_wallets_user_mode")
                .table(BudgetWallets::Table)
                .col(BudgetWallets::UserId)
                .col(BudgetWallets::Mode)
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(GoalWallets::Table)
                .if_not_exists()
                .col(ColumnDef::new(GoalWallets::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(GoalWallets::UserId).uuid().not_null())
                .col(ColumnDef::new(GoalWallets::Mode).string_len(10).not_null())
                .col(ColumnDef::new(GoalWallets::Name).string_len(60).not_null())
                .col(ColumnDef::new(GoalWallets::TargetAmount).big_integer().not_null())
                .col(ColumnDef::new(GoalWallets::TargetDate).date().null())
                .col(ColumnDef::new(GoalWallets::Balance).big_integer().not_null().default(0))
                .col(ColumnDef::new(GoalWallets::IsLocked).boolean().not_null().default(false))
                .col(ColumnDef::new(GoalWallets::LockUntil).timestamp_with_time_zone().null())
                .col(ColumnDef::new(GoalWallets::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(GoalWallets::UpdatedAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_goal_wallets_profile")
                        .from(GoalWallets::Table, GoalWallets::UserId)
                        .to(Profiles::Table, Profiles::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_goal_wallets_user_mode")
                .table(GoalWallets::Table)
                .col(GoalWallets::UserId)
                .col(GoalWallets::Mode)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(GoalWallets::Table).to_owned()).await?;

        manager.drop_table(Table::drop().table(BudgetWallets::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum BudgetWallets {
    Table,
    Id,
    UserId,
    Mode,
    Name,
    Category,
    SpendLimit,
    Balance,
    IsLocked,
    LockUntil,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum GoalWallets {
    Table,
    Id,
    UserId,
    Mode,
    Name,
    TargetAmount,
    TargetDate,
    Balance,
    IsLocked,
    LockUntil,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
}
