use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Profiles::Table)
                .if_not_exists()
                .col(ColumnDef::new(Profiles::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Profiles::Email).string().null())
                .col(ColumnDef::new(Profiles::FullName).string().null())
                .col(ColumnDef::new(Profiles::Phone).string_len(32).null())
                .col(
                    ColumnDef::new(Profiles::AccountMode)
                        .string_len(10)
                        .not_null()
                        .default("demo")
                )
                .col(
                    ColumnDef::new(Profiles::KycStatus)
                        .string_len(20)
                        .not_null()
                        .default("unverified")
                )
                .col(ColumnDef::new(Profiles::EncryptedBvn).text().null())
                .col(ColumnDef::new(Profiles::DateOfBirth).date().null())
                .col(ColumnDef::new(Profiles::VfdAccountNumber).string_len(20).null().unique_key())
                .col(ColumnDef::new(Profiles::VfdAccountName).string().null())
                .col(ColumnDef::new(Profiles::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Profiles::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(UserSettings::Table)
                .if_not_exists()
                .col(ColumnDef::new(UserSettings::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(UserSettings::UserId).uuid().not_null().unique_key())
                .col(
                    ColumnDef::new(UserSettings::EmailNotifications)
                        .boolean()
                        .not_null()
                        .default(true)
                )
                .col(
                    ColumnDef::new(UserSettings::PushNotifications)
                        .boolean()
                        .not_null()
                        .default(true)
                )
                .col(
                    ColumnDef::new(UserSettings::SmsNotifications)
                        .boolean()
                        .not_null()
                        .default(false)
                )
                .col(
                    ColumnDef::new(UserSettings::TransactionAlerts)
                        .boolean()
                        .not_null()
                        .default(true)
                )
                .col(ColumnDef::new(UserSettings::HideBalance).boolean().not_null().default(false))
                .col(ColumnDef::new(UserSettings::Discoverable).boolean().not_null().default(true))
                .col(ColumnDef::new(UserSettings::PinHash).string().null())
                .col(ColumnDef::new(UserSettings::PinEnabled).boolean().not_null().default(false))
                .col(ColumnDef::new(UserSettings::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(UserSettings::UpdatedAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_user_settings_profile")
                        .from(UserSettings::Table, UserSettings::UserId)
                        .to(Profiles::Table, Profiles::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(UserSettings::Table).to_owned()).await?;

        manager.drop_table(Table::drop().table(Profiles::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    Email,
    FullName,
    Phone,
    AccountMode,
    KycStatus,
    EncryptedBvn,
    DateOfBirth,
    VfdAccountNumber,
    VfdAccountName,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserSettings {
    Table,
    Id,
    UserId,
    EmailNotifications,
    PushNotifications,
    SmsNotifications,
    TransactionAlerts,
    HideBalance,
    Discoverable,
    PinHash,
    PinEnabled,
    CreatedAt,
    UpdatedAt,
}
