use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Circles::Table)
                .if_not_exists()
                .col(ColumnDef::new(Circles::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Circles::Name).string_len(80).not_null())
                .col(ColumnDef::new(Circles::Description).text().null())
                .col(ColumnDef::new(Circles::Category).string_len(40).not_null())
                .col(ColumnDef::new(Circles::Visibility).string_len(10).not_null())
                .col(ColumnDef::new(Circles::MaxMembers).integer().not_null())
                .col(ColumnDef::new(Circles::TargetAmount).big_integer().null())
                .col(ColumnDef::new(Circles::Balance).big_integer().not_null().default(0))
                .col(ColumnDef::new(Circles::Mode).string_len(10).not_null())
                .col(ColumnDef::new(Circles::InviteCode).string_len(16).not_null().unique_key())
                .col(ColumnDef::new(Circles::CreatedBy).uuid().not_null())
                .col(ColumnDef::new(Circles::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Circles::UpdatedAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_circles_creator")
                        .from(Circles::Table, Circles::CreatedBy)
                        .to(Profiles::Table, Profiles::Id)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_circles_mode_visibility")
                .table(Circles::Table)
                .col(Circles::Mode)
                .col(Circles::Visibility)
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(CircleMembers::Table)
                .if_not_exists()
                .col(ColumnDef::new(CircleMembers::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(CircleMembers::CircleId).uuid().not_null())
                .col(ColumnDef::new(CircleMembers::UserId).uuid().not_null())
                .col(ColumnDef::new(CircleMembers::Role).string_len(20).not_null())
                .col(
                    ColumnDef::new(CircleMembers::TotalContributed)
                        .big_integer()
                        .not_null()
                        .default(0)
                )
                .col(ColumnDef::new(CircleMembers::JoinedAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_circle_members_circle")
                        .from(CircleMembers::Table, CircleMembers::CircleId)
                        .to(Circles::Table, Circles::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_circle_members_profile")
                        .from(CircleMembers::Table, CircleMembers::UserId)
                        .to(Profiles::Table, Profiles::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_circle_members_circle_user")
                .table(CircleMembers::Table)
                .col(CircleMembers::CircleId)
                .col(CircleMembers::UserId)
                .unique()
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CircleMembers::Table).to_owned()).await?;

        manager.drop_table(Table::drop().table(Circles::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Circles {
    Table,
    Id,
    Name,
    Description,
    Category,
    Visibility,
    MaxMembers,
    TargetAmount,
    Balance,
    Mode,
    InviteCode,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CircleMembers {
    Table,
    Id,
    CircleId,
    UserId,
    Role,
    TotalContributed,
    JoinedAt,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
}
