use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(WebhookEvents::Table)
                .if_not_exists()
                .col(ColumnDef::new(WebhookEvents::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(WebhookEvents::Provider).string_len(20).not_null())
                .col(ColumnDef::new(WebhookEvents::EventReference).string().not_null())
                .col(ColumnDef::new(WebhookEvents::AccountNumber).string_len(20).not_null())
                .col(ColumnDef::new(WebhookEvents::Amount).big_integer().not_null())
                .col(ColumnDef::new(WebhookEvents::Payload).text().not_null())
                .col(ColumnDef::new(WebhookEvents::TransactionId).uuid().null())
                .col(
                    ColumnDef::new(WebhookEvents::ReceivedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                )
                .to_owned()
        ).await?;

        // Inbound events are applied at most once per provider reference
        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_webhook_events_provider_reference")
                .table(WebhookEvents::Table)
                .col(WebhookEvents::Provider)
                .col(WebhookEvents::EventReference)
                .unique()
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(WebhookEvents::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum WebhookEvents {
    Table,
    Id,
    Provider,
    EventReference,
    AccountNumber,
    Amount,
    Payload,
    TransactionId,
    ReceivedAt,
}
