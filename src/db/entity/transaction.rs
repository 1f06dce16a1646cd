use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

/// Append-only ledger row. Balances are only changed in the same database
/// transaction that inserts one of these.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub mode: String,
    #[sea_orm(unique)]
    pub reference: String,
    pub transaction_type: String,
    pub activity_type: String,
    pub source_kind: String,
    pub source_id: Option<Uuid>,
    pub destination_kind: String,
    pub destination_id: Option<Uuid>,
    pub sender: String,
    pub receiver: String,
    pub amount: i64,
    pub description: String,
    pub status: String,
    pub circle_id: Option<Uuid>,
    #[sea_orm(unique)]
    pub idempotency_key: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
