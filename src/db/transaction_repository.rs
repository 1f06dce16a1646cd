use chrono::{ DateTime, Utc };
use sea_orm::{
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::db::entity::{ transaction, Transaction };
use crate::enums::{ AccountMode, ActivityType };
use crate::error::{ AppError, Result };

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 200;

#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub activity: Option<ActivityType>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl TransactionFilter {
    fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

/// Read side of the transaction log. Rows are only ever written by the ledger.
#[derive(Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_user(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        filter: TransactionFilter
    ) -> Result<Vec<transaction::Model>> {
        let mut query = Transaction::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .filter(transaction::Column::Mode.eq(mode.as_str()));

        if let Some(activity) = filter.activity {
            query = query.filter(transaction::Column::ActivityType.eq(activity.as_str()));
        }

        let transactions = query
            .order_by_desc(transaction::Column::CreatedAt)
            .order_by_desc(transaction::Column::Id)
            .limit(filter.limit())
            .offset(filter.offset.unwrap_or(0))
            .all(&self.db).await?;

        Ok(transactions)
    }

    pub async fn find_by_circle(
        &self,
        circle_id: Uuid,
        filter: TransactionFilter
    ) -> Result<Vec<transaction::Model>> {
        let transactions = Transaction::find()
            .filter(transaction::Column::CircleId.eq(circle_id))
            .order_by_desc(transaction::Column::CreatedAt)
            .order_by_desc(transaction::Column::Id)
            .limit(filter.limit())
            .offset(filter.offset.unwrap_or(0))
            .all(&self.db).await?;

        Ok(transactions)
    }

    pub async fn find_by_reference(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        reference: &str
    ) -> Result<transaction::Model> {
        Transaction::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .filter(transaction::Column::Mode.eq(mode.as_str()))
            .filter(transaction::Column::Reference.eq(reference))
            .one(&self.db).await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))
    }

    /// Everything the user posted in `mode` since `since`, oldest first.
    pub async fn find_since(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        since: DateTime<Utc>
    ) -> Result<Vec<transaction::Model>> {
        let transactions = Transaction::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .filter(transaction::Column::Mode.eq(mode.as_str()))
            .filter(transaction::Column::CreatedAt.gte(since))
            .order_by_asc(transaction::Column::CreatedAt)
            .all(&self.db).await?;

        Ok(transactions)
    }
}
