use chrono::{ NaiveDate, Utc };
use sea_orm::{
    entity::prelude::*,
    ConnectOptions,
    Database,
    DatabaseConnection,
    QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::enums::AccountMode;
use crate::error::{ AppError, Result };

pub mod entity;
pub use entity::*;

mod transaction_repository;
pub use transaction_repository::{ TransactionFilter, TransactionRepository };

/// Open the pool used by the whole service.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_string());
    options.max_connections(20).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await?;
    Ok(db)
}

/// Fields of a new budget wallet.
#[derive(Debug, Clone)]
pub struct NewBudget {
    pub name: String,
    pub category: Option<String>,
    pub spend_limit: Option<i64>,
}

/// Fields of a new goal wallet.
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: i64,
    pub target_date: Option<NaiveDate>,
}

/// Budget and goal wallets. The main wallet is owned by the ledger.
#[derive(Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_budget(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        input: NewBudget
    ) -> Result<budget_wallet::Model> {
        let now = Utc::now();
        let wallet = budget_wallet::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            mode: Set(mode.to_string()),
            name: Set(input.name),
            category: Set(input.category),
            spend_limit: Set(input.spend_limit),
            balance: Set(0),
            is_locked: Set(false),
            lock_until: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let wallet = wallet.insert(&self.db).await?;
        Ok(wallet)
    }

    pub async fn create_goal(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        input: NewGoal
    ) -> Result<goal_wallet::Model> {
        let now = Utc::now();
        let wallet = goal_wallet::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            mode: Set(mode.to_string()),
            name: Set(input.name),
            target_amount: Set(input.target_amount),
            target_date: Set(input.target_date),
            balance: Set(0),
            is_locked: Set(false),
            lock_until: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let wallet = wallet.insert(&self.db).await?;
        Ok(wallet)
    }

    pub async fn find_budget(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        id: Uuid
    ) -> Result<budget_wallet::Model> {
        crate::ledger::find_budget(&self.db, user_id, mode, id).await
    }

    pub async fn find_goal(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        id: Uuid
    ) -> Result<goal_wallet::Model> {
        crate::ledger::find_goal(&self.db, user_id, mode, id).await
    }

    pub async fn find_budgets(
        &self,
        user_id: Uuid,
        mode: AccountMode
    ) -> Result<Vec<budget_wallet::Model>> {
        let wallets = BudgetWallet::find()
            .filter(budget_wallet::Column::UserId.eq(user_id))
            .filter(budget_wallet::Column::Mode.eq(mode.as_str()))
            .order_by_asc(budget_wallet::Column::CreatedAt)
            .all(&self.db).await?;

        Ok(wallets)
    }

    pub async fn find_goals(
        &self,
        user_id: Uuid,
        mode: AccountMode
    ) -> Result<Vec<goal_wallet::Model>> {
        let wallets = GoalWallet::find()
            .filter(goal_wallet::Column::UserId.eq(user_id))
            .filter(goal_wallet::Column::Mode.eq(mode.as_str()))
            .order_by_asc(goal_wallet::Column::CreatedAt)
            .all(&self.db).await?;

        Ok(wallets)
    }

    pub async fn update_budget(
        &self,
        wallet: budget_wallet::ActiveModel
    ) -> Result<budget_wallet::Model> {
        wallet.update(&self.db).await.map_err(|e| {
            match e {
                DbErr::RecordNotUpdated => AppError::NotFound("Budget wallet not found".to_string()),
                e => AppError::Database(e),
            }
        })
    }

    pub async fn update_goal(&self, wallet: goal_wallet::ActiveModel) -> Result<goal_wallet::Model> {
        wallet.update(&self.db).await.map_err(|e| {
            match e {
                DbErr::RecordNotUpdated => AppError::NotFound("Goal wallet not found".to_string()),
                e => AppError::Database(e),
            }
        })
    }
}
