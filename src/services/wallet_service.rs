use std::sync::Arc;

use chrono::{ DateTime, NaiveDate, Utc };
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    TransactionTrait,
};
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use crate::db::entity::{
    budget_wallet,
    goal_wallet,
    main_wallet,
    transaction,
    BudgetWallet,
    GoalWallet,
};
use crate::db::{ NewBudget, NewGoal, WalletRepository };
use crate::enums::{ AccountMode, ActivityType };
use crate::error::{ AppError, Result };
use crate::ledger::{ self, lock, reference, LedgerAccount, LockState, Posting, PostingReceipt };
use crate::money;
use crate::services::ProfileService;

const MAX_NAME_LEN: usize = 60;

/// Budget or goal wallet: the deletable, lockable sub-wallets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubWalletKind {
    Budget,
    Goal,
}

impl SubWalletKind {
    fn label(&self) -> &'static str {
        match self {
            SubWalletKind::Budget => "budget",
            SubWalletKind::Goal => "goal",
        }
    }

    fn account(&self, id: Uuid) -> LedgerAccount {
        match self {
            SubWalletKind::Budget => LedgerAccount::Budget { id },
            SubWalletKind::Goal => LedgerAccount::Goal { id },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBudgetRequest {
    pub name: String,
    pub category: Option<String>,
    pub spend_limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBudgetRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub spend_limit: Option<i64>,
    #[serde(default)]
    pub clear_spend_limit: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGoalRequest {
    pub name: String,
    pub target_amount: i64,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGoalRequest {
    pub name: Option<String>,
    pub target_amount: Option<i64>,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetView {
    #[serde(flatten)]
    pub wallet: budget_wallet::Model,
    pub lock: LockState,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub wallet: goal_wallet::Model,
    pub lock: LockState,
    /// Whole percent of the target reached, capped at 100.
    pub progress: u8,
}

impl From<budget_wallet::Model> for BudgetView {
    fn from(wallet: budget_wallet::Model) -> Self {
        let lock = LockState::evaluate(wallet.is_locked, wallet.lock_until, Utc::now());
        Self { wallet, lock }
    }
}

impl From<goal_wallet::Model> for GoalView {
    fn from(wallet: goal_wallet::Model) -> Self {
        let lock = LockState::evaluate(wallet.is_locked, wallet.lock_until, Utc::now());
        let progress = if wallet.target_amount > 0 {
            ((wallet.balance.max(0) as i128) * 100 / (wallet.target_amount as i128)).min(100) as u8
        } else {
            0
        };
        Self { wallet, lock, progress }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletOverview {
    pub mode: AccountMode,
    pub main: main_wallet::Model,
    pub budgets: Vec<BudgetView>,
    pub goals: Vec<GoalView>,
    pub total_balance: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletClosure {
    pub wallet_id: Uuid,
    pub kind: SubWalletKind,
    pub swept_amount: i64,
    pub transaction: Option<transaction::Model>,
}

pub struct WalletService {
    db: DatabaseConnection,
    repository: Arc<WalletRepository>,
    profiles: Arc<ProfileService>,
    currency: String,
}

impl WalletService {
    pub fn new(
        db: DatabaseConnection,
        repository: Arc<WalletRepository>,
        profiles: Arc<ProfileService>,
        currency: String
    ) -> Self {
        Self {
            db,
            repository,
            profiles,
            currency,
        }
    }

    pub async fn main_wallet(&self, user_id: Uuid, mode: AccountMode) -> Result<main_wallet::Model> {
        ledger::main_wallet(&self.db, user_id, mode, &self.currency).await
    }

    pub async fn overview(&self, user_id: Uuid, mode: AccountMode) -> Result<WalletOverview> {
        let main = self.main_wallet(user_id, mode).await?;
        let budgets = self.list_budgets(user_id, mode).await?;
        let goals = self.list_goals(user_id, mode).await?;

        let total_balance = money::checked_sum(
            std::iter
                ::once(main.balance)
                .chain(budgets.iter().map(|b| b.wallet.balance))
                .chain(goals.iter().map(|g| g.wallet.balance))
        )?;

        Ok(WalletOverview {
            mode,
            main,
            budgets,
            goals,
            total_balance,
        })
    }

    pub async fn list_budgets(&self, user_id: Uuid, mode: AccountMode) -> Result<Vec<BudgetView>> {
        let wallets = self.repository.find_budgets(user_id, mode).await?;
        Ok(wallets.into_iter().map(BudgetView::from).collect())
    }

    pub async fn list_goals(&self, user_id: Uuid, mode: AccountMode) -> Result<Vec<GoalView>> {
        let wallets = self.repository.find_goals(user_id, mode).await?;
        Ok(wallets.into_iter().map(GoalView::from).collect())
    }

    pub async fn create_budget(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        request: CreateBudgetRequest
    ) -> Result<BudgetView> {
        let name = validate_name(&request.name)?;
        if let Some(limit) = request.spend_limit {
            money::ensure_positive(limit)?;
        }

        let wallet = self.repository.create_budget(user_id, mode, NewBudget {
            name,
            category: normalize_optional(request.category),
            spend_limit: request.spend_limit,
        }).await?;

        tracing::info!("Created budget wallet {} for user {} ({})", wallet.id, user_id, mode);
        Ok(wallet.into())
    }

    pub async fn update_budget(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        id: Uuid,
        request: UpdateBudgetRequest
    ) -> Result<BudgetView> {
        let wallet = self.repository.find_budget(user_id, mode, id).await?;
        let balance = wallet.balance;
        let mut active: budget_wallet::ActiveModel = wallet.into();

        if let Some(name) = request.name {
            active.name = ActiveValue::Set(validate_name(&name)?);
        }
        if request.category.is_some() {
            active.category = ActiveValue::Set(normalize_optional(request.category));
        }
        if request.clear_spend_limit {
            active.spend_limit = ActiveValue::Set(None);
        } else if let Some(limit) = request.spend_limit {
            money::ensure_positive(limit)?;
            if limit < balance {
                return Err(
                    AppError::InvalidInput(
                        format!(
                            "Spend limit {} is below the current balance {}",
                            money::format_naira(limit),
                            money::format_naira(balance)
                        )
                    )
                );
            }
            active.spend_limit = ActiveValue::Set(Some(limit));
        }
        active.updated_at = ActiveValue::Set(Utc::now());

        let wallet = self.repository.update_budget(active).await?;
        Ok(wallet.into())
    }

    pub async fn create_goal(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        request: CreateGoalRequest
    ) -> Result<GoalView> {
        let name = validate_name(&request.name)?;
        money::ensure_positive(request.target_amount)?;
        validate_target_date(request.target_date)?;

        let wallet = self.repository.create_goal(user_id, mode, NewGoal {
            name,
            target_amount: request.target_amount,
            target_date: request.target_date,
        }).await?;

        tracing::info!("Created goal wallet {} for user {} ({})", wallet.id, user_id, mode);
        Ok(wallet.into())
    }

    pub async fn update_goal(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        id: Uuid,
        request: UpdateGoalRequest
    ) -> Result<GoalView> {
        let wallet = self.repository.find_goal(user_id, mode, id).await?;
        let mut active: goal_wallet::ActiveModel = wallet.into();

        if let Some(name) = request.name {
            active.name = ActiveValue::Set(validate_name(&name)?);
        }
        if let Some(target_amount) = request.target_amount {
            active.target_amount = ActiveValue::Set(money::ensure_positive(target_amount)?);
        }
        if request.target_date.is_some() {
            validate_target_date(request.target_date)?;
            active.target_date = ActiveValue::Set(request.target_date);
        }
        active.updated_at = ActiveValue::Set(Utc::now());

        let wallet = self.repository.update_goal(active).await?;
        Ok(wallet.into())
    }

    /// Lock a budget or goal wallet against debits for `days` days.
    pub async fn lock_wallet(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        kind: SubWalletKind,
        id: Uuid,
        days: i64
    ) -> Result<LockState> {
        let now = Utc::now();
        let state = self.lock_state(user_id, mode, kind, id, now).await?;

        if let LockState::LockedUntil { until } = state {
            return Err(
                AppError::Conflict(format!("Wallet is already locked until {}", until.to_rfc3339()))
            );
        }

        let until = lock::lock_expiry(now, days)?;
        self.write_lock(kind, id, Some(until)).await?;

        tracing::info!("Locked {} wallet {} until {}", kind.label(), id, until);
        Ok(LockState::LockedUntil { until })
    }

    /// Clear an expired lock. An active lock cannot be lifted early.
    pub async fn unlock_wallet(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        kind: SubWalletKind,
        id: Uuid
    ) -> Result<LockState> {
        let state = self.lock_state(user_id, mode, kind, id, Utc::now()).await?;
        state.ensure_unlocked()?;

        self.write_lock(kind, id, None).await?;
        Ok(LockState::Unlocked)
    }

    /// Sweep the wallet's balance back to the main wallet and delete it, as one
    /// database transaction.
    pub async fn delete_wallet(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        kind: SubWalletKind,
        id: Uuid
    ) -> Result<WalletClosure> {
        let txn = self.db.begin().await?;

        let (name, balance) = match kind {
            SubWalletKind::Budget => {
                let wallet = ledger::find_budget(&txn, user_id, mode, id).await?;
                (wallet.name, wallet.balance)
            }
            SubWalletKind::Goal => {
                let wallet = ledger::find_goal(&txn, user_id, mode, id).await?;
                (wallet.name, wallet.balance)
            }
        };

        let mut receipt: Option<PostingReceipt> = None;
        if balance > 0 {
            let posting = Posting::new(
                user_id,
                mode,
                kind.account(id),
                LedgerAccount::Main,
                balance,
                ActivityType::WalletClosure
            )
                .describe(
                    format!(
                        "Closed {} {}; {} returned to main wallet",
                        kind.label(),
                        name,
                        money::format_naira(balance)
                    )
                )
                .reference(reference::deletion(Utc::now()));

            receipt = Some(ledger::post(&txn, posting, &self.currency).await?);
        }

        match kind {
            SubWalletKind::Budget => {
                BudgetWallet::delete_by_id(id).exec(&txn).await?;
            }
            SubWalletKind::Goal => {
                GoalWallet::delete_by_id(id).exec(&txn).await?;
            }
        }

        txn.commit().await?;
        tracing::info!(
            "Deleted {} wallet {} for user {}, swept {}",
            kind.label(),
            id,
            user_id,
            money::format_naira(balance.max(0))
        );

        Ok(WalletClosure {
            wallet_id: id,
            kind,
            swept_amount: balance.max(0),
            transaction: receipt.map(|r| r.transaction),
        })
    }

    /// Simulated funding of the demo main wallet. Live funds only arrive through
    /// the bank.
    pub async fn top_up(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        amount: i64,
        idempotency_key: Option<String>
    ) -> Result<PostingReceipt> {
        if mode != AccountMode::Demo {
            return Err(
                AppError::Forbidden(
                    "Top-up is only available in demo mode; fund live wallets by bank transfer".to_string()
                )
            );
        }

        let posting = Posting::new(
            user_id,
            mode,
            LedgerAccount::External,
            LedgerAccount::Main,
            amount,
            ActivityType::TopUp
        )
            .counterparty("Demo funding")
            .describe(format!("Top-up of {}", money::format_naira(amount)))
            .idempotency_key(idempotency_key);

        self.commit_posting(posting).await
    }

    pub async fn withdraw(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        amount: i64,
        pin: Option<&str>,
        idempotency_key: Option<String>
    ) -> Result<PostingReceipt> {
        self.profiles.verify_pin(user_id, pin).await?;

        let posting = Posting::new(
            user_id,
            mode,
            LedgerAccount::Main,
            LedgerAccount::External,
            amount,
            ActivityType::Withdrawal
        )
            .counterparty("Bank withdrawal")
            .describe(format!("Withdrawal of {}", money::format_naira(amount)))
            .idempotency_key(idempotency_key);

        self.commit_posting(posting).await
    }

    async fn commit_posting(&self, posting: Posting) -> Result<PostingReceipt> {
        let txn = self.db.begin().await?;
        let receipt = ledger::post(&txn, posting, &self.currency).await?;
        txn.commit().await?;
        Ok(receipt)
    }

    async fn lock_state(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        kind: SubWalletKind,
        id: Uuid,
        now: DateTime<Utc>
    ) -> Result<LockState> {
        let (is_locked, lock_until) = match kind {
            SubWalletKind::Budget => {
                let wallet = self.repository.find_budget(user_id, mode, id).await?;
                (wallet.is_locked, wallet.lock_until)
            }
            SubWalletKind::Goal => {
                let wallet = self.repository.find_goal(user_id, mode, id).await?;
                (wallet.is_locked, wallet.lock_until)
            }
        };

        Ok(LockState::evaluate(is_locked, lock_until, now))
    }

    async fn write_lock(
        &self,
        kind: SubWalletKind,
        id: Uuid,
        until: Option<DateTime<Utc>>
    ) -> Result<()> {
        let now = Utc::now();
        match kind {
            SubWalletKind::Budget => {
                BudgetWallet::update_many()
                    .col_expr(budget_wallet::Column::IsLocked, Expr::value(until.is_some()))
                    .col_expr(budget_wallet::Column::LockUntil, Expr::value(until))
                    .col_expr(budget_wallet::Column::UpdatedAt, Expr::value(now))
                    .filter(budget_wallet::Column::Id.eq(id))
                    .exec(&self.db).await?;
            }
            SubWalletKind::Goal => {
                GoalWallet::update_many()
                    .col_expr(goal_wallet::Column::IsLocked, Expr::value(until.is_some()))
                    .col_expr(goal_wallet::Column::LockUntil, Expr::value(until))
                    .col_expr(goal_wallet::Column::UpdatedAt, Expr::value(now))
                    .filter(goal_wallet::Column::Id.eq(id))
                    .exec(&self.db).await?;
            }
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(
            AppError::InvalidInput(format!("Wallet name must be 1 to {} characters", MAX_NAME_LEN))
        );
    }
    Ok(name.to_string())
}

fn validate_target_date(date: Option<NaiveDate>) -> Result<()> {
    match date {
        Some(date) if date < Utc::now().date_naive() => {
            Err(AppError::InvalidInput("Target date cannot be in the past".to_string()))
        }
        _ => Ok(()),
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entity::Transaction;
    use crate::test_utils;
    use chrono::Duration;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_create_and_list_budgets_by_mode() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;

        ctx.wallets
            .create_budget(user, AccountMode::Demo, CreateBudgetRequest {
                name: "Groceries".to_string(),
                category: Some("food".to_string()),
                spend_limit: None,
            }).await
            .unwrap();
        ctx.wallets
            .create_budget(user, AccountMode::Live, CreateBudgetRequest {
                name: "Rent".to_string(),
                category: None,
                spend_limit: None,
            }).await
            .unwrap();

        let demo = ctx.wallets.list_budgets(user, AccountMode::Demo).await.unwrap();
        let live = ctx.wallets.list_budgets(user, AccountMode::Live).await.unwrap();

        assert_eq!(demo.len(), 1);
        assert_eq!(demo[0].wallet.name, "Groceries");
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].wallet.name, "Rent");
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;

        let err = ctx.wallets
            .create_goal(user, AccountMode::Demo, CreateGoalRequest {
                name: "   ".to_string(),
                target_amount: 100,
                target_date: None,
            }).await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_top_up_only_in_demo() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;

        let receipt = ctx.wallets.top_up(user, AccountMode::Demo, 500_000, None).await.unwrap();
        assert_eq!(receipt.transaction.activity_type, "top_up");
        assert!(receipt.transaction.reference.starts_with("TOP-"));

        let err = ctx.wallets.top_up(user, AccountMode::Live, 500_000, None).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let live = ctx.wallets.main_wallet(user, AccountMode::Live).await.unwrap();
        assert_eq!(live.balance, 0);
    }

    #[tokio::test]
    async fn test_top_up_is_idempotent() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;
        let key = Some("topup-1".to_string());

        let first = ctx.wallets.top_up(user, AccountMode::Demo, 100_000, key.clone()).await.unwrap();
        let second = ctx.wallets.top_up(user, AccountMode::Demo, 100_000, key).await.unwrap();

        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(first.transaction.id, second.transaction.id);
        assert_eq!(ctx.wallets.main_wallet(user, AccountMode::Demo).await.unwrap().balance, 100_000);
    }

    #[tokio::test]
    async fn test_withdraw_requires_pin_when_enabled() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;
        ctx.wallets.top_up(user, AccountMode::Demo, 100_000, None).await.unwrap();
        ctx.profiles.set_pin(user, "2468", None).await.unwrap();

        let err = ctx.wallets.withdraw(user, AccountMode::Demo, 10_000, None, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPin));

        let receipt = ctx.wallets
            .withdraw(user, AccountMode::Demo, 10_000, Some("2468"), None).await
            .unwrap();
        assert_eq!(receipt.transaction.transaction_type, "withdrawal");
        assert_eq!(ctx.wallets.main_wallet(user, AccountMode::Demo).await.unwrap().balance, 90_000);
    }

    #[tokio::test]
    async fn test_withdraw_more_than_balance_rejected() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;
        ctx.wallets.top_up(user, AccountMode::Demo, 5_000, None).await.unwrap();

        let err = ctx.wallets.withdraw(user, AccountMode::Demo, 5_001, None, None).await.unwrap_err();

        assert!(matches!(err, AppError::InsufficientBalance));
        assert_eq!(ctx.wallets.main_wallet(user, AccountMode::Demo).await.unwrap().balance, 5_000);
        assert_eq!(Transaction::find().count(&ctx.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_sweeps_balance_to_main() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;
        ctx.wallets.top_up(user, AccountMode::Demo, 1_000_000, None).await.unwrap();
        let budget = ctx.budget(user, AccountMode::Demo, "Groceries").await;
        ctx.fund(user, AccountMode::Demo, LedgerAccount::Budget { id: budget }, 400_000).await;

        let closure = ctx.wallets
            .delete_wallet(user, AccountMode::Demo, SubWalletKind::Budget, budget).await
            .unwrap();

        assert_eq!(closure.swept_amount, 400_000);
        let tx = closure.transaction.unwrap();
        assert_eq!(tx.activity_type, "wallet_closure");
        assert!(tx.reference.starts_with("DEL"));
        assert!(tx.description.contains("Groceries"));
        assert_eq!(ctx.wallets.main_wallet(user, AccountMode::Demo).await.unwrap().balance, 1_000_000);
        assert!(ctx.wallets.list_budgets(user, AccountMode::Demo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_empty_wallet_posts_nothing() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;
        let goal = ctx.goal(user, AccountMode::Demo, "Laptop").await;

        let closure = ctx.wallets
            .delete_wallet(user, AccountMode::Demo, SubWalletKind::Goal, goal).await
            .unwrap();

        assert_eq!(closure.swept_amount, 0);
        assert!(closure.transaction.is_none());
        assert_eq!(Transaction::find().count(&ctx.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_locked_wallet_rejects_unlock_debit_and_delete() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;
        ctx.wallets.top_up(user, AccountMode::Demo, 100_000, None).await.unwrap();
        let goal = ctx.goal(user, AccountMode::Demo, "Laptop").await;
        ctx.fund(user, AccountMode::Demo, LedgerAccount::Goal { id: goal }, 50_000).await;

        let state = ctx.wallets
            .lock_wallet(user, AccountMode::Demo, SubWalletKind::Goal, goal, 30).await
            .unwrap();
        assert!(state.is_locked());

        let err = ctx.wallets
            .unlock_wallet(user, AccountMode::Demo, SubWalletKind::Goal, goal).await
            .unwrap_err();
        assert!(matches!(err, AppError::WalletLocked { .. }));

        let err = ctx.wallets
            .delete_wallet(user, AccountMode::Demo, SubWalletKind::Goal, goal).await
            .unwrap_err();
        assert!(matches!(err, AppError::WalletLocked { .. }));

        let goals = ctx.wallets.list_goals(user, AccountMode::Demo).await.unwrap();
        assert_eq!(goals[0].wallet.balance, 50_000);
    }

    #[tokio::test]
    async fn test_expired_lock_can_be_cleared() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;
        let budget = ctx.budget(user, AccountMode::Demo, "Fuel").await;

        ctx.wallets
            .write_lock(SubWalletKind::Budget, budget, Some(Utc::now() - Duration::hours(1))).await
            .unwrap();

        let state = ctx.wallets
            .unlock_wallet(user, AccountMode::Demo, SubWalletKind::Budget, budget).await
            .unwrap();
        assert_eq!(state, LockState::Unlocked);

        let budgets = ctx.wallets.list_budgets(user, AccountMode::Demo).await.unwrap();
        assert!(!budgets[0].wallet.is_locked);
    }

    #[tokio::test]
    async fn test_spend_limit_cannot_drop_below_balance() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;
        ctx.wallets.top_up(user, AccountMode::Demo, 100_000, None).await.unwrap();
        let budget = ctx.budget(user, AccountMode::Demo, "Data").await;
        ctx.fund(user, AccountMode::Demo, LedgerAccount::Budget { id: budget }, 20_000).await;

        let err = ctx.wallets
            .update_budget(user, AccountMode::Demo, budget, UpdateBudgetRequest {
                spend_limit: Some(10_000),
                ..Default::default()
            }).await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
