//! The ledger owns every balance mutation.
//!
//! A posting debits one account, credits another and appends exactly one row
//! to the transaction log. All three writes go through the connection the
//! caller passes in, which is expected to be an open database transaction:
//! if any step fails the caller drops the transaction and nothing is applied.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{ Expr, OnConflict };
use sea_orm::{
    ActiveModelTrait,
    ColumnTrait,
    ConnectionTrait,
    EntityTrait,
    QueryFilter,
    Set,
    SqlErr,
};
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use crate::db::entity::{
    budget_wallet,
    circle,
    circle_member,
    goal_wallet,
    main_wallet,
    transaction,
    BudgetWallet,
    Circle,
    CircleMember,
    GoalWallet,
    MainWallet,
    Transaction,
};
use crate::enums::{ AccountMode, ActivityType, TransactionType, TxStatus };
use crate::error::{ AppError, Result };
use crate::money;

pub mod lock;
pub mod reference;

pub use lock::LockState;

/// One side of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LedgerAccount {
    /// Outside the ledger: bank deposits, top-ups, withdrawals.
    External,
    /// The user's main wallet in the posting's mode.
    Main,
    Budget {
        id: Uuid,
    },
    Goal {
        id: Uuid,
    },
    Circle {
        id: Uuid,
    },
}

impl LedgerAccount {
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerAccount::External => "external",
            LedgerAccount::Main => "main",
            LedgerAccount::Budget { .. } => "budget",
            LedgerAccount::Goal { .. } => "goal",
            LedgerAccount::Circle { .. } => "circle",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Posting {
    pub user_id: Uuid,
    pub mode: AccountMode,
    pub source: LedgerAccount,
    pub destination: LedgerAccount,
    /// Kobo.
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub activity: ActivityType,
    pub description: String,
    /// Display name of the external side, if any.
    pub counterparty: Option<String>,
    pub idempotency_key: Option<String>,
    /// Overrides the generated reference number.
    pub reference: Option<String>,
}

impl Posting {
    pub fn new(
        user_id: Uuid,
        mode: AccountMode,
        source: LedgerAccount,
        destination: LedgerAccount,
        amount: i64,
        activity: ActivityType
    ) -> Self {
        let transaction_type = match (source, destination) {
            (LedgerAccount::External, _) => TransactionType::Deposit,
            (_, LedgerAccount::External) => TransactionType::Withdrawal,
            _ => TransactionType::Transfer,
        };

        Self {
            user_id,
            mode,
            source,
            destination,
            amount,
            transaction_type,
            activity,
            description: String::new(),
            counterparty: None,
            idempotency_key: None,
            reference: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn counterparty(mut self, name: impl Into<String>) -> Self {
        self.counterparty = Some(name.into());
        self
    }

    pub fn idempotency_key(mut self, key: Option<String>) -> Self {
        self.idempotency_key = key;
        self
    }

    pub fn reference(mut self, reference: String) -> Self {
        self.reference = Some(reference);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostingReceipt {
    pub transaction: transaction::Model,
    /// True when the idempotency key matched an earlier posting and nothing
    /// was applied this time.
    pub replayed: bool,
}

/// A ledger account resolved against storage.
struct Resolved {
    account: LedgerAccount,
    id: Option<Uuid>,
    label: String,
    lock: LockState,
    spend_limit: Option<i64>,
    balance: i64,
}

/// Apply a posting. `conn` should be an open database transaction.
pub async fn post<C>(conn: &C, posting: Posting, currency: &str) -> Result<PostingReceipt>
    where C: ConnectionTrait
{
    money::ensure_positive(posting.amount)?;

    if posting.source == posting.destination {
        return Err(AppError::InvalidInput("Source and destination must differ".to_string()));
    }

    if let Some(key) = &posting.idempotency_key {
        if
            let Some(existing) = Transaction::find()
                .filter(transaction::Column::IdempotencyKey.eq(key.as_str()))
                .one(conn).await?
        {
            if existing.user_id != posting.user_id {
                return Err(AppError::Conflict("Idempotency key already used".to_string()));
            }
            return Ok(PostingReceipt { transaction: existing, replayed: true });
        }
    }

    let source = resolve(conn, &posting, posting.source, currency).await?;
    let destination = resolve(conn, &posting, posting.destination, currency).await?;

    debit(conn, &source, posting.amount).await?;
    credit(conn, &destination, posting.amount).await?;

    let now = Utc::now();
    let circle_id = match (posting.source, posting.destination) {
        (LedgerAccount::Circle { id }, _) | (_, LedgerAccount::Circle { id }) => Some(id),
        _ => None,
    };
    let reference = posting.reference
        .clone()
        .unwrap_or_else(|| reference::generate(posting.activity, now));
    let description = if posting.description.trim().is_empty() {
        format!("{} from {} to {}", money::format_naira(posting.amount), source.label, destination.label)
    } else {
        posting.description.clone()
    };

    let row = transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(posting.user_id),
        mode: Set(posting.mode.to_string()),
        reference: Set(reference),
        transaction_type: Set(posting.transaction_type.to_string()),
        activity_type: Set(posting.activity.to_string()),
        source_kind: Set(source.account.kind().to_string()),
        source_id: Set(source.id),
        destination_kind: Set(destination.account.kind().to_string()),
        destination_id: Set(destination.id),
        sender: Set(source.label.clone()),
        receiver: Set(destination.label.clone()),
        amount: Set(posting.amount),
        description: Set(description),
        status: Set(TxStatus::Completed.to_string()),
        circle_id: Set(circle_id),
        idempotency_key: Set(posting.idempotency_key.clone()),
        created_at: Set(now),
    };

    let row = row.insert(conn).await.map_err(|e| {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) =>
                AppError::Conflict("Duplicate transaction reference or idempotency key".to_string()),
            _ => AppError::Database(e),
        }
    })?;

    tracing::info!(
        "Posted {} {} from {} to {} for user {} ({})",
        row.reference,
        money::format_naira(row.amount),
        row.sender,
        row.receiver,
        row.user_id,
        row.mode
    );

    Ok(PostingReceipt { transaction: row, replayed: false })
}

/// Fetch the user's main wallet for `mode`, creating it on first use.
pub async fn main_wallet<C>(
    conn: &C,
    user_id: Uuid,
    mode: AccountMode,
    currency: &str
) -> Result<main_wallet::Model>
    where C: ConnectionTrait
{
    if let Some(wallet) = find_main_wallet(conn, user_id, mode).await? {
        return Ok(wallet);
    }

    create_main_wallet(conn, user_id, mode, currency).await
}

async fn find_main_wallet<C>(
    conn: &C,
    user_id: Uuid,
    mode: AccountMode
) -> Result<Option<main_wallet::Model>>
    where C: ConnectionTrait
{
    let wallet = MainWallet::find()
        .filter(main_wallet::Column::UserId.eq(user_id))
        .filter(main_wallet::Column::Mode.eq(mode.as_str()))
        .one(conn).await?;

    Ok(wallet)
}

/// Insert unless a concurrent request already did, then read back whichever
/// row won.
async fn create_main_wallet<C>(
    conn: &C,
    user_id: Uuid,
    mode: AccountMode,
    currency: &str
) -> Result<main_wallet::Model>
    where C: ConnectionTrait
{
    let now = Utc::now();
    let wallet = main_wallet::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        mode: Set(mode.to_string()),
        balance: Set(0),
        currency: Set(currency.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let inserted = MainWallet::insert(wallet)
        .on_conflict(
            OnConflict::columns([main_wallet::Column::UserId, main_wallet::Column::Mode])
                .do_nothing()
                .to_owned()
        )
        .exec_without_returning(conn).await?;

    if inserted > 0 {
        tracing::info!("Created {} main wallet for user {}", mode, user_id);
    }

    find_main_wallet(conn, user_id, mode).await?.ok_or_else(||
        AppError::Internal(format!("Main wallet for user {} vanished after insert", user_id))
    )
}

pub async fn find_budget<C>(
    conn: &C,
    user_id: Uuid,
    mode: AccountMode,
    id: Uuid
) -> Result<budget_wallet::Model>
    where C: ConnectionTrait
{
    BudgetWallet::find_by_id(id)
        .filter(budget_wallet::Column::UserId.eq(user_id))
        .filter(budget_wallet::Column::Mode.eq(mode.as_str()))
        .one(conn).await?
        .ok_or_else(|| AppError::NotFound("Budget wallet not found".to_string()))
}

pub async fn find_goal<C>(
    conn: &C,
    user_id: Uuid,
    mode: AccountMode,
    id: Uuid
) -> Result<goal_wallet::Model>
    where C: ConnectionTrait
{
    GoalWallet::find_by_id(id)
        .filter(goal_wallet::Column::UserId.eq(user_id))
        .filter(goal_wallet::Column::Mode.eq(mode.as_str()))
        .one(conn).await?
        .ok_or_else(|| AppError::NotFound("Goal wallet not found".to_string()))
}

pub async fn find_circle<C>(conn: &C, mode: AccountMode, id: Uuid) -> Result<circle::Model>
    where C: ConnectionTrait
{
    Circle::find_by_id(id)
        .filter(circle::Column::Mode.eq(mode.as_str()))
        .one(conn).await?
        .ok_or_else(|| AppError::NotFound("Circle not found".to_string()))
}

async fn resolve<C>(
    conn: &C,
    posting: &Posting,
    account: LedgerAccount,
    currency: &str
) -> Result<Resolved>
    where C: ConnectionTrait
{
    let now = Utc::now();

    let resolved = match account {
        LedgerAccount::External =>
            Resolved {
                account,
                id: None,
                label: posting.counterparty.clone().unwrap_or_else(|| "External".to_string()),
                lock: LockState::Unlocked,
                spend_limit: None,
                balance: 0,
            },
        LedgerAccount::Main => {
            let wallet = main_wallet(conn, posting.user_id, posting.mode, currency).await?;
            Resolved {
                account,
                id: Some(wallet.id),
                label: "Main wallet".to_string(),
                lock: LockState::Unlocked,
                spend_limit: None,
                balance: wallet.balance,
            }
        }
        LedgerAccount::Budget { id } => {
            let wallet = find_budget(conn, posting.user_id, posting.mode, id).await?;
            Resolved {
                account,
                id: Some(wallet.id),
                label: format!("{} budget", wallet.name),
                lock: LockState::evaluate(wallet.is_locked, wallet.lock_until, now),
                spend_limit: wallet.spend_limit,
                balance: wallet.balance,
            }
        }
        LedgerAccount::Goal { id } => {
            let wallet = find_goal(conn, posting.user_id, posting.mode, id).await?;
            Resolved {
                account,
                id: Some(wallet.id),
                label: format!("{} goal", wallet.name),
                lock: LockState::evaluate(wallet.is_locked, wallet.lock_until, now),
                spend_limit: None,
                balance: wallet.balance,
            }
        }
        LedgerAccount::Circle { id } => {
            let circle = find_circle(conn, posting.mode, id).await?;
            Resolved {
                account,
                id: Some(circle.id),
                label: format!("{} circle", circle.name),
                lock: LockState::Unlocked,
                spend_limit: None,
                balance: circle.balance,
            }
        }
    };

    Ok(resolved)
}

async fn debit<C>(conn: &C, account: &Resolved, amount: i64) -> Result<()>
    where C: ConnectionTrait
{
    account.lock.ensure_unlocked()?;

    let applied = match (account.account, account.id) {
        (LedgerAccount::External, _) => true,
        (LedgerAccount::Main, Some(id)) =>
            shift_balance::<MainWallet, C>(
                conn,
                main_wallet::Column::Id,
                main_wallet::Column::Balance,
                main_wallet::Column::UpdatedAt,
                id,
                -amount
            ).await?,
        (LedgerAccount::Budget { id }, _) =>
            shift_balance::<BudgetWallet, C>(
                conn,
                budget_wallet::Column::Id,
                budget_wallet::Column::Balance,
                budget_wallet::Column::UpdatedAt,
                id,
                -amount
            ).await?,
        (LedgerAccount::Goal { id }, _) =>
            shift_balance::<GoalWallet, C>(
                conn,
                goal_wallet::Column::Id,
                goal_wallet::Column::Balance,
                goal_wallet::Column::UpdatedAt,
                id,
                -amount
            ).await?,
        (LedgerAccount::Circle { id }, _) =>
            shift_balance::<Circle, C>(
                conn,
                circle::Column::Id,
                circle::Column::Balance,
                circle::Column::UpdatedAt,
                id,
                -amount
            ).await?,
        (LedgerAccount::Main, None) => {
            return Err(AppError::Internal("Main wallet resolved without id".to_string()));
        }
    };

    if !applied {
        return Err(AppError::InsufficientBalance);
    }

    Ok(())
}

async fn credit<C>(conn: &C, account: &Resolved, amount: i64) -> Result<()>
    where C: ConnectionTrait
{
    let new_balance = money::checked_add(account.balance, amount)?;
    if let Some(limit) = account.spend_limit {
        if new_balance > limit {
            return Err(
                AppError::InvalidInput(
                    format!(
                        "{} would exceed its limit of {}",
                        account.label,
                        money::format_naira(limit)
                    )
                )
            );
        }
    }

    let applied = match (account.account, account.id) {
        (LedgerAccount::External, _) => true,
        (LedgerAccount::Main, Some(id)) =>
            shift_balance::<MainWallet, C>(
                conn,
                main_wallet::Column::Id,
                main_wallet::Column::Balance,
                main_wallet::Column::UpdatedAt,
                id,
                amount
            ).await?,
        (LedgerAccount::Budget { id }, _) =>
            shift_balance::<BudgetWallet, C>(
                conn,
                budget_wallet::Column::Id,
                budget_wallet::Column::Balance,
                budget_wallet::Column::UpdatedAt,
                id,
                amount
            ).await?,
        (LedgerAccount::Goal { id }, _) =>
            shift_balance::<GoalWallet, C>(
                conn,
                goal_wallet::Column::Id,
                goal_wallet::Column::Balance,
                goal_wallet::Column::UpdatedAt,
                id,
                amount
            ).await?,
        (LedgerAccount::Circle { id }, _) =>
            shift_balance::<Circle, C>(
                conn,
                circle::Column::Id,
                circle::Column::Balance,
                circle::Column::UpdatedAt,
                id,
                amount
            ).await?,
        (LedgerAccount::Main, None) => {
            return Err(AppError::Internal("Main wallet resolved without id".to_string()));
        }
    };

    if !applied {
        return Err(AppError::NotFound(format!("{} no longer exists", account.label)));
    }

    Ok(())
}

/// `balance = balance + delta` on one row. Negative deltas only apply while
/// the balance covers them, so concurrent debits cannot overdraw.
async fn shift_balance<E, C>(
    conn: &C,
    id_column: E::Column,
    balance_column: E::Column,
    updated_column: E::Column,
    id: Uuid,
    delta: i64
) -> Result<bool>
    where E: EntityTrait, C: ConnectionTrait
{
    let mut update = E::update_many()
        .col_expr(balance_column, Expr::col(balance_column).add(delta))
        .col_expr(updated_column, Expr::value(Utc::now()))
        .filter(id_column.eq(id));

    if delta < 0 {
        update = update.filter(balance_column.gte(-delta));
    }

    let result = update.exec(conn).await?;
    Ok(result.rows_affected == 1)
}

/// Stored versus log-derived balance of one account.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceCheck {
    pub account: LedgerAccount,
    pub name: String,
    pub stored_balance: i64,
    pub derived_balance: i64,
    pub balanced: bool,
}

/// Recompute every account the user can see in `mode` from the transaction
/// log and compare it with the stored balance.
pub async fn reconcile<C>(conn: &C, user_id: Uuid, mode: AccountMode) -> Result<Vec<BalanceCheck>>
    where C: ConnectionTrait
{
    let mut accounts: Vec<(LedgerAccount, Uuid, String, i64)> = Vec::new();

    if
        let Some(main) = MainWallet::find()
            .filter(main_wallet::Column::UserId.eq(user_id))
            .filter(main_wallet::Column::Mode.eq(mode.as_str()))
            .one(conn).await?
    {
        accounts.push((LedgerAccount::Main, main.id, "Main wallet".to_string(), main.balance));
    }

    for wallet in BudgetWallet::find()
        .filter(budget_wallet::Column::UserId.eq(user_id))
        .filter(budget_wallet::Column::Mode.eq(mode.as_str()))
        .all(conn).await? {
        accounts.push((
            LedgerAccount::Budget { id: wallet.id },
            wallet.id,
            wallet.name,
            wallet.balance,
        ));
    }

    for wallet in GoalWallet::find()
        .filter(goal_wallet::Column::UserId.eq(user_id))
        .filter(goal_wallet::Column::Mode.eq(mode.as_str()))
        .all(conn).await? {
        accounts.push((LedgerAccount::Goal { id: wallet.id }, wallet.id, wallet.name, wallet.balance));
    }

    let circle_ids: Vec<Uuid> = CircleMember::find()
        .filter(circle_member::Column::UserId.eq(user_id))
        .all(conn).await?
        .into_iter()
        .map(|m| m.circle_id)
        .collect();

    if !circle_ids.is_empty() {
        for circle in Circle::find()
            .filter(circle::Column::Id.is_in(circle_ids))
            .filter(circle::Column::Mode.eq(mode.as_str()))
            .all(conn).await? {
            accounts.push((
                LedgerAccount::Circle { id: circle.id },
                circle.id,
                circle.name,
                circle.balance,
            ));
        }
    }

    if accounts.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = accounts
        .iter()
        .map(|(_, id, _, _)| *id)
        .collect();

    let rows = Transaction::find()
        .filter(transaction::Column::Mode.eq(mode.as_str()))
        .filter(
            transaction::Column::SourceId
                .is_in(ids.clone())
                .or(transaction::Column::DestinationId.is_in(ids))
        )
        .all(conn).await?;

    let mut derived: HashMap<(&str, Uuid), i64> = HashMap::new();
    for row in &rows {
        if let Some(id) = row.source_id {
            let entry = derived.entry((row.source_kind.as_str(), id)).or_default();
            *entry = money::checked_add(*entry, -row.amount)?;
        }
        if let Some(id) = row.destination_id {
            let entry = derived.entry((row.destination_kind.as_str(), id)).or_default();
            *entry = money::checked_add(*entry, row.amount)?;
        }
    }

    let checks = accounts
        .into_iter()
        .map(|(account, id, name, stored_balance)| {
            let derived_balance = derived.get(&(account.kind(), id)).copied().unwrap_or(0);
            BalanceCheck {
                account,
                name,
                stored_balance,
                derived_balance,
                balanced: stored_balance == derived_balance,
            }
        })
        .collect();

    Ok(checks)
}
