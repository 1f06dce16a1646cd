use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{ Duration, NaiveDate, Utc };
use sea_orm::DatabaseConnection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::entity::transaction;
use crate::db::{ TransactionFilter, TransactionRepository, WalletRepository };
use crate::enums::AccountMode;
use crate::error::{ AppError, Result };
use crate::ledger::{ self, BalanceCheck };
use crate::money;

pub const DEFAULT_SUMMARY_DAYS: i64 = 30;
pub const MAX_SUMMARY_DAYS: i64 = 365;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyFlow {
    pub date: NaiveDate,
    pub inflow: i64,
    pub outflow: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub mode: AccountMode,
    pub days: i64,
    pub main_balance: i64,
    pub budget_total: i64,
    pub goal_total: i64,
    pub inflow: i64,
    pub outflow: i64,
    pub net_flow: i64,
    pub transaction_count: usize,
    pub by_activity: BTreeMap<String, i64>,
    pub daily: Vec<DailyFlow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub mode: AccountMode,
    pub balanced: bool,
    pub accounts: Vec<BalanceCheck>,
}

pub struct TransactionService {
    db: DatabaseConnection,
    repository: Arc<TransactionRepository>,
    wallets: Arc<WalletRepository>,
    currency: String,
}

impl TransactionService {
    pub fn new(
        db: DatabaseConnection,
        repository: Arc<TransactionRepository>,
        wallets: Arc<WalletRepository>,
        currency: String
    ) -> Self {
        Self {
            db,
            repository,
            wallets,
            currency,
        }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        filter: TransactionFilter
    ) -> Result<Vec<transaction::Model>> {
        self.repository.find_by_user(user_id, mode, filter).await
    }

    pub async fn get_by_reference(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        reference: &str
    ) -> Result<transaction::Model> {
        self.repository.find_by_reference(user_id, mode, reference).await
    }

    /// Money in and out of the user's wallets over the last `days` days.
    /// Moves between the user's own wallets count toward neither side.
    pub async fn summary(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        days: Option<i64>
    ) -> Result<AnalyticsSummary> {
        let days = days.unwrap_or(DEFAULT_SUMMARY_DAYS);
        if !(1..=MAX_SUMMARY_DAYS).contains(&days) {
            return Err(
                AppError::InvalidInput(format!("days must be between 1 and {}", MAX_SUMMARY_DAYS))
            );
        }

        let today = Utc::now().date_naive();
        let first_day = today - Duration::days(days - 1);
        let since = first_day
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| AppError::Internal("Invalid summary window".to_string()))?;

        let main = ledger::main_wallet(&self.db, user_id, mode, &self.currency).await?;
        let budget_total = money::checked_sum(
            self.wallets
                .find_budgets(user_id, mode).await?
                .iter()
                .map(|w| w.balance)
        )?;
        let goal_total = money::checked_sum(
            self.wallets
                .find_goals(user_id, mode).await?
                .iter()
                .map(|w| w.balance)
        )?;

        let rows = self.repository.find_since(user_id, mode, since).await?;
        let flows = Flows::from_rows(&rows, first_day, today)?;

        Ok(AnalyticsSummary {
            mode,
            days,
            main_balance: main.balance,
            budget_total,
            goal_total,
            inflow: flows.inflow,
            outflow: flows.outflow,
            net_flow: money::checked_add(flows.inflow, -flows.outflow)?,
            transaction_count: rows.len(),
            by_activity: flows.by_activity,
            daily: flows.daily,
        })
    }

    pub async fn reconcile(&self, user_id: Uuid, mode: AccountMode) -> Result<ReconciliationReport> {
        let accounts = ledger::reconcile(&self.db, user_id, mode).await?;
        let balanced = accounts.iter().all(|a| a.balanced);

        if !balanced {
            tracing::warn!("Ledger drift detected for user {} ({})", user_id, mode);
        }

        Ok(ReconciliationReport { mode, balanced, accounts })
    }
}

struct Flows {
    inflow: i64,
    outflow: i64,
    by_activity: BTreeMap<String, i64>,
    daily: Vec<DailyFlow>,
}

impl Flows {
    fn from_rows(
        rows: &[transaction::Model],
        first_day: NaiveDate,
        last_day: NaiveDate
    ) -> Result<Self> {
        let mut daily: BTreeMap<NaiveDate, (i64, i64)> = first_day
            .iter_days()
            .take_while(|d| *d <= last_day)
            .map(|d| (d, (0, 0)))
            .collect();

        let mut inflow = 0;
        let mut outflow = 0;
        let mut by_activity = BTreeMap::new();

        for row in rows {
            let total = by_activity.entry(row.activity_type.clone()).or_insert(0);
            *total = money::checked_add(*total, row.amount)?;

            let day = daily.entry(row.created_at.date_naive()).or_insert((0, 0));
            if is_outside(&row.source_kind) {
                inflow = money::checked_add(inflow, row.amount)?;
                day.0 = money::checked_add(day.0, row.amount)?;
            }
            if is_outside(&row.destination_kind) {
                outflow = money::checked_add(outflow, row.amount)?;
                day.1 = money::checked_add(day.1, row.amount)?;
            }
        }

        let daily = daily
            .into_iter()
            .filter(|(date, _)| *date >= first_day && *date <= last_day)
            .map(|(date, (inflow, outflow))| DailyFlow { date, inflow, outflow })
            .collect();

        Ok(Self { inflow, outflow, by_activity, daily })
    }
}

/// Accounts that are not one of the user's own wallets.
fn is_outside(kind: &str) -> bool {
    matches!(kind, "external" | "circle")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::ActivityType;
    use crate::ledger::LedgerAccount;
    use crate::services::CreateCircleRequest;
    use crate::test_utils;

    #[tokio::test]
    async fn test_feed_is_newest_first_and_filterable() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;
        ctx.wallets.top_up(user, AccountMode::Demo, 100_000, None).await.unwrap();
        let budget = ctx.budget(user, AccountMode::Demo, "Food").await;
        ctx.fund(user, AccountMode::Demo, LedgerAccount::Budget { id: budget }, 30_000).await;

        let all = ctx.transactions
            .list(user, AccountMode::Demo, TransactionFilter::default()).await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].created_at >= all[1].created_at);

        let top_ups = ctx.transactions
            .list(user, AccountMode::Demo, TransactionFilter {
                activity: Some(ActivityType::TopUp),
                ..Default::default()
            }).await
            .unwrap();
        assert_eq!(top_ups.len(), 1);

        let page = ctx.transactions
            .list(user, AccountMode::Demo, TransactionFilter {
                limit: Some(1),
                offset: Some(1),
                ..Default::default()
            }).await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, all[1].id);

        let found = ctx.transactions
            .get_by_reference(user, AccountMode::Demo, &all[0].reference).await
            .unwrap();
        assert_eq!(found.id, all[0].id);
    }

    #[tokio::test]
    async fn test_mode_switch_changes_visible_rows() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;
        ctx.wallets.top_up(user, AccountMode::Demo, 100_000, None).await.unwrap();
        ctx.budget(user, AccountMode::Demo, "Demo budget").await;

        let demo_reference = ctx.transactions
            .list(user, AccountMode::Demo, TransactionFilter::default()).await
            .unwrap()[0].reference.clone();

        let profile = ctx.profiles.set_mode(user, AccountMode::Live).await.unwrap();
        let mode: AccountMode = profile.account_mode.parse().unwrap();

        let feed = ctx.transactions.list(user, mode, TransactionFilter::default()).await.unwrap();
        let wallets = ctx.wallets.overview(user, mode).await.unwrap();

        assert!(feed.is_empty());
        assert!(wallets.budgets.is_empty());
        assert_eq!(wallets.main.balance, 0);

        let err = ctx.transactions.get_by_reference(user, mode, &demo_reference).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_summary_excludes_internal_moves() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;
        ctx.wallets.top_up(user, AccountMode::Demo, 500_000, None).await.unwrap();
        let goal = ctx.goal(user, AccountMode::Demo, "Trip").await;
        ctx.fund(user, AccountMode::Demo, LedgerAccount::Goal { id: goal }, 200_000).await;
        ctx.wallets.withdraw(user, AccountMode::Demo, 50_000, None, None).await.unwrap();

        let circle = ctx.circles
            .create(user, AccountMode::Demo, CreateCircleRequest {
                name: "Family".to_string(),
                description: None,
                category: None,
                visibility: None,
                max_members: None,
                target_amount: None,
            }).await
            .unwrap();
        ctx.circles.contribute(user, AccountMode::Demo, circle.circle.id, 25_000, None).await.unwrap();

        let summary = ctx.transactions.summary(user, AccountMode::Demo, Some(7)).await.unwrap();

        assert_eq!(summary.inflow, 500_000);
        assert_eq!(summary.outflow, 75_000);
        assert_eq!(summary.net_flow, 425_000);
        assert_eq!(summary.main_balance, 225_000);
        assert_eq!(summary.goal_total, 200_000);
        assert_eq!(summary.by_activity.get("goal_saving"), Some(&200_000));
        assert_eq!(summary.daily.len(), 7);
        assert_eq!(summary.daily.last().map(|d| d.inflow), Some(500_000));
        assert_eq!(summary.transaction_count, 4);
    }

    #[tokio::test]
    async fn test_summary_rejects_bad_window() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;

        assert!(ctx.transactions.summary(user, AccountMode::Demo, Some(0)).await.is_err());
        assert!(ctx.transactions.summary(user, AccountMode::Demo, Some(366)).await.is_err());
    }

    #[tokio::test]
    async fn test_reconcile_after_postings() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Demo).await;
        ctx.wallets.top_up(user, AccountMode::Demo, 1_000_000, None).await.unwrap();
        let budget = ctx.budget(user, AccountMode::Demo, "Groceries").await;
        let goal = ctx.goal(user, AccountMode::Demo, "Laptop").await;
        ctx.fund(user, AccountMode::Demo, LedgerAccount::Budget { id: budget }, 400_000).await;
        ctx.fund(user, AccountMode::Demo, LedgerAccount::Goal { id: goal }, 100_000).await;
        ctx.wallets
            .delete_wallet(user, AccountMode::Demo, crate::services::SubWalletKind::Goal, goal).await
            .unwrap();

        let report = ctx.transactions.reconcile(user, AccountMode::Demo).await.unwrap();

        assert!(report.balanced);
        assert_eq!(report.accounts.len(), 2);
        let main = report.accounts
            .iter()
            .find(|a| a.account == LedgerAccount::Main)
            .unwrap();
        assert_eq!(main.stored_balance, 600_000);
        assert_eq!(main.derived_balance, 600_000);
    }

    fn bank_credit(amount: i64) -> transaction::Model {
        let now = Utc::now();
        transaction::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            mode: AccountMode::Live.to_string(),
            reference: format!("VFD-{}", Uuid::new_v4()),
            transaction_type: "deposit".to_string(),
            activity_type: ActivityType::BankCredit.to_string(),
            source_kind: "external".to_string(),
            source_id: None,
            destination_kind: "main".to_string(),
            destination_id: Some(Uuid::new_v4()),
            sender: "External".to_string(),
            receiver: "Main wallet".to_string(),
            amount,
            description: String::new(),
            status: "completed".to_string(),
            circle_id: None,
            idempotency_key: None,
            created_at: now,
        }
    }

    #[test]
    fn test_flows_overflow_is_an_error() {
        let today = Utc::now().date_naive();
        let rows = vec![bank_credit(i64::MAX), bank_credit(1)];

        let err = Flows::from_rows(&rows, today, today).err().unwrap();
        assert!(matches!(err, AppError::InvalidAmount(_)));

        let flows = Flows::from_rows(&rows[..1], today, today).unwrap();
        assert_eq!(flows.inflow, i64::MAX);
    }

    #[test]
    fn test_flows_zero_fill_days() {
        let today = Utc::now().date_naive();
        let flows = Flows::from_rows(&[], today - Duration::days(2), today).unwrap();

        assert_eq!(flows.daily.len(), 3);
        assert!(flows.daily.iter().all(|d| d.inflow == 0 && d.outflow == 0));
    }
}
