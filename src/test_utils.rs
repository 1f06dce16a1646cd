//! Shared fixtures for service and router tests: an in-memory SQLite
//! database migrated with the production migrations, plus fake auth and bank
//! providers.

use std::sync::atomic::{ AtomicU64, Ordering };
use std::sync::Arc;

use async_trait::async_trait;
use migration::{ Migrator, MigratorTrait };
use sea_orm::{ ConnectOptions, Database, DatabaseConnection, TransactionTrait };
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::{ AuthIdentity, AuthProvider };
use crate::crypto::Encryptor;
use crate::enums::{ AccountMode, ActivityType };
use crate::error::{ AppError, Result };
use crate::ledger::{ self, LedgerAccount, Posting };
use crate::services::{
    BankService,
    CircleService,
    CreateBudgetRequest,
    CreateGoalRequest,
    ProfileService,
    TransactionService,
    TransferService,
    WalletService,
};
use crate::vfd::{ BankAccount, BankProvider, CreateClientRequest };

pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const TEST_CURRENCY: &str = "NGN";

pub fn init_test_tracing() {
    let _ = tracing_subscriber
        ::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
        )
        .with_test_writer()
        .try_init();
}

/// Fresh migrated database. One connection, so every query sees the same
/// in-memory file.
pub async fn setup_db() -> DatabaseConnection {
    init_test_tracing();

    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn create_user(profiles: &ProfileService, mode: AccountMode) -> Uuid {
    let user_id = Uuid::new_v4();
    profiles.get_or_create(user_id, Some(&format!("{}@example.com", user_id))).await.unwrap();
    profiles.set_mode(user_id, mode).await.unwrap();
    user_id
}

/// Accepts tokens of the form `token-{user uuid}`.
pub struct FakeAuth;

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn verify(&self, access_token: &str) -> Result<AuthIdentity> {
        let user_id = access_token
            .strip_prefix("token-")
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthIdentity {
            user_id,
            email: Some(format!("{}@example.com", user_id)),
        })
    }
}

pub fn token_for(user_id: Uuid) -> String {
    format!("token-{}", user_id)
}

/// Hands out sequential account numbers.
#[derive(Default)]
pub struct FakeBank {
    next: AtomicU64,
}

#[async_trait]
impl BankProvider for FakeBank {
    async fn create_client(&self, _request: &CreateClientRequest) -> Result<BankAccount> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(BankAccount {
            account_number: format!("10{:08}", n),
            account_name: "ADA OBI".to_string(),
        })
    }
}

pub struct TestContext {
    pub db: DatabaseConnection,
    pub state: AppState,
    pub profiles: Arc<ProfileService>,
    pub wallets: Arc<WalletService>,
    pub transfers: Arc<TransferService>,
    pub circles: Arc<CircleService>,
    pub transactions: Arc<TransactionService>,
    pub bank: Arc<BankService>,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = setup_db().await;
        let encryptor = Arc::new(Encryptor::new(&[42u8; 32]).unwrap());

        let state = AppState::assemble(
            db.clone(),
            Arc::new(FakeAuth),
            Arc::new(FakeBank::default()),
            encryptor,
            TEST_WEBHOOK_SECRET.to_string(),
            TEST_CURRENCY.to_string()
        );

        Self {
            db,
            profiles: state.profile_service.clone(),
            wallets: state.wallet_service.clone(),
            transfers: state.transfer_service.clone(),
            circles: state.circle_service.clone(),
            transactions: state.transaction_service.clone(),
            bank: state.bank_service.clone(),
            state,
        }
    }

    pub async fn user(&self, mode: AccountMode) -> Uuid {
        create_user(&self.profiles, mode).await
    }

    pub async fn budget(&self, user_id: Uuid, mode: AccountMode, name: &str) -> Uuid {
        self.wallets
            .create_budget(user_id, mode, CreateBudgetRequest {
                name: name.to_string(),
                category: None,
                spend_limit: None,
            }).await
            .unwrap().wallet.id
    }

    pub async fn goal(&self, user_id: Uuid, mode: AccountMode, name: &str) -> Uuid {
        self.wallets
            .create_goal(user_id, mode, CreateGoalRequest {
                name: name.to_string(),
                target_amount: 10_000_000,
                target_date: None,
            }).await
            .unwrap().wallet.id
    }

    /// Move `amount` from the main wallet into `destination`.
    pub async fn fund(&self, user_id: Uuid, mode: AccountMode, destination: LedgerAccount, amount: i64) {
        let activity = match destination {
            LedgerAccount::Goal { .. } => ActivityType::GoalSaving,
            _ => ActivityType::BudgetFunding,
        };
        let posting = Posting::new(user_id, mode, LedgerAccount::Main, destination, amount, activity);

        let txn = self.db.begin().await.unwrap();
        ledger::post(&txn, posting, TEST_CURRENCY).await.unwrap();
        txn.commit().await.unwrap();
    }
}
