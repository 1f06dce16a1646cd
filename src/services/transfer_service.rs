use sea_orm::{ DatabaseConnection, TransactionTrait };
use serde::Deserialize;
use uuid::Uuid;

use crate::enums::{ AccountMode, ActivityType };
use crate::error::{ AppError, Result };
use crate::ledger::{ self, LedgerAccount, Posting, PostingReceipt };

#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub source: LedgerAccount,
    pub destination: LedgerAccount,
    pub amount: i64,
    pub description: Option<String>,
}

/// Moves money between the user's own main, budget and goal wallets.
pub struct TransferService {
    db: DatabaseConnection,
    currency: String,
}

impl TransferService {
    pub fn new(db: DatabaseConnection, currency: String) -> Self {
        Self { db, currency }
    }

    pub async fn transfer(
        &self,
        user_id: Uuid,
        mode: AccountMode,
        request: TransferRequest,
        idempotency_key: Option<String>
    ) -> Result<PostingReceipt> {
        for account in [request.source, request.destination] {
            if matches!(account, LedgerAccount::External | LedgerAccount::Circle { .. }) {
                return Err(
                    AppError::InvalidInput(
                        format!(
                            "Transfers only move money between main, budget and goal wallets, got {}",
                            account.kind()
                        )
                    )
                );
            }
        }

        let activity = activity_for(request.source, request.destination);
        let posting = Posting::new(
            user_id,
            mode,
            request.source,
            request.destination,
            request.amount,
            activity
        )
            .describe(request.description.map(|d| d.trim().to_string()).unwrap_or_default())
            .idempotency_key(idempotency_key);

        let txn = self.db.begin().await?;
        let receipt = ledger::post(&txn, posting, &self.currency).await?;
        txn.commit().await?;

        Ok(receipt)
    }
}

fn activity_for(source: LedgerAccount, destination: LedgerAccount) -> ActivityType {
    match (source, destination) {
        (_, LedgerAccount::Budget { .. }) => ActivityType::BudgetFunding,
        (_, LedgerAccount::Goal { .. }) => ActivityType::GoalSaving,
        (LedgerAccount::Budget { .. }, _) => ActivityType::BudgetRelease,
        (LedgerAccount::Goal { .. }, _) => ActivityType::GoalRelease,
        _ => ActivityType::WalletTransfer,
    }
}
