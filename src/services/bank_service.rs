use std::sync::Arc;

use chrono::{ NaiveDate, Utc };
use sea_orm::{
    ActiveModelTrait,
    ActiveValue,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    SqlErr,
    TransactionTrait,
};
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use crate::crypto::Encryptor;
use crate::db::entity::{ profile, webhook_event, Profile, WebhookEvent };
use crate::enums::{ AccountMode, ActivityType, KycStatus };
use crate::error::{ AppError, Result };
use crate::ledger::{ self, LedgerAccount, Posting };
use crate::money;
use crate::vfd::{ signature, BankProvider, CreateClientRequest, InboundCredit };

const PROVIDER: &str = "vfd";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBankAccountRequest {
    pub bvn: String,
    pub date_of_birth: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct BankAccountView {
    pub account_number: String,
    pub account_name: String,
    pub kyc_status: KycStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Credited,
    Duplicate,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookOutcome {
    pub status: WebhookStatus,
    pub reference: String,
    pub transaction_id: Option<Uuid>,
}

pub struct BankService {
    db: DatabaseConnection,
    bank: Arc<dyn BankProvider>,
    encryptor: Arc<Encryptor>,
    webhook_secret: String,
    currency: String,
}

impl BankService {
    pub fn new(
        db: DatabaseConnection,
        bank: Arc<dyn BankProvider>,
        encryptor: Arc<Encryptor>,
        webhook_secret: String,
        currency: String
    ) -> Self {
        Self {
            db,
            bank,
            encryptor,
            webhook_secret,
            currency,
        }
    }

    /// Open the user's live bank account and mark their KYC as verified.
    pub async fn create_account(
        &self,
        user_id: Uuid,
        request: CreateBankAccountRequest
    ) -> Result<BankAccountView> {
        let bvn = request.bvn.trim();
        if bvn.len() != 11 || !bvn.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::InvalidInput("BVN must be 11 digits".to_string()));
        }
        if request.date_of_birth >= Utc::now().date_naive() {
            return Err(AppError::InvalidInput("Date of birth must be in the past".to_string()));
        }

        let profile = Profile::find_by_id(user_id)
            .one(&self.db).await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
        if profile.vfd_account_number.is_some() {
            return Err(AppError::Conflict("A bank account already exists for this user".to_string()));
        }

        let account = self.bank.create_client(
            &(CreateClientRequest {
                bvn: bvn.to_string(),
                date_of_birth: request.date_of_birth,
            })
        ).await?;

        let encrypted_bvn = self.encryptor.encrypt(bvn)?;

        let txn = self.db.begin().await?;
        let mut active: profile::ActiveModel = profile.into();
        active.vfd_account_number = ActiveValue::Set(Some(account.account_number.clone()));
        active.vfd_account_name = ActiveValue::Set(Some(account.account_name.clone()));
        active.encrypted_bvn = ActiveValue::Set(Some(encrypted_bvn));
        active.date_of_birth = ActiveValue::Set(Some(request.date_of_birth));
        active.kyc_status = ActiveValue::Set(KycStatus::Verified.to_string());
        active.updated_at = ActiveValue::Set(Utc::now());
        active.update(&txn).await.map_err(|e| {
            match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) =>
                    AppError::Conflict("Bank account number is already linked".to_string()),
                _ => AppError::Database(e),
            }
        })?;

        ledger::main_wallet(&txn, user_id, AccountMode::Live, &self.currency).await?;
        txn.commit().await?;

        tracing::info!("Linked bank account {} to user {}", account.account_number, user_id);

        Ok(BankAccountView {
            account_number: account.account_number,
            account_name: account.account_name,
            kyc_status: KycStatus::Verified,
        })
    }

    /// Verify and apply an inbound credit notification. Each bank reference is
    /// credited at most once.
    pub async fn handle_webhook(&self, body: &[u8], signature: Option<&str>) -> Result<WebhookOutcome> {
        if let Err(e) = signature::verify(&self.webhook_secret, body, signature) {
            tracing::warn!("Rejected VFD webhook with bad signature");
            return Err(e);
        }

        let credit = InboundCredit::parse(body)?;
        let amount = credit.amount_kobo()?;
        let reference = credit.reference.trim().to_string();

        let txn = self.db.begin().await?;

        if
            let Some(existing) = WebhookEvent::find()
                .filter(webhook_event::Column::Provider.eq(PROVIDER))
                .filter(webhook_event::Column::EventReference.eq(reference.as_str()))
                .one(&txn).await?
        {
            tracing::info!("Ignoring duplicate VFD webhook {}", reference);
            return Ok(WebhookOutcome {
                status: WebhookStatus::Duplicate,
                reference,
                transaction_id: existing.transaction_id,
            });
        }

        let Some(profile) = Profile::find()
            .filter(profile::Column::VfdAccountNumber.eq(credit.account_number.trim()))
            .one(&txn).await? else {
            tracing::warn!("VFD webhook {} for unknown account {}", reference, credit.account_number);
            return Err(AppError::NotFound("No wallet is linked to this account number".to_string()));
        };

        let posting = Posting::new(
            profile.id,
            AccountMode::Live,
            LedgerAccount::External,
            LedgerAccount::Main,
            amount,
            ActivityType::BankCredit
        )
            .counterparty(credit.sender())
            .describe(credit.description())
            .idempotency_key(Some(credit.idempotency_key()));

        let receipt = match ledger::post(&txn, posting, &self.currency).await {
            Ok(receipt) => receipt,
            Err(AppError::Conflict(reason)) => {
                tracing::info!("VFD webhook {} lost a redelivery race: {}", reference, reason);
                return Ok(WebhookOutcome {
                    status: WebhookStatus::Duplicate,
                    reference,
                    transaction_id: None,
                });
            }
            Err(e) => {
                return Err(e);
            }
        };
        if receipt.replayed {
            return Ok(WebhookOutcome {
                status: WebhookStatus::Duplicate,
                reference,
                transaction_id: Some(receipt.transaction.id),
            });
        }

        let event = webhook_event::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            provider: ActiveValue::Set(PROVIDER.to_string()),
            event_reference: ActiveValue::Set(reference.clone()),
            account_number: ActiveValue::Set(credit.account_number.trim().to_string()),
            amount: ActiveValue::Set(amount),
            payload: ActiveValue::Set(String::from_utf8_lossy(body).into_owned()),
            transaction_id: ActiveValue::Set(Some(receipt.transaction.id)),
            received_at: ActiveValue::Set(Utc::now()),
        };

        match event.insert(&txn).await {
            Ok(_) => {}
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Ok(WebhookOutcome {
                    status: WebhookStatus::Duplicate,
                    reference,
                    transaction_id: None,
                });
            }
            Err(e) => {
                return Err(e.into());
            }
        }

        txn.commit().await?;

        tracing::info!(
            "Credited {} to user {} from VFD webhook {}",
            money::format_naira(amount),
            profile.id,
            reference
        );

        Ok(WebhookOutcome {
            status: WebhookStatus::Credited,
            reference,
            transaction_id: Some(receipt.transaction.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entity::Transaction;
    use crate::test_utils::{ self, TEST_WEBHOOK_SECRET };
    use sea_orm::PaginatorTrait;

    fn credit_body(reference: &str, account_number: &str, amount: &str) -> Vec<u8> {
        serde_json
            ::json!({
                "reference": reference,
                "amount": amount,
                "account_number": account_number,
                "originator_account_name": "Ada Obi",
                "originator_bank": "GTBank",
                "narration": "savings",
                "session_id": "0000123",
            })
            .to_string()
            .into_bytes()
    }

    async fn linked_user(ctx: &test_utils::TestContext) -> (Uuid, String) {
        let user = ctx.user(AccountMode::Live).await;
        let account = ctx.bank
            .create_account(user, CreateBankAccountRequest {
                bvn: "22212345678".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            }).await
            .unwrap();
        (user, account.account_number)
    }

    #[tokio::test]
    async fn test_create_account_links_profile() {
        let ctx = test_utils::TestContext::new().await;
        let (user, account_number) = linked_user(&ctx).await;

        let profile = ctx.profiles.get(user).await.unwrap();
        assert_eq!(profile.vfd_account_number.as_deref(), Some(account_number.as_str()));
        assert_eq!(profile.kyc_status, "verified");
        let stored_bvn = profile.encrypted_bvn.unwrap();
        assert_ne!(stored_bvn, "22212345678");

        let err = ctx.bank
            .create_account(user, CreateBankAccountRequest {
                bvn: "22212345678".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            }).await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_invalid_bvn_rejected() {
        let ctx = test_utils::TestContext::new().await;
        let user = ctx.user(AccountMode::Live).await;

        let err = ctx.bank
            .create_account(user, CreateBankAccountRequest {
                bvn: "123".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            }).await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_webhook_credits_live_main_once() {
        let ctx = test_utils::TestContext::new().await;
        let (user, account_number) = linked_user(&ctx).await;
        let body = credit_body("VFD-REF-1", &account_number, "2500.00");
        let signature = signature::sign(TEST_WEBHOOK_SECRET, &body).unwrap();

        let first = ctx.bank.handle_webhook(&body, Some(&signature)).await.unwrap();
        let second = ctx.bank.handle_webhook(&body, Some(&signature)).await.unwrap();

        assert_eq!(first.status, WebhookStatus::Credited);
        assert_eq!(second.status, WebhookStatus::Duplicate);
        assert_eq!(second.transaction_id, first.transaction_id);

        let live = ctx.wallets.main_wallet(user, AccountMode::Live).await.unwrap();
        let demo = ctx.wallets.main_wallet(user, AccountMode::Demo).await.unwrap();
        assert_eq!(live.balance, 250_000);
        assert_eq!(demo.balance, 0);
        assert_eq!(Transaction::find().count(&ctx.db).await.unwrap(), 1);
        assert_eq!(WebhookEvent::find().count(&ctx.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_webhook_reports_duplicate_when_credit_already_posted() {
        let ctx = test_utils::TestContext::new().await;
        let (user, account_number) = linked_user(&ctx).await;
        let other = ctx.user(AccountMode::Demo).await;

        // The credit row exists but the event row does not, as after a
        // concurrent delivery committed first.
        let taken = Posting::new(
            other,
            AccountMode::Demo,
            LedgerAccount::External,
            LedgerAccount::Main,
            1_000,
            ActivityType::TopUp
        ).idempotency_key(Some("vfd:VFD-REF-4".to_string()));
        ledger::post(&ctx.db, taken, test_utils::TEST_CURRENCY).await.unwrap();

        let body = credit_body("VFD-REF-4", &account_number, "100.00");
        let signature = signature::sign(TEST_WEBHOOK_SECRET, &body).unwrap();
        let outcome = ctx.bank.handle_webhook(&body, Some(&signature)).await.unwrap();

        assert_eq!(outcome.status, WebhookStatus::Duplicate);
        assert_eq!(ctx.wallets.main_wallet(user, AccountMode::Live).await.unwrap().balance, 0);
        assert_eq!(Transaction::find().count(&ctx.db).await.unwrap(), 1);
        assert_eq!(WebhookEvent::find().count(&ctx.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_webhook_unknown_account_not_found() {
        let ctx = test_utils::TestContext::new().await;
        linked_user(&ctx).await;
        let body = credit_body("VFD-REF-2", "9999999999", "100.00");
        let signature = signature::sign(TEST_WEBHOOK_SECRET, &body).unwrap();

        let err = ctx.bank.handle_webhook(&body, Some(&signature)).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(Transaction::find().count(&ctx.db).await.unwrap(), 0);
        assert_eq!(WebhookEvent::find().count(&ctx.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_webhook_bad_signature_rejected() {
        let ctx = test_utils::TestContext::new().await;
        let (user, account_number) = linked_user(&ctx).await;
        let body = credit_body("VFD-REF-3", &account_number, "100.00");
        let signature = signature::sign("not-the-secret", &body).unwrap();

        let err = ctx.bank.handle_webhook(&body, Some(&signature)).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidSignature));
        assert_eq!(ctx.wallets.main_wallet(user, AccountMode::Live).await.unwrap().balance, 0);
    }
}
