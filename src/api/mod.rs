use std::sync::Arc;

use axum::{ http::StatusCode, routing::{ get, post, put }, Json, Router };
use sea_orm::DatabaseConnection;

pub mod auth;
pub mod circle;
pub mod profile;
pub mod transaction;
pub mod transfer;
pub mod vfd;
pub mod wallet;

pub use auth::{ AuthUser, IdempotencyKey };

use crate::auth::AuthProvider;
use crate::crypto::Encryptor;
use crate::db::{ TransactionRepository, WalletRepository };
use crate::ledger::PostingReceipt;
use crate::services::{
    BankService,
    CircleService,
    ProfileService,
    TransactionService,
    TransferService,
    WalletService,
};
use crate::vfd::BankProvider;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthProvider>,
    pub profile_service: Arc<ProfileService>,
    pub wallet_service: Arc<WalletService>,
    pub transfer_service: Arc<TransferService>,
    pub circle_service: Arc<CircleService>,
    pub transaction_service: Arc<TransactionService>,
    pub bank_service: Arc<BankService>,
}

impl AppState {
    /// Wire every service onto one connection pool.
    pub fn assemble(
        db: DatabaseConnection,
        auth: Arc<dyn AuthProvider>,
        bank: Arc<dyn BankProvider>,
        encryptor: Arc<Encryptor>,
        webhook_secret: String,
        currency: String
    ) -> Self {
        let wallet_repository = Arc::new(WalletRepository::new(db.clone()));
        let transaction_repository = Arc::new(TransactionRepository::new(db.clone()));
        let profile_service = Arc::new(ProfileService::new(db.clone()));

        Self {
            auth,
            wallet_service: Arc::new(
                WalletService::new(
                    db.clone(),
                    wallet_repository.clone(),
                    profile_service.clone(),
                    currency.clone()
                )
            ),
            transfer_service: Arc::new(TransferService::new(db.clone(), currency.clone())),
            circle_service: Arc::new(
                CircleService::new(db.clone(), transaction_repository.clone(), currency.clone())
            ),
            transaction_service: Arc::new(
                TransactionService::new(
                    db.clone(),
                    transaction_repository,
                    wallet_repository,
                    currency.clone()
                )
            ),
            bank_service: Arc::new(BankService::new(db, bank, encryptor, webhook_secret, currency)),
            profile_service,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/profile", get(profile::get_profile).patch(profile::update_profile))
        .route("/api/profile/mode", put(profile::set_mode))
        .route("/api/settings", get(profile::get_settings).patch(profile::update_settings))
        .route("/api/settings/pin", put(profile::set_pin).delete(profile::disable_pin))
        .route("/api/wallets", get(wallet::overview))
        .route("/api/wallets/main", get(wallet::main_wallet))
        .route("/api/wallets/main/top-up", post(wallet::top_up))
        .route("/api/wallets/main/withdraw", post(wallet::withdraw))
        .route("/api/wallets/budgets", get(wallet::list_budgets).post(wallet::create_budget))
        .route(
            "/api/wallets/budgets/{id}",
            axum::routing::patch(wallet::update_budget).delete(wallet::delete_budget)
        )
        .route("/api/wallets/budgets/{id}/lock", post(wallet::lock_budget))
        .route("/api/wallets/budgets/{id}/unlock", post(wallet::unlock_budget))
        .route("/api/wallets/goals", get(wallet::list_goals).post(wallet::create_goal))
        .route(
            "/api/wallets/goals/{id}",
            axum::routing::patch(wallet::update_goal).delete(wallet::delete_goal)
        )
        .route("/api/wallets/goals/{id}/lock", post(wallet::lock_goal))
        .route("/api/wallets/goals/{id}/unlock", post(wallet::unlock_goal))
        .route("/api/transfers", post(transfer::create_transfer))
        .route("/api/circles", get(circle::list_circles).post(circle::create_circle))
        .route("/api/circles/discover", get(circle::discover_circles))
        .route("/api/circles/{id}", get(circle::get_circle))
        .route("/api/circles/{id}/join", post(circle::join_circle))
        .route("/api/circles/{id}/leave", post(circle::leave_circle))
        .route("/api/circles/{id}/contribute", post(circle::contribute))
        .route("/api/circles/{id}/withdraw", post(circle::withdraw))
        .route("/api/circles/{id}/members/{user_id}/role", put(circle::change_role))
        .route("/api/circles/{id}/transactions", get(circle::circle_transactions))
        .route("/api/transactions", get(transaction::list_transactions))
        .route("/api/transactions/{reference}", get(transaction::get_transaction))
        .route("/api/analytics/summary", get(transaction::analytics_summary))
        .route("/api/ledger/reconcile", get(transaction::reconcile))
        .route("/api/vfd/create-wallet", post(vfd::create_wallet))
        .route("/api/webhooks/vfd", post(vfd::webhook))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// 201 for a fresh posting, 200 when an idempotency key replayed an old one.
pub(crate) fn posting_response(receipt: PostingReceipt) -> (StatusCode, Json<PostingReceipt>) {
    let status = if receipt.replayed { StatusCode::OK } else { StatusCode::CREATED };
    (status, Json(receipt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{ to_bytes, Body };
    use axum::http::Request;
    use serde_json::{ json, Value };
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::enums::AccountMode;
    use crate::services::CreateBankAccountRequest;
    use crate::test_utils::{ self, TEST_WEBHOOK_SECRET };
    use crate::vfd::signature;

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        headers: &[(&str, &str)],
        body: Option<Value>
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(body) =>
                builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let ctx = test_utils::TestContext::new().await;
        let app = router(ctx.state.clone());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_requests_without_token_rejected() {
        let ctx = test_utils::TestContext::new().await;
        let app = router(ctx.state.clone());

        let (status, body) = send(&app, "GET", "/api/wallets", None, &[], None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, _) = send(&app, "GET", "/api/wallets", Some("garbage"), &[], None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_first_request_creates_demo_profile() {
        let ctx = test_utils::TestContext::new().await;
        let app = router(ctx.state.clone());
        let token = test_utils::token_for(Uuid::new_v4());

        let (status, body) = send(&app, "GET", "/api/profile", Some(&token), &[], None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["account_mode"], "demo");
        assert!(body.get("encrypted_bvn").is_none());
    }

    #[tokio::test]
    async fn test_budget_funding_flow_with_idempotency() {
        let ctx = test_utils::TestContext::new().await;
        let app = router(ctx.state.clone());
        let token = test_utils::token_for(Uuid::new_v4());

        let (status, _) = send(
            &app,
            "POST",
            "/api/wallets/main/top-up",
            Some(&token),
            &[],
            Some(json!({ "amount": 1_000_000 }))
        ).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, budget) = send(
            &app,
            "POST",
            "/api/wallets/budgets",
            Some(&token),
            &[],
            Some(json!({ "name": "Groceries" }))
        ).await;
        assert_eq!(status, StatusCode::CREATED);
        let budget_id = budget["id"].as_str().unwrap().to_string();

        let transfer = json!({
            "source": { "kind": "main" },
            "destination": { "kind": "budget", "id": budget_id },
            "amount": 400_000,
        });
        let (status, first) = send(
            &app,
            "POST",
            "/api/transfers",
            Some(&token),
            &[("idempotency-key", "move-1")],
            Some(transfer.clone())
        ).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["replayed"], false);

        let (status, second) = send(
            &app,
            "POST",
            "/api/transfers",
            Some(&token),
            &[("idempotency-key", "move-1")],
            Some(transfer)
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["replayed"], true);
        assert_eq!(second["transaction"]["id"], first["transaction"]["id"]);

        let (_, overview) = send(&app, "GET", "/api/wallets", Some(&token), &[], None).await;
        assert_eq!(overview["main"]["balance"], 600_000);
        assert_eq!(overview["budgets"][0]["balance"], 400_000);
        assert_eq!(overview["budgets"][0]["lock"]["state"], "unlocked");

        let (_, report) = send(&app, "GET", "/api/ledger/reconcile", Some(&token), &[], None).await;
        assert_eq!(report["balanced"], true);
    }

    #[tokio::test]
    async fn test_overdraw_and_lock_errors_map_to_status() {
        let ctx = test_utils::TestContext::new().await;
        let app = router(ctx.state.clone());
        let token = test_utils::token_for(Uuid::new_v4());

        let (status, body) = send(
            &app,
            "POST",
            "/api/wallets/main/withdraw",
            Some(&token),
            &[],
            Some(json!({ "amount": 100 }))
        ).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INSUFFICIENT_BALANCE");

        let (_, goal) = send(
            &app,
            "POST",
            "/api/wallets/goals",
            Some(&token),
            &[],
            Some(json!({ "name": "Rent", "target_amount": 50_000_000 }))
        ).await;
        let goal_id = goal["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/wallets/goals/{}/lock", goal_id),
            Some(&token),
            &[],
            Some(json!({ "days": 90 }))
        ).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/wallets/goals/{}/unlock", goal_id),
            Some(&token),
            &[],
            None
        ).await;
        assert_eq!(status, StatusCode::LOCKED);
        assert_eq!(body["error"]["code"], "WALLET_LOCKED");
    }

    #[tokio::test]
    async fn test_mode_switch_over_http() {
        let ctx = test_utils::TestContext::new().await;
        let app = router(ctx.state.clone());
        let token = test_utils::token_for(Uuid::new_v4());

        send(&app, "POST", "/api/wallets/main/top-up", Some(&token), &[], Some(json!({ "amount": 5_000 }))).await;

        let (status, _) = send(
            &app,
            "PUT",
            "/api/profile/mode",
            Some(&token),
            &[],
            Some(json!({ "mode": "live" }))
        ).await;
        assert_eq!(status, StatusCode::OK);

        let (_, feed) = send(&app, "GET", "/api/transactions", Some(&token), &[], None).await;
        assert_eq!(feed.as_array().map(|a| a.len()), Some(0));

        let (status, body) = send(
            &app,
            "POST",
            "/api/wallets/main/top-up",
            Some(&token),
            &[],
            Some(json!({ "amount": 5_000 }))
        ).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_webhook_endpoint() {
        let ctx = test_utils::TestContext::new().await;
        let app = router(ctx.state.clone());
        let user = ctx.user(AccountMode::Live).await;
        let account = ctx.bank
            .create_account(user, CreateBankAccountRequest {
                bvn: "22212345678".to_string(),
                date_of_birth: chrono::NaiveDate::from_ymd_opt(1988, 1, 2).unwrap(),
            }).await
            .unwrap();

        let payload = json!({
            "reference": "NIP-778",
            "amount": "1500.00",
            "account_number": account.account_number,
        });
        let raw = payload.to_string();
        let good = signature::sign(TEST_WEBHOOK_SECRET, raw.as_bytes()).unwrap();

        let (status, body) = send(
            &app,
            "POST",
            "/api/webhooks/vfd",
            None,
            &[(signature::SIGNATURE_HEADER, "deadbeef")],
            Some(payload.clone())
        ).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_SIGNATURE");

        let (status, body) = send(
            &app,
            "POST",
            "/api/webhooks/vfd",
            None,
            &[(signature::SIGNATURE_HEADER, &good)],
            Some(payload.clone())
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "credited");

        let (status, body) = send(
            &app,
            "POST",
            "/api/webhooks/vfd",
            None,
            &[(signature::SIGNATURE_HEADER, &good)],
            Some(payload)
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "duplicate");

        let unknown = json!({
            "reference": "NIP-779",
            "amount": "10.00",
            "account_number": "0000000000",
        });
        let signed = signature::sign(TEST_WEBHOOK_SECRET, unknown.to_string().as_bytes()).unwrap();
        let (status, _) = send(
            &app,
            "POST",
            "/api/webhooks/vfd",
            None,
            &[(signature::SIGNATURE_HEADER, &signed)],
            Some(unknown)
        ).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let live = ctx.wallets.main_wallet(user, AccountMode::Live).await.unwrap();
        assert_eq!(live.balance, 150_000);
    }
}
