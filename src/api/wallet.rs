use axum::{ extract::{ Path, State }, http::StatusCode, Json };
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use crate::db::entity::main_wallet;
use crate::error::Result;
use crate::ledger::{ LockState, PostingReceipt };
use crate::services::wallet_service::{
    BudgetView,
    GoalView,
    WalletClosure,
    WalletOverview,
};
use crate::services::{
    CreateBudgetRequest,
    CreateGoalRequest,
    SubWalletKind,
    UpdateBudgetRequest,
    UpdateGoalRequest,
};

use super::{ posting_response, AppState, AuthUser, IdempotencyKey };

#[derive(Deserialize)]
pub struct TopUpRequest {
    pub amount: i64,
}

#[derive(Deserialize)]
pub struct WithdrawRequest {
    pub amount: i64,
    pub pin: Option<String>,
}

#[derive(Deserialize)]
pub struct LockRequest {
    pub days: i64,
}

#[derive(Serialize)]
pub struct LockResponse {
    pub wallet_id: Uuid,
    pub lock: LockState,
}

pub async fn overview(State(state): State<AppState>, user: AuthUser) -> Result<Json<WalletOverview>> {
    let overview = state.wallet_service.overview(user.user_id, user.mode).await?;
    Ok(Json(overview))
}

pub async fn main_wallet(
    State(state): State<AppState>,
    user: AuthUser
) -> Result<Json<main_wallet::Model>> {
    let wallet = state.wallet_service.main_wallet(user.user_id, user.mode).await?;
    Ok(Json(wallet))
}

pub async fn top_up(
    State(state): State<AppState>,
    user: AuthUser,
    IdempotencyKey(key): IdempotencyKey,
    Json(request): Json<TopUpRequest>
) -> Result<(StatusCode, Json<PostingReceipt>)> {
    let receipt = state.wallet_service.top_up(user.user_id, user.mode, request.amount, key).await?;
    Ok(posting_response(receipt))
}

pub async fn withdraw(
    State(state): State<AppState>,
    user: AuthUser,
    IdempotencyKey(key): IdempotencyKey,
    Json(request): Json<WithdrawRequest>
) -> Result<(StatusCode, Json<PostingReceipt>)> {
    let receipt = state.wallet_service.withdraw(
        user.user_id,
        user.mode,
        request.amount,
        request.pin.as_deref(),
        key
    ).await?;
    Ok(posting_response(receipt))
}

pub async fn list_budgets(
    State(state): State<AppState>,
    user: AuthUser
) -> Result<Json<Vec<BudgetView>>> {
    let budgets = state.wallet_service.list_budgets(user.user_id, user.mode).await?;
    Ok(Json(budgets))
}

pub async fn create_budget(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateBudgetRequest>
) -> Result<(StatusCode, Json<BudgetView>)> {
    let budget = state.wallet_service.create_budget(user.user_id, user.mode, request).await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn update_budget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBudgetRequest>
) -> Result<Json<BudgetView>> {
    let budget = state.wallet_service.update_budget(user.user_id, user.mode, id, request).await?;
    Ok(Json(budget))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>
) -> Result<Json<WalletClosure>> {
    let closure = state.wallet_service.delete_wallet(
        user.user_id,
        user.mode,
        SubWalletKind::Budget,
        id
    ).await?;
    Ok(Json(closure))
}

pub async fn lock_budget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<LockRequest>
) -> Result<Json<LockResponse>> {
    let lock = state.wallet_service.lock_wallet(
        user.user_id,
        user.mode,
        SubWalletKind::Budget,
        id,
        request.days
    ).await?;
    Ok(Json(LockResponse { wallet_id: id, lock }))
}

pub async fn unlock_budget(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>
) -> Result<Json<LockResponse>> {
    let lock = state.wallet_service.unlock_wallet(
        user.user_id,
        user.mode,
        SubWalletKind::Budget,
        id
    ).await?;
    Ok(Json(LockResponse { wallet_id: id, lock }))
}

pub async fn list_goals(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<GoalView>>> {
    let goals = state.wallet_service.list_goals(user.user_id, user.mode).await?;
    Ok(Json(goals))
}

pub async fn create_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateGoalRequest>
) -> Result<(StatusCode, Json<GoalView>)> {
    let goal = state.wallet_service.create_goal(user.user_id, user.mode, request).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn update_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateGoalRequest>
) -> Result<Json<GoalView>> {
    let goal = state.wallet_service.update_goal(user.user_id, user.mode, id, request).await?;
    Ok(Json(goal))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>
) -> Result<Json<WalletClosure>> {
    let closure = state.wallet_service.delete_wallet(
        user.user_id,
        user.mode,
        SubWalletKind::Goal,
        id
    ).await?;
    Ok(Json(closure))
}

pub async fn lock_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<LockRequest>
) -> Result<Json<LockResponse>> {
    let lock = state.wallet_service.lock_wallet(
        user.user_id,
        user.mode,
        SubWalletKind::Goal,
        id,
        request.days
    ).await?;
    Ok(Json(LockResponse { wallet_id: id, lock }))
}

pub async fn unlock_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>
) -> Result<Json<LockResponse>> {
    let lock = state.wallet_service.unlock_wallet(
        user.user_id,
        user.mode,
        SubWalletKind::Goal,
        id
    ).await?;
    Ok(Json(LockResponse { wallet_id: id, lock }))
}
