use axum::{ extract::{ Path, Query, State }, http::StatusCode, Json };
use serde::Deserialize;
use uuid::Uuid;

use crate::db::entity::transaction;
use crate::db::TransactionFilter;
use crate::enums::CircleRole;
use crate::error::Result;
use crate::ledger::PostingReceipt;
use crate::services::circle_service::{ CircleDetail, CircleSummary, MemberView };
use crate::services::CreateCircleRequest;

use super::{ posting_response, AppState, AuthUser, IdempotencyKey };

#[derive(Deserialize, Default)]
pub struct JoinCircleRequest {
    #[serde(default)]
    pub invite_code: Option<String>,
}

#[derive(Deserialize)]
pub struct CircleAmountRequest {
    pub amount: i64,
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: CircleRole,
}

#[derive(Deserialize)]
pub struct PageParams {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

pub async fn list_circles(
    State(state): State<AppState>,
    user: AuthUser
) -> Result<Json<Vec<CircleSummary>>> {
    let circles = state.circle_service.list_mine(user.user_id, user.mode).await?;
    Ok(Json(circles))
}

pub async fn discover_circles(
    State(state): State<AppState>,
    user: AuthUser
) -> Result<Json<Vec<CircleSummary>>> {
    let circles = state.circle_service.discover(user.user_id, user.mode).await?;
    Ok(Json(circles))
}

pub async fn create_circle(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateCircleRequest>
) -> Result<(StatusCode, Json<CircleDetail>)> {
    let circle = state.circle_service.create(user.user_id, user.mode, request).await?;
    Ok((StatusCode::CREATED, Json(circle)))
}

pub async fn get_circle(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>
) -> Result<Json<CircleDetail>> {
    let circle = state.circle_service.detail(user.user_id, user.mode, id).await?;
    Ok(Json(circle))
}

pub async fn join_circle(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<JoinCircleRequest>
) -> Result<Json<CircleDetail>> {
    let circle = state.circle_service.join(
        user.user_id,
        user.mode,
        id,
        request.invite_code.as_deref()
    ).await?;
    Ok(Json(circle))
}

pub async fn leave_circle(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>
) -> Result<StatusCode> {
    state.circle_service.leave(user.user_id, user.mode, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn contribute(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    IdempotencyKey(key): IdempotencyKey,
    Json(request): Json<CircleAmountRequest>
) -> Result<(StatusCode, Json<PostingReceipt>)> {
    let receipt = state.circle_service.contribute(
        user.user_id,
        user.mode,
        id,
        request.amount,
        key
    ).await?;
    Ok(posting_response(receipt))
}

pub async fn withdraw(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    IdempotencyKey(key): IdempotencyKey,
    Json(request): Json<CircleAmountRequest>
) -> Result<(StatusCode, Json<PostingReceipt>)> {
    let receipt = state.circle_service.withdraw(
        user.user_id,
        user.mode,
        id,
        request.amount,
        key
    ).await?;
    Ok(posting_response(receipt))
}

pub async fn change_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ChangeRoleRequest>
) -> Result<Json<MemberView>> {
    let member = state.circle_service.change_role(
        user.user_id,
        user.mode,
        id,
        member_id,
        request.role
    ).await?;
    Ok(Json(member))
}

pub async fn circle_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<PageParams>
) -> Result<Json<Vec<transaction::Model>>> {
    let transactions = state.circle_service.transactions(
        user.user_id,
        user.mode,
        id,
        TransactionFilter {
            activity: None,
            limit: params.limit,
            offset: params.offset,
        }
    ).await?;
    Ok(Json(transactions))
}
