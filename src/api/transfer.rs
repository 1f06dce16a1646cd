use axum::{ extract::State, http::StatusCode, Json };

use crate::error::Result;
use crate::ledger::PostingReceipt;
use crate::services::TransferRequest;

use super::{ posting_response, AppState, AuthUser, IdempotencyKey };

pub async fn create_transfer(
    State(state): State<AppState>,
    user: AuthUser,
    IdempotencyKey(key): IdempotencyKey,
    Json(request): Json<TransferRequest>
) -> Result<(StatusCode, Json<PostingReceipt>)> {
    let receipt = state.transfer_service.transfer(user.user_id, user.mode, request, key).await?;
    Ok(posting_response(receipt))
}
