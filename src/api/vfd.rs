use axum::{ body::Bytes, extract::State, http::{ HeaderMap, StatusCode }, Json };

use crate::error::Result;
use crate::services::bank_service::BankAccountView;
use crate::services::{ CreateBankAccountRequest, WebhookOutcome };
use crate::vfd::signature::SIGNATURE_HEADER;

use super::{ AppState, AuthUser };

pub async fn create_wallet(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateBankAccountRequest>
) -> Result<(StatusCode, Json<BankAccountView>)> {
    let account = state.bank_service.create_account(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Signed by VFD, not by a user session. The raw body is needed for the
/// signature check, so it is parsed inside the service.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes
) -> Result<Json<WebhookOutcome>> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let outcome = state.bank_service.handle_webhook(&body, signature).await?;
    Ok(Json(outcome))
}
