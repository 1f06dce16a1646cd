use axum::extract::FromRequestParts;
use axum::http::{ header::AUTHORIZATION, request::Parts };
use uuid::Uuid;

use crate::auth::bearer_token;
use crate::db::entity::profile;
use crate::enums::AccountMode;
use crate::error::{ AppError, Result };

use super::AppState;

const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// The authenticated caller and the account mode every query of this request
/// is scoped to.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub mode: AccountMode,
    pub profile: profile::Model,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let token = bearer_token(header)?;

        let identity = state.auth.verify(token).await?;
        let profile = state.profile_service.get_or_create(
            identity.user_id,
            identity.email.as_deref()
        ).await?;
        let mode = profile.account_mode.parse()?;

        Ok(AuthUser {
            user_id: identity.user_id,
            mode,
            profile,
        })
    }
}

/// Optional `Idempotency-Key` request header.
#[derive(Debug, Clone, Default)]
pub struct IdempotencyKey(pub Option<String>);

impl<S> FromRequestParts<S> for IdempotencyKey where S: Send + Sync {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let Some(value) = parts.headers.get("idempotency-key") else {
            return Ok(IdempotencyKey(None));
        };

        let key = value
            .to_str()
            .map_err(|_| AppError::InvalidInput("Idempotency-Key must be ASCII".to_string()))?
            .trim();

        if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(
                AppError::InvalidInput(
                    format!("Idempotency-Key must be 1 to {} characters", MAX_IDEMPOTENCY_KEY_LEN)
                )
            );
        }

        Ok(IdempotencyKey(Some(key.to_string())))
    }
}
