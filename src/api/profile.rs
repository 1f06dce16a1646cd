use axum::{ extract::State, http::StatusCode, Json };
use serde::Deserialize;

use crate::db::entity::{ profile, user_settings };
use crate::enums::AccountMode;
use crate::error::Result;
use crate::services::{ ProfileUpdate, SettingsUpdate };

use super::{ AppState, AuthUser };

#[derive(Deserialize)]
pub struct SetModeRequest {
    pub mode: AccountMode,
}

#[derive(Deserialize)]
pub struct SetPinRequest {
    pub pin: String,
    #[serde(default)]
    pub current_pin: Option<String>,
}

#[derive(Deserialize)]
pub struct DisablePinRequest {
    pub pin: Option<String>,
}

pub async fn get_profile(user: AuthUser) -> Result<Json<profile::Model>> {
    Ok(Json(user.profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ProfileUpdate>
) -> Result<Json<profile::Model>> {
    let profile = state.profile_service.update(user.user_id, request).await?;
    Ok(Json(profile))
}

pub async fn set_mode(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<SetModeRequest>
) -> Result<Json<profile::Model>> {
    let profile = state.profile_service.set_mode(user.user_id, request.mode).await?;
    Ok(Json(profile))
}

pub async fn get_settings(
    State(state): State<AppState>,
    user: AuthUser
) -> Result<Json<user_settings::Model>> {
    let settings = state.profile_service.get_or_create_settings(user.user_id).await?;
    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<SettingsUpdate>
) -> Result<Json<user_settings::Model>> {
    let settings = state.profile_service.update_settings(user.user_id, request).await?;
    Ok(Json(settings))
}

pub async fn set_pin(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<SetPinRequest>
) -> Result<StatusCode> {
    state.profile_service.set_pin(
        user.user_id,
        &request.pin,
        request.current_pin.as_deref()
    ).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn disable_pin(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<DisablePinRequest>
) -> Result<StatusCode> {
    state.profile_service.disable_pin(user.user_id, request.pin.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
