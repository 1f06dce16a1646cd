//! Access tokens are issued by the external auth service (Supabase); this
//! module only resolves them to a user id.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ AppError, Result };

#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub user_id: Uuid,
    pub email: Option<String>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn verify(&self, access_token: &str) -> Result<AuthIdentity>;
}

pub struct SupabaseAuth {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

#[derive(Deserialize)]
struct SupabaseUser {
    id: Uuid,
    email: Option<String>,
}

impl SupabaseAuth {
    pub fn new(base_url: String, anon_key: String) -> Result<Self> {
        let client = reqwest::Client
            ::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url, anon_key })
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn verify(&self, access_token: &str) -> Result<AuthIdentity> {
        let response = self.client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send().await
            .map_err(|e| {
                tracing::warn!("Auth service unreachable: {}", e);
                AppError::Unauthorized
            })?;

        if !response.status().is_success() {
            tracing::debug!("Auth service rejected token with {}", response.status());
            return Err(AppError::Unauthorized);
        }

        let user: SupabaseUser = response.json().await.map_err(|_| AppError::Unauthorized)?;

        Ok(AuthIdentity {
            user_id: user.id,
            email: user.email,
        })
    }
}

/// Pull the token out of an `Authorization: Bearer ...` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)
}
