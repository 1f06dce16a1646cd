//! VFD banking-as-a-service: account creation and inbound credit webhooks.

use std::sync::Arc;
use std::time::{ Duration, SystemTime };

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{ Deserialize, Serialize };
use tokio::sync::RwLock;

use crate::config::VfdConfig;
use crate::error::{ AppError, Result };

pub mod signature;
pub mod webhook;

pub use webhook::InboundCredit;

const TOKEN_TTL_SECS: u64 = 3600;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct CreateClientRequest {
    pub bvn: String,
    pub date_of_birth: NaiveDate,
}

/// Account opened for a customer at the bank.
#[derive(Debug, Clone, Serialize)]
pub struct BankAccount {
    pub account_number: String,
    pub account_name: String,
}

#[async_trait]
pub trait BankProvider: Send + Sync {
    async fn create_client(&self, request: &CreateClientRequest) -> Result<BankAccount>;
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    fetched_at: SystemTime,
}

pub struct VfdClient {
    client: reqwest::Client,
    config: VfdConfig,
    token: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    consumer_key: &'a str,
    consumer_secret: &'a str,
    validity_time: &'a str,
}

#[derive(Deserialize)]
struct Envelope<T> {
    status: Option<String>,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct TokenData {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientData {
    account_no: String,
    firstname: Option<String>,
    lastname: Option<String>,
}

impl VfdClient {
    pub fn new(config: VfdConfig) -> Result<Self> {
        let client = reqwest::Client
            ::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            token: Arc::new(RwLock::new(None)),
        })
    }

    async fn access_token(&self) -> Result<String> {
        if let Some(cached) = self.token.read().await.as_ref() {
            let age = SystemTime::now()
                .duration_since(cached.fetched_at)
                .unwrap_or(Duration::from_secs(TOKEN_TTL_SECS));

            if age.as_secs() < TOKEN_TTL_SECS {
                return Ok(cached.token.clone());
            }
        }

        let url = format!("{}/baasauth/token", self.config.auth_url);
        let response = self.client
            .post(&url)
            .json(
                &(TokenRequest {
                    consumer_key: &self.config.consumer_key,
                    consumer_secret: &self.config.consumer_secret,
                    validity_time: "-1",
                })
            )
            .send().await
            .map_err(|e| AppError::Bank(format!("Token request failed: {}", e)))?;

        let envelope: Envelope<TokenData> = Self::read_envelope(response).await?;
        let token = envelope.data
            .map(|d| d.access_token)
            .ok_or_else(|| AppError::Bank("Token response carried no access token".to_string()))?;

        *self.token.write().await = Some(CachedToken {
            token: token.clone(),
            fetched_at: SystemTime::now(),
        });
        tracing::debug!("Refreshed VFD access token");

        Ok(token)
    }

    async fn read_envelope<T>(response: reqwest::Response) -> Result<Envelope<T>>
        where T: for<'de> Deserialize<'de>
    {
        let status = response.status();
        let body = response
            .text().await
            .map_err(|e| AppError::Bank(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::warn!("VFD responded with {}: {}", status, body);
            return Err(AppError::Bank(format!("VFD responded with {}", status)));
        }

        let envelope: Envelope<T> = serde_json
            ::from_str(&body)
            .map_err(|e| AppError::Bank(format!("Unexpected response body: {}", e)))?;

        // VFD reports business failures with HTTP 200 and a non-"00" status.
        if let Some(code) = envelope.status.as_deref() {
            if code != "00" {
                let message = envelope.message.clone().unwrap_or_default();
                tracing::warn!("VFD rejected request with status {}: {}", code, message);
                return Err(AppError::Bank(format!("VFD error {}: {}", code, message)));
            }
        }

        Ok(envelope)
    }
}

#[async_trait]
impl BankProvider for VfdClient {
    async fn create_client(&self, request: &CreateClientRequest) -> Result<BankAccount> {
        let token = self.access_token().await?;
        let url = format!("{}/client/create", self.config.base_url);
        let date_of_birth = request.date_of_birth.format("%d-%b-%Y").to_string();

        let response = self.client
            .post(&url)
            .header("AccessToken", token)
            .query(
                &[
                    ("bvn", request.bvn.as_str()),
                    ("dateOfBirth", date_of_birth.as_str()),
                ]
            )
            .send().await
            .map_err(|e| AppError::Bank(format!("Account creation request failed: {}", e)))?;

        let envelope: Envelope<ClientData> = Self::read_envelope(response).await?;
        let data = envelope.data.ok_or_else(||
            AppError::Bank("Account creation response carried no account".to_string())
        )?;

        let account_name = [data.firstname, data.lastname]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        tracing::info!("Opened VFD account {}", data.account_no);

        Ok(BankAccount {
            account_number: data.account_no,
            account_name,
        })
    }
}
