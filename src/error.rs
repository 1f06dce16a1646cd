use chrono::{ DateTime, Utc };
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")] Database(#[from] sea_orm::DbErr),

    #[error("Encryption error: {0}")] Encryption(String),

    #[error("Invalid input: {0}")] InvalidInput(String),

    #[error("Invalid amount: {0}")] InvalidAmount(String),

    #[error("Not found: {0}")] NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")] Forbidden(String),

    #[error("Invalid transaction PIN")]
    InvalidPin,

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Wallet is locked until {until}")] WalletLocked {
        until: DateTime<Utc>,
    },

    #[error("Conflict: {0}")] Conflict(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Bank provider error: {0}")] Bank(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Internal error: {0}")] Internal(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn to_error_response(&self) -> ErrorResponse {
        let (code, message, field) = match self {
            AppError::Database(e) => ("DATABASE_ERROR", e.to_string(), None),
            AppError::Encryption(msg) => ("ENCRYPTION_ERROR", msg.clone(), None),
            AppError::InvalidInput(msg) => ("INVALID_INPUT", msg.clone(), None),
            AppError::InvalidAmount(msg) =>
                ("INVALID_AMOUNT", msg.clone(), Some("amount".to_string())),
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone(), None),
            AppError::Unauthorized =>
                ("UNAUTHORIZED", "Missing or invalid access token".to_string(), None),
            AppError::Forbidden(msg) => ("FORBIDDEN", msg.clone(), None),
            AppError::InvalidPin =>
                ("INVALID_PIN", "Invalid transaction PIN".to_string(), Some("pin".to_string())),
            AppError::InsufficientBalance =>
                ("INSUFFICIENT_BALANCE", "Insufficient balance for transaction".to_string(), None),
            AppError::WalletLocked { until } =>
                ("WALLET_LOCKED", format!("Wallet is locked until {}", until.to_rfc3339()), None),
            AppError::Conflict(msg) => ("CONFLICT", msg.clone(), None),
            AppError::InvalidSignature =>
                ("INVALID_SIGNATURE", "Webhook signature verification failed".to_string(), None),
            AppError::Bank(msg) => ("BANK_ERROR", msg.clone(), None),
            AppError::Config(msg) => ("CONFIG_ERROR", msg.clone(), None),
            AppError::Internal(msg) => ("INTERNAL_ERROR", msg.clone(), None),
        };

        ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field,
            },
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::InvalidAmount(_) => {
                axum::http::StatusCode::BAD_REQUEST
            }
            AppError::InsufficientBalance => axum::http::StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidSignature => {
                axum::http::StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) | AppError::InvalidPin => axum::http::StatusCode::FORBIDDEN,
            AppError::WalletLocked { .. } => axum::http::StatusCode::LOCKED,
            AppError::Conflict(_) => axum::http::StatusCode::CONFLICT,
            AppError::Bank(_) => axum::http::StatusCode::BAD_GATEWAY,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let response = self.to_error_response();
        (status, axum::Json(response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
