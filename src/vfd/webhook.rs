use serde::{ Deserialize, Serialize };

use crate::error::{ AppError, Result };
use crate::money;

/// Inbound credit notification posted by VFD when money lands in a
/// customer's account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundCredit {
    pub reference: String,
    pub amount: AmountField,
    pub account_number: String,
    #[serde(default)]
    pub originator_account_name: Option<String>,
    #[serde(default)]
    pub originator_bank: Option<String>,
    #[serde(default)]
    pub narration: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// VFD sends naira amounts either as a string or a bare number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Text(String),
    Number(serde_json::Number),
}

impl InboundCredit {
    pub fn parse(body: &[u8]) -> Result<Self> {
        let credit: InboundCredit = serde_json
            ::from_slice(body)
            .map_err(|e| AppError::InvalidInput(format!("Malformed webhook payload: {}", e)))?;

        if credit.reference.trim().is_empty() || credit.account_number.trim().is_empty() {
            return Err(AppError::InvalidInput("Webhook reference and account number are required".to_string()));
        }

        Ok(credit)
    }

    /// Credited amount in kobo.
    pub fn amount_kobo(&self) -> Result<i64> {
        match &self.amount {
            AmountField::Text(text) => money::parse_naira(text),
            AmountField::Number(number) => money::parse_naira(&number.to_string()),
        }
    }

    pub fn idempotency_key(&self) -> String {
        format!("vfd:{}", self.reference.trim())
    }

    pub fn description(&self) -> String {
        match (&self.originator_account_name, &self.narration) {
            (Some(name), Some(narration)) => format!("Bank transfer from {}: {}", name, narration),
            (Some(name), None) => format!("Bank transfer from {}", name),
            (None, Some(narration)) => format!("Bank transfer: {}", narration),
            (None, None) => "Bank transfer".to_string(),
        }
    }

    pub fn sender(&self) -> String {
        match (&self.originator_account_name, &self.originator_bank) {
            (Some(name), Some(bank)) => format!("{} ({})", name, bank),
            (Some(name), None) => name.clone(),
            _ => "Bank transfer".to_string(),
        }
    }
}
