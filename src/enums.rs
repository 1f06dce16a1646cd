use std::fmt;
use std::str::FromStr;

use serde::{ Deserialize, Serialize };

use crate::error::AppError;

// ─── AccountMode ────────────────────────────────────────────────────

/// Namespace partitioning all financial data of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountMode {
    Demo,
    Live,
}

impl AccountMode {
    /// Canonical string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountMode::Demo => "demo",
            AccountMode::Live => "live",
        }
    }
}

impl fmt::Display for AccountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "demo" => Ok(AccountMode::Demo),
            "live" => Ok(AccountMode::Live),
            _ => Err(AppError::InvalidInput(format!("Invalid account mode: {}. Supported: demo, live", s))),
        }
    }
}

// ─── TransactionType ────────────────────────────────────────────────

/// Coarse direction label of a ledger posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "transfer" => Ok(TransactionType::Transfer),
            _ => Err(AppError::InvalidInput(format!("Invalid transaction type: {}", s))),
        }
    }
}

// ─── ActivityType ───────────────────────────────────────────────────

/// Activity feed category of a ledger posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    TopUp,
    Withdrawal,
    BudgetFunding,
    BudgetRelease,
    GoalSaving,
    GoalRelease,
    WalletTransfer,
    CircleContribution,
    CircleWithdrawal,
    WalletClosure,
    BankCredit,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::TopUp => "top_up",
            ActivityType::Withdrawal => "withdrawal",
            ActivityType::BudgetFunding => "budget_funding",
            ActivityType::BudgetRelease => "budget_release",
            ActivityType::GoalSaving => "goal_saving",
            ActivityType::GoalRelease => "goal_release",
            ActivityType::WalletTransfer => "wallet_transfer",
            ActivityType::CircleContribution => "circle_contribution",
            ActivityType::CircleWithdrawal => "circle_withdrawal",
            ActivityType::WalletClosure => "wallet_closure",
            ActivityType::BankCredit => "bank_credit",
        }
    }

    /// Prefix of generated reference numbers.
    pub fn reference_prefix(&self) -> &'static str {
        match self {
            ActivityType::TopUp => "TOP",
            ActivityType::Withdrawal => "WDR",
            | ActivityType::BudgetFunding
            | ActivityType::BudgetRelease
            | ActivityType::GoalSaving
            | ActivityType::GoalRelease
            | ActivityType::WalletTransfer => "TRF",
            ActivityType::CircleContribution => "CTB",
            ActivityType::CircleWithdrawal => "CWD",
            ActivityType::WalletClosure => "DEL",
            ActivityType::BankCredit => "VFD",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top_up" | "topup" => Ok(ActivityType::TopUp),
            "withdrawal" => Ok(ActivityType::Withdrawal),
            "budget_funding" => Ok(ActivityType::BudgetFunding),
            "budget_release" => Ok(ActivityType::BudgetRelease),
            "goal_saving" => Ok(ActivityType::GoalSaving),
            "goal_release" => Ok(ActivityType::GoalRelease),
            "wallet_transfer" => Ok(ActivityType::WalletTransfer),
            "circle_contribution" => Ok(ActivityType::CircleContribution),
            "circle_withdrawal" => Ok(ActivityType::CircleWithdrawal),
            "wallet_closure" => Ok(ActivityType::WalletClosure),
            "bank_credit" => Ok(ActivityType::BankCredit),
            _ => Err(AppError::InvalidInput(format!("Invalid activity type: {}", s))),
        }
    }
}

// ─── TxStatus ───────────────────────────────────────────────────────

/// Status of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Completed,
    Failed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Completed => "completed",
            TxStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── CircleRole ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircleRole {
    Admin,
    Moderator,
    Member,
}

impl CircleRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircleRole::Admin => "admin",
            CircleRole::Moderator => "moderator",
            CircleRole::Member => "member",
        }
    }
}

impl fmt::Display for CircleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CircleRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(CircleRole::Admin),
            "moderator" => Ok(CircleRole::Moderator),
            "member" => Ok(CircleRole::Member),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid circle role: {}. Supported: admin, moderator, member",
                s
            ))),
        }
    }
}

// ─── CircleVisibility ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircleVisibility {
    Public,
    Private,
}

impl CircleVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircleVisibility::Public => "public",
            CircleVisibility::Private => "private",
        }
    }
}

impl fmt::Display for CircleVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CircleVisibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(CircleVisibility::Public),
            "private" => Ok(CircleVisibility::Private),
            _ => Err(AppError::InvalidInput(format!("Invalid circle visibility: {}", s))),
        }
    }
}

// ─── KycStatus ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    Unverified,
    Verified,
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::Unverified => "unverified",
            KycStatus::Verified => "verified",
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
