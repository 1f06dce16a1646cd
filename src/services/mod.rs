pub mod bank_service;
pub mod circle_service;
pub mod profile_service;
pub mod transaction_service;
pub mod transfer_service;
pub mod wallet_service;

pub use bank_service::{ BankService, CreateBankAccountRequest, WebhookOutcome, WebhookStatus };
pub use circle_service::{ CircleService, CreateCircleRequest };
pub use profile_service::{ ProfileService, ProfileUpdate, SettingsUpdate };
pub use transaction_service::TransactionService;
pub use transfer_service::{ TransferRequest, TransferService };
pub use wallet_service::{
    CreateBudgetRequest,
    CreateGoalRequest,
    SubWalletKind,
    UpdateBudgetRequest,
    UpdateGoalRequest,
    WalletService,
};
