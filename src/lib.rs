pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod enums;
pub mod error;
pub mod ledger;
pub mod money;
pub mod services;
pub mod vfd;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::Config;
pub use enums::{ AccountMode, ActivityType, CircleRole, CircleVisibility, TransactionType, TxStatus };
pub use error::{ AppError, Result };
