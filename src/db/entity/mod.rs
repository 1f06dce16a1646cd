pub mod profile;
pub mod user_settings;
pub mod main_wallet;
pub mod budget_wallet;
pub mod goal_wallet;
pub mod circle;
pub mod circle_member;
pub mod transaction;
pub mod webhook_event;

pub use profile::Entity as Profile;
pub use user_settings::Entity as UserSettings;
pub use main_wallet::Entity as MainWallet;
pub use budget_wallet::Entity as BudgetWallet;
pub use goal_wallet::Entity as GoalWallet;
pub use circle::Entity as Circle;
pub use circle_member::Entity as CircleMember;
pub use transaction::Entity as Transaction;
pub use webhook_event::Entity as WebhookEvent;
