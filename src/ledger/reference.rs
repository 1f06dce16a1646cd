use chrono::{ DateTime, Utc };
use rand::Rng;

use crate::enums::ActivityType;

/// `PREFIX-<unix millis>-<4 random digits>`, e.g. `TRF-1718000000000-0427`.
pub fn generate(activity: ActivityType, now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::rng().random_range(0..10_000);
    format!("{}-{}-{:04}", activity.reference_prefix(), now.timestamp_millis(), suffix)
}

/// Reference of a wallet-deletion sweep: `DEL<unix millis><3 random digits>`.
pub fn deletion(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::rng().random_range(0..1_000);
    format!("DEL{}{:03}", now.timestamp_millis(), suffix)
}
