use argon2::{ Argon2, PasswordHash, PasswordHasher, PasswordVerifier };
use argon2::password_hash::{ SaltString, rand_core::OsRng };
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter };
use serde::Deserialize;
use uuid::Uuid;

use crate::db::entity::{ profile, user_settings, Profile, UserSettings };
use crate::enums::{ AccountMode, KycStatus };
use crate::error::{ AppError, Result };

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub transaction_alerts: Option<bool>,
    pub hide_balance: Option<bool>,
    pub discoverable: Option<bool>,
}

#[derive(Clone)]
pub struct ProfileService {
    db: DatabaseConnection,
}

impl ProfileService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Profile of an authenticated user, created with demo mode on first sight.
    pub async fn get_or_create(&self, user_id: Uuid, email: Option<&str>) -> Result<profile::Model> {
        if let Some(profile) = Profile::find_by_id(user_id).one(&self.db).await? {
            return Ok(profile);
        }

        self.create_profile(user_id, email).await
    }

    /// A concurrent first request may insert the same id; the loser reads the
    /// winner's row back.
    async fn create_profile(&self, user_id: Uuid, email: Option<&str>) -> Result<profile::Model> {
        let now = Utc::now();
        let active = profile::ActiveModel {
            id: ActiveValue::Set(user_id),
            email: ActiveValue::Set(email.map(str::to_string)),
            full_name: ActiveValue::Set(None),
            phone: ActiveValue::Set(None),
            account_mode: ActiveValue::Set(AccountMode::Demo.to_string()),
            kyc_status: ActiveValue::Set(KycStatus::Unverified.to_string()),
            encrypted_bvn: ActiveValue::Set(None),
            date_of_birth: ActiveValue::Set(None),
            vfd_account_number: ActiveValue::Set(None),
            vfd_account_name: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        let inserted = Profile::insert(active)
            .on_conflict(OnConflict::column(profile::Column::Id).do_nothing().to_owned())
            .exec_without_returning(&self.db).await?;

        if inserted > 0 {
            tracing::info!("Created profile for user {}", user_id);
        }

        self.get(user_id).await
    }

    pub async fn get(&self, user_id: Uuid) -> Result<profile::Model> {
        Profile::find_by_id(user_id)
            .one(&self.db).await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    pub async fn update(&self, user_id: Uuid, update: ProfileUpdate) -> Result<profile::Model> {
        let profile = self.get(user_id).await?;
        let mut active: profile::ActiveModel = profile.into();

        if let Some(full_name) = update.full_name {
            let full_name = full_name.trim();
            if full_name.is_empty() || full_name.chars().count() > 100 {
                return Err(AppError::InvalidInput("Full name must be 1 to 100 characters".to_string()));
            }
            active.full_name = ActiveValue::Set(Some(full_name.to_string()));
        }

        if let Some(phone) = update.phone {
            let phone = phone.trim();
            let digits = phone.strip_prefix('+').unwrap_or(phone);
            if !(7..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(AppError::InvalidInput(format!("Invalid phone number: {}", phone)));
            }
            active.phone = ActiveValue::Set(Some(phone.to_string()));
        }

        active.updated_at = ActiveValue::Set(Utc::now());
        let profile = active.update(&self.db).await?;

        Ok(profile)
    }

    /// Switch the namespace every later request of this user reads and writes.
    pub async fn set_mode(&self, user_id: Uuid, mode: AccountMode) -> Result<profile::Model> {
        let profile = self.get(user_id).await?;
        if profile.account_mode == mode.as_str() {
            return Ok(profile);
        }

        let mut active: profile::ActiveModel = profile.into();
        active.account_mode = ActiveValue::Set(mode.to_string());
        active.updated_at = ActiveValue::Set(Utc::now());
        let profile = active.update(&self.db).await?;

        tracing::info!("User {} switched to {} mode", user_id, mode);
        Ok(profile)
    }

    pub async fn get_or_create_settings(&self, user_id: Uuid) -> Result<user_settings::Model> {
        if
            let Some(settings) = UserSettings::find()
                .filter(user_settings::Column::UserId.eq(user_id))
                .one(&self.db).await?
        {
            return Ok(settings);
        }

        self.create_settings(user_id).await
    }

    async fn create_settings(&self, user_id: Uuid) -> Result<user_settings::Model> {
        let now = Utc::now();
        let settings = user_settings::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            user_id: ActiveValue::Set(user_id),
            email_notifications: ActiveValue::Set(true),
            push_notifications: ActiveValue::Set(true),
            sms_notifications: ActiveValue::Set(false),
            transaction_alerts: ActiveValue::Set(true),
            hide_balance: ActiveValue::Set(false),
            discoverable: ActiveValue::Set(true),
            pin_hash: ActiveValue::Set(None),
            pin_enabled: ActiveValue::Set(false),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        UserSettings::insert(settings)
            .on_conflict(OnConflict::column(user_settings::Column::UserId).do_nothing().to_owned())
            .exec_without_returning(&self.db).await?;

        UserSettings::find()
            .filter(user_settings::Column::UserId.eq(user_id))
            .one(&self.db).await?
            .ok_or_else(|| AppError::Internal(format!("Settings for user {} vanished after insert", user_id)))
    }

    pub async fn update_settings(
        &self,
        user_id: Uuid,
        update: SettingsUpdate
    ) -> Result<user_settings::Model> {
        let settings = self.get_or_create_settings(user_id).await?;
        let mut active: user_settings::ActiveModel = settings.into();

        if let Some(value) = update.email_notifications {
            active.email_notifications = ActiveValue::Set(value);
        }
        if let Some(value) = update.push_notifications {
            active.push_notifications = ActiveValue::Set(value);
        }
        if let Some(value) = update.sms_notifications {
            active.sms_notifications = ActiveValue::Set(value);
        }
        if let Some(value) = update.transaction_alerts {
            active.transaction_alerts = ActiveValue::Set(value);
        }
        if let Some(value) = update.hide_balance {
            active.hide_balance = ActiveValue::Set(value);
        }
        if let Some(value) = update.discoverable {
            active.discoverable = ActiveValue::Set(value);
        }

        active.updated_at = ActiveValue::Set(Utc::now());
        let settings = active.update(&self.db).await?;

        Ok(settings)
    }

    /// Set or change the transaction PIN. Changing an enabled PIN needs the
    /// current one.
    pub async fn set_pin(&self, user_id: Uuid, pin: &str, current_pin: Option<&str>) -> Result<()> {
        validate_pin(pin)?;

        let settings = self.get_or_create_settings(user_id).await?;
        if settings.pin_enabled {
            check_pin(&settings, current_pin)?;
        }

        let salt = SaltString::generate(&mut OsRng);
        let pin_hash = Argon2::default()
            .hash_password(pin.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash PIN: {}", e)))?
            .to_string();

        let mut active: user_settings::ActiveModel = settings.into();
        active.pin_hash = ActiveValue::Set(Some(pin_hash));
        active.pin_enabled = ActiveValue::Set(true);
        active.updated_at = ActiveValue::Set(Utc::now());
        active.update(&self.db).await?;

        tracing::info!("Transaction PIN set for user {}", user_id);
        Ok(())
    }

    pub async fn disable_pin(&self, user_id: Uuid, current_pin: Option<&str>) -> Result<()> {
        let settings = self.get_or_create_settings(user_id).await?;
        if !settings.pin_enabled {
            return Ok(());
        }
        check_pin(&settings, current_pin)?;

        let mut active: user_settings::ActiveModel = settings.into();
        active.pin_enabled = ActiveValue::Set(false);
        active.pin_hash = ActiveValue::Set(None);
        active.updated_at = ActiveValue::Set(Utc::now());
        active.update(&self.db).await?;

        Ok(())
    }

    /// Passes when no PIN is enabled.
    pub async fn verify_pin(&self, user_id: Uuid, pin: Option<&str>) -> Result<()> {
        let settings = self.get_or_create_settings(user_id).await?;
        if !settings.pin_enabled {
            return Ok(());
        }
        check_pin(&settings, pin)
    }
}

fn validate_pin(pin: &str) -> Result<()> {
    if !(4..=6).contains(&pin.len()) || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidInput("PIN must be 4 to 6 digits".to_string()));
    }
    Ok(())
}

fn check_pin(settings: &user_settings::Model, pin: Option<&str>) -> Result<()> {
    let (Some(pin), Some(pin_hash)) = (pin, settings.pin_hash.as_deref()) else {
        return Err(AppError::InvalidPin);
    };

    let parsed_hash = PasswordHash::new(pin_hash).map_err(|e|
        AppError::Internal(format!("Invalid hash: {}", e))
    )?;

    Argon2::default()
        .verify_password(pin.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidPin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[tokio::test]
    async fn test_profile_created_once_in_demo_mode() {
        let db = test_utils::setup_db().await;
        let service = ProfileService::new(db);
        let user_id = Uuid::new_v4();

        let first = service.get_or_create(user_id, Some("ada@example.com")).await.unwrap();
        let second = service.get_or_create(user_id, None).await.unwrap();

        assert_eq!(first.account_mode, "demo");
        assert_eq!(first.kyc_status, "unverified");
        assert_eq!(second.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_concurrent_first_sight_keeps_first_row() {
        let db = test_utils::setup_db().await;
        let service = ProfileService::new(db);
        let user_id = Uuid::new_v4();

        let first = service.get_or_create(user_id, Some("ada@example.com")).await.unwrap();
        let late = service.create_profile(user_id, Some("other@example.com")).await.unwrap();
        assert_eq!(late.email, first.email);
        assert_eq!(late.created_at, first.created_at);

        let settings = service.get_or_create_settings(user_id).await.unwrap();
        let late_settings = service.create_settings(user_id).await.unwrap();
        assert_eq!(late_settings.id, settings.id);
    }

    #[tokio::test]
    async fn test_profile_update_validates_phone() {
        let db = test_utils::setup_db().await;
        let service = ProfileService::new(db);
        let user_id = test_utils::create_user(&service, AccountMode::Demo).await;

        let updated = service
            .update(user_id, ProfileUpdate {
                full_name: Some("  Ada Obi ".to_string()),
                phone: Some("+2348012345678".to_string()),
            }).await
            .unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Ada Obi"));

        let err = service
            .update(user_id, ProfileUpdate { full_name: None, phone: Some("12ab".to_string()) }).await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_pin_lifecycle() {
        let db = test_utils::setup_db().await;
        let service = ProfileService::new(db);
        let user_id = test_utils::create_user(&service, AccountMode::Demo).await;

        assert!(service.verify_pin(user_id, None).await.is_ok());

        service.set_pin(user_id, "1234", None).await.unwrap();
        assert!(service.verify_pin(user_id, Some("1234")).await.is_ok());
        assert!(matches!(service.verify_pin(user_id, Some("9999")).await, Err(AppError::InvalidPin)));
        assert!(matches!(service.verify_pin(user_id, None).await, Err(AppError::InvalidPin)));

        assert!(matches!(service.set_pin(user_id, "5678", Some("0000")).await, Err(AppError::InvalidPin)));
        service.set_pin(user_id, "5678", Some("1234")).await.unwrap();

        service.disable_pin(user_id, Some("5678")).await.unwrap();
        assert!(service.verify_pin(user_id, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_pin_format_rejected() {
        let db = test_utils::setup_db().await;
        let service = ProfileService::new(db);
        let user_id = test_utils::create_user(&service, AccountMode::Demo).await;

        assert!(service.set_pin(user_id, "12", None).await.is_err());
        assert!(service.set_pin(user_id, "12ab", None).await.is_err());
    }

    #[tokio::test]
    async fn test_settings_partial_update() {
        let db = test_utils::setup_db().await;
        let service = ProfileService::new(db);
        let user_id = test_utils::create_user(&service, AccountMode::Demo).await;

        let settings = service
            .update_settings(user_id, SettingsUpdate {
                hide_balance: Some(true),
                ..Default::default()
            }).await
            .unwrap();

        assert!(settings.hide_balance);
        assert!(settings.email_notifications);
        assert!(!settings.pin_enabled);
    }
}
