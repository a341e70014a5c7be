use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;

use crate::entities::{auth_token, reminder, setting, theme, user, user_profile};

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Input rejected by a store rule (e.g. username already taken at registration).
    #[error("{0}")]
    Validation(String),

    /// Credentials did not match.
    #[error("{0}")]
    Auth(String),

    /// The requested row does not exist or belongs to another user.
    #[error("{0}")]
    NotFound(String),

    /// A unique identity field is owned by another user.
    #[error("{0}")]
    Conflict(String),

    /// Password hashing or verification failed.
    #[error("Credential error: {0}")]
    Credential(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The mutable attributes of a reminder, used for both create and full update.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderFields {
    pub content: String,
    pub reminder_date_time: DateTime<Utc>,
    pub repeat: bool,
    pub reminder_type: reminder::ReminderType,
    pub sound_name: Option<String>,
    pub sound_url: Option<String>,
    pub animation_name: Option<String>,
    pub animation_url: Option<String>,
    pub break_time: Option<i32>,
    pub break_duration: Option<i32>,
}

/// Notification and display toggles stored per user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsFields {
    pub is_screen_on: bool,
    pub is_sound_on: bool,
    pub is_dnd_on: bool,
    pub default_sound_name: Option<String>,
    pub default_sound_url: Option<String>,
}

/// Requested changes to a user's profile. `None` leaves the value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    /// Relative media path of a freshly stored picture.
    pub profile_picture: Option<String>,
}

/// User accounts and their opaque authentication tokens.
#[async_trait]
pub trait IdentityStore {
    /// Creates a user with a hashed password and issues a fresh token.
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> StoreResult<(user::Model, auth_token::Model)>;

    /// Checks credentials and returns the user's token, creating one if absent.
    async fn login(&self, username: &str, password: &str) -> StoreResult<auth_token::Model>;

    /// Removes the token. Removing an unknown token is not an error.
    async fn logout(&self, key: &str) -> StoreResult<()>;

    /// Resolves a token key to its owner by exact match.
    async fn user_for_token(&self, key: &str) -> StoreResult<Option<user::Model>>;
}

/// One profile row per user, holding an optional picture reference.
#[async_trait]
pub trait ProfileStore {
    async fn find_profile(&self, user_id: i32) -> StoreResult<Option<user_profile::Model>>;

    /// Returns the owner and the profile, or `NotFound` when no profile row exists.
    async fn get_profile(&self, user_id: i32) -> StoreResult<(user::Model, user_profile::Model)>;

    /// Fails with `Conflict` when another user already owns `username` or `email`.
    async fn ensure_identity_available(
        &self,
        user_id: i32,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<()>;

    /// Updates the identity fields on the user and creates or updates the profile row.
    async fn upsert_profile(
        &self,
        user_id: i32,
        changes: ProfileChanges,
    ) -> StoreResult<(user::Model, user_profile::Model)>;
}

/// Per-user reminders.
#[async_trait]
pub trait ReminderStore {
    async fn list_reminders(&self, user_id: i32) -> StoreResult<Vec<reminder::Model>>;

    async fn create_reminder(&self, user_id: i32, fields: ReminderFields) -> StoreResult<reminder::Model>;

    async fn update_reminder(
        &self,
        user_id: i32,
        reminder_id: i32,
        fields: ReminderFields,
    ) -> StoreResult<reminder::Model>;

    async fn delete_reminder(&self, user_id: i32, reminder_id: i32) -> StoreResult<()>;

    /// Deletes every listed reminder owned by the user; other ids are skipped.
    /// Returns the number of removed rows.
    async fn delete_reminders(&self, user_id: i32, reminder_ids: &[i32]) -> StoreResult<u64>;
}

/// Per-user Theme and Setting singletons.
#[async_trait]
pub trait PreferenceStore {
    async fn get_theme(&self, user_id: i32) -> StoreResult<theme::Model>;

    async fn set_theme(&self, user_id: i32, theme_name: &str) -> StoreResult<theme::Model>;

    async fn get_settings(&self, user_id: i32) -> StoreResult<setting::Model>;

    async fn set_settings(&self, user_id: i32, fields: SettingsFields) -> StoreResult<setting::Model>;
}
