use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::config::AppConfig;
use crate::handlers::{
    preferences::{SettingsRequest, SettingsResponse, ThemeRequest, ThemeResponse},
    profile::{ProfilePictureUpload, ProfileResponse, UpdateProfileRequest},
    reminders::{DeleteRemindersRequest, DeleteRemindersResponse, ReminderRequest, ReminderResponse, ReminderType},
    users::{LoginRequest, RegisterRequest, TokenResponse},
};
use crate::media::MediaStorage;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Token key to user id, in front of the `auth_tokens` table
    pub cache: Cache<String, i32>,
    /// Uploaded profile pictures
    pub media: MediaStorage,
    pub config: Arc<AppConfig>,
}

/// Outcome marker carried by every response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    /// The request was understood but refused (bad input, credentials, missing rows)
    Failed,
    /// The server failed to process the request
    Error,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Outcome marker
    pub resp: ResponseStatus,
    /// Response message
    pub message: String,
    /// Response data
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            resp: ResponseStatus::Success,
            message: message.into(),
            data,
        }
    }
}

/// Response without a payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub resp: ResponseStatus,
    pub message: String,
}

impl MessageResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            resp: ResponseStatus::Success,
            message: message.into(),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// `failed` for client errors, `error` for server errors
    pub resp: ResponseStatus,
    /// Human readable error message
    pub message: String,
    /// Error code
    pub code: String,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Registers the `Authorization: Token <key>` scheme referenced by protected paths.
pub struct TokenSecurity;

impl Modify for TokenSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "Token <key>, as returned by /api/v1/register or /api/v1/login",
                ))),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::register,
        crate::handlers::users::login,
        crate::handlers::users::logout,
        crate::handlers::reminders::get_reminders,
        crate::handlers::reminders::create_reminder,
        crate::handlers::reminders::update_reminder,
        crate::handlers::reminders::delete_reminder,
        crate::handlers::reminders::delete_reminders,
        crate::handlers::preferences::get_theme,
        crate::handlers::preferences::set_theme,
        crate::handlers::preferences::get_settings,
        crate::handlers::preferences::set_settings,
        crate::handlers::profile::get_profile,
        crate::handlers::profile::update_profile,
        crate::handlers::profile::upload_profile_picture,
    ),
    components(
        schemas(
            ResponseStatus,
            ApiResponse<ReminderResponse>,
            ApiResponse<Vec<ReminderResponse>>,
            ApiResponse<DeleteRemindersResponse>,
            ApiResponse<SettingsResponse>,
            ApiResponse<ProfileResponse>,
            ApiResponse<String>,
            MessageResponse,
            ErrorResponse,
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            ReminderRequest,
            ReminderResponse,
            ReminderType,
            DeleteRemindersRequest,
            DeleteRemindersResponse,
            ThemeRequest,
            ThemeResponse,
            SettingsRequest,
            SettingsResponse,
            UpdateProfileRequest,
            ProfileResponse,
            ProfilePictureUpload,
        )
    ),
    modifiers(&TokenSecurity),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and logout"),
        (name = "reminders", description = "Reminder CRUD endpoints"),
        (name = "preferences", description = "Theme and settings endpoints"),
        (name = "profile", description = "Profile and profile picture endpoints"),
    ),
    info(
        title = "Remindr API",
        description = "Backend for the Remindr mobile app: accounts, reminders, preferences and profile pictures",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
