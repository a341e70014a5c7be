use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::schemas::{ApiResponse, AppState, ResponseStatus};
use axum::{extract::State, response::Json, Extension};
use model::entities::setting;
use model::store::{PreferenceStore, SettingsFields};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for choosing a theme
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ThemeRequest {
    #[validate(length(min = 1, max = 100, message = "Theme must be 1 to 100 characters long."))]
    pub theme: String,
}

/// The caller's theme. Mobile clients read `theme` at the top level.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThemeResponse {
    pub resp: ResponseStatus,
    pub message: String,
    pub theme: String,
}

fn default_true() -> bool {
    true
}

/// Request body for saving settings. Omitted toggles fall back to their defaults.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    #[serde(default)]
    pub is_screen_on: bool,
    #[serde(default = "default_true")]
    #[schema(default = true)]
    pub is_sound_on: bool,
    #[serde(default)]
    pub is_dnd_on: bool,
    pub default_sound_name: Option<String>,
    pub default_sound_url: Option<String>,
}

impl From<SettingsRequest> for SettingsFields {
    fn from(request: SettingsRequest) -> Self {
        Self {
            is_screen_on: request.is_screen_on,
            is_sound_on: request.is_sound_on,
            is_dnd_on: request.is_dnd_on,
            default_sound_name: request.default_sound_name,
            default_sound_url: request.default_sound_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub is_screen_on: bool,
    pub is_sound_on: bool,
    pub is_dnd_on: bool,
    pub default_sound_name: Option<String>,
    pub default_sound_url: Option<String>,
}

impl From<setting::Model> for SettingsResponse {
    fn from(model: setting::Model) -> Self {
        Self {
            is_screen_on: model.is_screen_on,
            is_sound_on: model.is_sound_on,
            is_dnd_on: model.is_dnd_on,
            default_sound_name: model.default_sound_name,
            default_sound_url: model.default_sound_url,
        }
    }
}

/// Get the caller's theme
#[utoipa::path(
    get,
    path = "/api/v1/theme",
    tag = "preferences",
    responses(
        (status = 200, description = "Theme retrieved successfully", body = ThemeResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "No theme set yet", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn get_theme(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ThemeResponse>, ApiError> {
    trace!("Entering get_theme function");

    let theme = state.db.get_theme(auth.user_id).await?;

    debug!("Theme for user {} is '{}'", auth.user_id, theme.theme_name);
    Ok(Json(ThemeResponse {
        resp: ResponseStatus::Success,
        message: "Theme retrieved successfully.".to_string(),
        theme: theme.theme_name,
    }))
}

/// Set the caller's theme, replacing any previous choice
#[utoipa::path(
    post,
    path = "/api/v1/theme",
    tag = "preferences",
    request_body = ThemeRequest,
    responses(
        (status = 200, description = "Theme saved", body = ThemeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn set_theme(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(request): ValidJson<ThemeRequest>,
) -> Result<Json<ThemeResponse>, ApiError> {
    trace!("Entering set_theme function");

    let theme = state.db.set_theme(auth.user_id, &request.theme).await?;

    info!("Theme for user {} set to '{}'", auth.user_id, theme.theme_name);
    Ok(Json(ThemeResponse {
        resp: ResponseStatus::Success,
        message: "Theme set successfully.".to_string(),
        theme: theme.theme_name,
    }))
}

/// Get the caller's settings
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    tag = "preferences",
    responses(
        (status = 200, description = "Settings retrieved successfully", body = ApiResponse<SettingsResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "No settings saved yet", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<SettingsResponse>>, ApiError> {
    trace!("Entering get_settings function");

    let settings = state.db.get_settings(auth.user_id).await?;

    debug!("Retrieved settings row {}", settings.id);
    Ok(Json(ApiResponse::success(
        "Settings retrieved successfully.",
        SettingsResponse::from(settings),
    )))
}

/// Save the caller's settings, replacing any previous values
#[utoipa::path(
    post,
    path = "/api/v1/settings",
    tag = "preferences",
    request_body = SettingsRequest,
    responses(
        (status = 200, description = "Settings saved", body = ApiResponse<SettingsResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn set_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(request): ValidJson<SettingsRequest>,
) -> Result<Json<ApiResponse<SettingsResponse>>, ApiError> {
    trace!("Entering set_settings function");

    let settings = state.db.set_settings(auth.user_id, request.into()).await?;

    info!("Settings saved for user {}", auth.user_id);
    Ok(Json(ApiResponse::success(
        "Settings saved successfully.",
        SettingsResponse::from(settings),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_request_defaults() {
        let request: SettingsRequest = serde_json::from_str("{}").unwrap();
        assert!(!request.is_screen_on);
        assert!(request.is_sound_on);
        assert!(!request.is_dnd_on);
        assert!(request.default_sound_name.is_none());
    }
}
