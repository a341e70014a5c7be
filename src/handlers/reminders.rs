use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{lenient_bool, lenient_i32, utc_datetime, ValidJson, ValidPath};
use crate::schemas::{ApiResponse, AppState, MessageResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::{DateTime, Utc};
use model::entities::reminder;
use model::store::{ReminderFields, ReminderStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// How often a reminder fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ReminderType {
    Once,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<ReminderType> for reminder::ReminderType {
    fn from(value: ReminderType) -> Self {
        match value {
            ReminderType::Once => Self::Once,
            ReminderType::Hourly => Self::Hourly,
            ReminderType::Daily => Self::Daily,
            ReminderType::Weekly => Self::Weekly,
            ReminderType::Monthly => Self::Monthly,
            ReminderType::Yearly => Self::Yearly,
        }
    }
}

impl From<reminder::ReminderType> for ReminderType {
    fn from(value: reminder::ReminderType) -> Self {
        match value {
            reminder::ReminderType::Once => Self::Once,
            reminder::ReminderType::Hourly => Self::Hourly,
            reminder::ReminderType::Daily => Self::Daily,
            reminder::ReminderType::Weekly => Self::Weekly,
            reminder::ReminderType::Monthly => Self::Monthly,
            reminder::ReminderType::Yearly => Self::Yearly,
        }
    }
}

/// Request body for creating or replacing a reminder
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    #[validate(length(min = 1, message = "Content may not be blank."))]
    pub content: String,
    /// ISO 8601 timestamp of the first occurrence, UTC when no offset is given
    #[serde(deserialize_with = "utc_datetime")]
    pub reminder_date_time: DateTime<Utc>,
    /// Boolean, or a form-style string such as `"true"`
    #[serde(default, deserialize_with = "lenient_bool")]
    pub repeat: bool,
    pub reminder_type: ReminderType,
    pub sound_name: Option<String>,
    pub sound_url: Option<String>,
    pub animation_name: Option<String>,
    pub animation_url: Option<String>,
    /// Seconds between breaks, as a number or numeric string
    #[serde(default, deserialize_with = "lenient_i32")]
    #[validate(range(min = 0, message = "Break time may not be negative."))]
    pub break_time: Option<i32>,
    /// Break length in seconds, as a number or numeric string
    #[serde(default, deserialize_with = "lenient_i32")]
    #[validate(range(min = 0, message = "Break duration may not be negative."))]
    pub break_duration: Option<i32>,
}

impl From<ReminderRequest> for ReminderFields {
    fn from(request: ReminderRequest) -> Self {
        Self {
            content: request.content,
            reminder_date_time: request.reminder_date_time,
            repeat: request.repeat,
            reminder_type: request.reminder_type.into(),
            sound_name: request.sound_name,
            sound_url: request.sound_url,
            animation_name: request.animation_name,
            animation_url: request.animation_url,
            break_time: request.break_time,
            break_duration: request.break_duration,
        }
    }
}

/// Reminder response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderResponse {
    pub id: i32,
    pub content: String,
    pub reminder_date_time: DateTime<Utc>,
    pub repeat: bool,
    pub reminder_type: ReminderType,
    pub sound_name: Option<String>,
    pub sound_url: Option<String>,
    pub animation_name: Option<String>,
    pub animation_url: Option<String>,
    pub break_time: Option<i32>,
    pub break_duration: Option<i32>,
}

impl From<reminder::Model> for ReminderResponse {
    fn from(model: reminder::Model) -> Self {
        Self {
            id: model.id,
            content: model.content,
            reminder_date_time: model.reminder_date_time,
            repeat: model.repeat,
            reminder_type: model.reminder_type.into(),
            sound_name: model.sound_name,
            sound_url: model.sound_url,
            animation_name: model.animation_name,
            animation_url: model.animation_url,
            break_time: model.break_time,
            break_duration: model.break_duration,
        }
    }
}

/// Request body for deleting several reminders at once
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct DeleteRemindersRequest {
    pub reminder_ids: Vec<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteRemindersResponse {
    /// Number of reminders removed
    pub deleted: u64,
}

/// List the caller's reminders
#[utoipa::path(
    get,
    path = "/api/v1/reminders",
    tag = "reminders",
    responses(
        (status = 200, description = "Reminders retrieved successfully", body = ApiResponse<Vec<ReminderResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn get_reminders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<ReminderResponse>>>, ApiError> {
    trace!("Entering get_reminders function");

    let reminders = state.db.list_reminders(auth.user_id).await?;
    let count = reminders.len();
    debug!("Retrieved {} reminders from database", count);

    let data: Vec<ReminderResponse> = reminders.into_iter().map(ReminderResponse::from).collect();

    info!("Successfully retrieved {} reminders", count);
    Ok(Json(ApiResponse::success("Reminders retrieved successfully.", data)))
}

/// Create a reminder
#[utoipa::path(
    post,
    path = "/api/v1/reminders",
    tag = "reminders",
    request_body = ReminderRequest,
    responses(
        (status = 201, description = "Reminder created successfully", body = ApiResponse<ReminderResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth, request), fields(user_id = auth.user_id))]
pub async fn create_reminder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(request): ValidJson<ReminderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReminderResponse>>), ApiError> {
    trace!("Entering create_reminder function");
    debug!(
        "Creating {:?} reminder at {}",
        request.reminder_type, request.reminder_date_time
    );

    let created = state.db.create_reminder(auth.user_id, request.into()).await?;

    info!("Reminder created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Reminder created successfully.",
            ReminderResponse::from(created),
        )),
    ))
}

/// Replace every field of a reminder
#[utoipa::path(
    put,
    path = "/api/v1/reminders/{reminder_id}",
    tag = "reminders",
    params(
        ("reminder_id" = i32, Path, description = "Reminder ID"),
    ),
    request_body = ReminderRequest,
    responses(
        (status = 200, description = "Reminder updated successfully", body = ApiResponse<ReminderResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Reminder not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth, request), fields(user_id = auth.user_id))]
pub async fn update_reminder(
    ValidPath(reminder_id): ValidPath<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(request): ValidJson<ReminderRequest>,
) -> Result<Json<ApiResponse<ReminderResponse>>, ApiError> {
    trace!("Entering update_reminder function for reminder_id: {}", reminder_id);

    let updated = state
        .db
        .update_reminder(auth.user_id, reminder_id, request.into())
        .await
        .inspect_err(|e| warn!("Update of reminder {} failed: {}", reminder_id, e))?;

    info!("Reminder {} updated successfully", updated.id);
    Ok(Json(ApiResponse::success(
        "Reminder updated successfully.",
        ReminderResponse::from(updated),
    )))
}

/// Delete a reminder
#[utoipa::path(
    delete,
    path = "/api/v1/reminders/{reminder_id}",
    tag = "reminders",
    params(
        ("reminder_id" = i32, Path, description = "Reminder ID"),
    ),
    responses(
        (status = 200, description = "Reminder deleted successfully", body = MessageResponse),
        (status = 400, description = "Invalid reminder id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Reminder not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn delete_reminder(
    ValidPath(reminder_id): ValidPath<i32>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MessageResponse>, ApiError> {
    trace!("Entering delete_reminder function for reminder_id: {}", reminder_id);

    state
        .db
        .delete_reminder(auth.user_id, reminder_id)
        .await
        .inspect_err(|e| warn!("Deletion of reminder {} failed: {}", reminder_id, e))?;

    info!("Reminder {} deleted successfully", reminder_id);
    Ok(Json(MessageResponse::success("Reminder deleted successfully.")))
}

/// Delete every listed reminder the caller owns
///
/// Ids that do not exist or belong to someone else are skipped.
#[utoipa::path(
    post,
    path = "/api/v1/reminders/delete",
    tag = "reminders",
    request_body = DeleteRemindersRequest,
    responses(
        (status = 200, description = "Reminders deleted", body = ApiResponse<DeleteRemindersResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn delete_reminders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(request): ValidJson<DeleteRemindersRequest>,
) -> Result<Json<ApiResponse<DeleteRemindersResponse>>, ApiError> {
    trace!("Entering delete_reminders function");
    debug!("Deleting reminders {:?}", request.reminder_ids);

    let deleted = state
        .db
        .delete_reminders(auth.user_id, &request.reminder_ids)
        .await?;

    info!(
        "Deleted {} of {} requested reminders",
        deleted,
        request.reminder_ids.len()
    );
    Ok(Json(ApiResponse::success(
        "Reminders deleted successfully.",
        DeleteRemindersResponse { deleted },
    )))
}
