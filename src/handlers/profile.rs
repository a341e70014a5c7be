use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{FormData, ValidJson};
use crate::handlers::users::validate_username;
use crate::media::absolute_url;
use crate::schemas::{ApiResponse, AppState};
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::{header::HOST, HeaderMap, StatusCode},
    response::Json,
    Extension,
};
use model::entities::{user, user_profile};
use model::store::{ProfileChanges, ProfileStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidateEmail};

/// Request body for changing username and/or email
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1 to 150 characters long."),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
}

/// Multipart form accepted by the picture upload endpoint
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ProfilePictureUpload {
    /// The image file; its content type must be `image/*`
    #[schema(value_type = String, format = Binary)]
    pub profile_picture: Vec<u8>,
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
    /// Absolute URL of the picture, or null when none was uploaded
    pub profile_picture: Option<String>,
}

/// Scheme and host media URLs are built from.
fn public_base(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.public_base_url {
        return base.clone();
    }
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{}", host)
}

fn profile_response(
    state: &AppState,
    headers: &HeaderMap,
    owner: user::Model,
    profile: user_profile::Model,
) -> ProfileResponse {
    let base = public_base(state, headers);
    ProfileResponse {
        username: owner.username,
        email: owner.email,
        profile_picture: profile
            .profile_picture
            .map(|name| absolute_url(&base, &state.config.media_url, &name)),
    }
}

struct PictureFile {
    file_name: Option<String>,
    content_type: String,
    bytes: Bytes,
}

#[derive(Default)]
struct UploadForm {
    picture: Option<PictureFile>,
    username: Option<String>,
    email: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            match field.name() {
                Some("profile_picture") => {
                    let file_name = field.file_name().map(str::to_owned);
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_owned();
                    let bytes = field.bytes().await?;
                    form.picture = Some(PictureFile {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                Some("username") => form.username = non_blank(field.text().await?),
                Some("email") => form.email = non_blank(field.text().await?),
                other => debug!("Ignoring multipart field {:?}", other),
            }
        }
        Ok(form)
    }

    fn validate(&self) -> Result<&PictureFile, ApiError> {
        let picture = self
            .picture
            .as_ref()
            .ok_or_else(|| ApiError::Validation("No profile_picture file was submitted.".to_string()))?;
        if !picture.content_type.starts_with("image/") {
            return Err(ApiError::Validation(format!(
                "Upload a valid image. Content type {} is not accepted.",
                picture.content_type
            )));
        }
        if picture.bytes.is_empty() {
            return Err(ApiError::Validation("The submitted file is empty.".to_string()));
        }
        if let Some(username) = &self.username {
            if username.chars().count() > 150 {
                return Err(ApiError::Validation(
                    "Username must be 1 to 150 characters long.".to_string(),
                ));
            }
            validate_username(username).map_err(|e| {
                ApiError::Validation(e.message.map(|m| m.into_owned()).unwrap_or_default())
            })?;
        }
        if let Some(email) = &self.email {
            if !email.validate_email() {
                return Err(ApiError::Validation("Enter a valid email address.".to_string()));
            }
        }
        Ok(picture)
    }
}

fn non_blank(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "profile",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "No profile found for the current user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth, headers), fields(user_id = auth.user_id))]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    trace!("Entering get_profile function");

    let (owner, profile) = state
        .db
        .get_profile(auth.user_id)
        .await
        .inspect_err(|e| warn!("Profile lookup for user {} failed: {}", auth.user_id, e))?;

    debug!("Retrieved profile {} for user {}", profile.id, owner.id);
    Ok(Json(ApiResponse::success(
        "Profile retrieved successfully.",
        profile_response(&state, &headers, owner, profile),
    )))
}

/// Change the caller's username and/or email, creating the profile if needed
#[utoipa::path(
    post,
    path = "/api/v1/profile",
    tag = "profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<ProfileResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 409, description = "Username or email belongs to another user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth, headers), fields(user_id = auth.user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    headers: HeaderMap,
    ValidJson(request): ValidJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    trace!("Entering update_profile function");

    let changes = ProfileChanges {
        username: request.username,
        email: request.email,
        profile_picture: None,
    };
    let (owner, profile) = state
        .db
        .upsert_profile(auth.user_id, changes)
        .await
        .inspect_err(|e| warn!("Profile update for user {} refused: {}", auth.user_id, e))?;

    info!("Profile updated for user {}", owner.id);
    Ok(Json(ApiResponse::success(
        "Updated successfully.",
        profile_response(&state, &headers, owner, profile),
    )))
}

/// Upload a new profile picture, replacing the previous one
///
/// The old file is removed before the new one is written. The two file operations
/// are not part of the database transaction.
#[utoipa::path(
    post,
    path = "/api/v1/profile/upload",
    tag = "profile",
    request_body(content = ProfilePictureUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image uploaded; data holds its absolute URL", body = ApiResponse<String>),
        (status = 400, description = "Missing or invalid file", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 409, description = "Username or email belongs to another user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth, headers, multipart), fields(user_id = auth.user_id))]
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    headers: HeaderMap,
    FormData(multipart): FormData,
) -> Result<(StatusCode, Json<ApiResponse<String>>), ApiError> {
    trace!("Entering upload_profile_picture function");

    let form = UploadForm::read(multipart).await?;
    let picture = form.validate()?;
    debug!(
        "Received {} byte {} upload",
        picture.bytes.len(),
        picture.content_type
    );

    state
        .db
        .ensure_identity_available(auth.user_id, form.username.as_deref(), form.email.as_deref())
        .await
        .inspect_err(|e| warn!("Upload for user {} refused: {}", auth.user_id, e))?;

    if let Some(old) = state
        .db
        .find_profile(auth.user_id)
        .await?
        .and_then(|profile| profile.profile_picture)
    {
        debug!("Discarding previous picture {}", old);
        state.media.remove(&old).await?;
    }

    let name = state
        .media
        .store_profile_picture(picture.file_name.as_deref(), &picture.content_type, &picture.bytes)
        .await?;

    let changes = ProfileChanges {
        username: form.username.clone(),
        email: form.email.clone(),
        profile_picture: Some(name.clone()),
    };
    if let Err(e) = state.db.upsert_profile(auth.user_id, changes).await {
        error!("Saving profile for user {} failed, removing {}", auth.user_id, name);
        if let Err(io) = state.media.remove(&name).await {
            warn!("Could not remove orphaned upload {}: {}", name, io);
        }
        return Err(e.into());
    }

    let url = absolute_url(&public_base(&state, &headers), &state.config.media_url, &name);
    info!("Profile picture for user {} stored at {}", auth.user_id, name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Image uploaded successfully.", url)),
    ))
}
