use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::schemas::{AppState, MessageResponse, ResponseStatus};
use axum::{extract::State, http::StatusCode, response::Json, Extension};
use model::store::IdentityStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Request body for registering a new user
#[derive(Deserialize, Serialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// 150 characters or fewer. Letters, digits and @/./+/-/_ only.
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1 to 150 characters long."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password may not be blank."))]
    pub password: String,
}

/// Request body for logging in
#[derive(Deserialize, Serialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username may not be blank."))]
    pub username: String,
    #[validate(length(min = 1, message = "Password may not be blank."))]
    pub password: String,
}

/// Response carrying the caller's opaque token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub resp: ResponseStatus,
    pub message: String,
    /// Send back as `Authorization: Token <token>`
    pub token: String,
}

pub(crate) fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        Ok(())
    } else {
        let mut error = ValidationError::new("username_charset");
        error.message = Some(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        );
        Err(error)
    }
}

/// Register a new user and issue its token
#[utoipa::path(
    post,
    path = "/api/v1/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = TokenResponse),
        (status = 400, description = "Invalid input or username/email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    trace!("Entering register function");
    debug!("Registering user with email: {}", request.email);

    let (user, token) = state
        .db
        .register(&request.username, &request.email, &request.password)
        .await
        .inspect_err(|e| warn!("Registration of '{}' refused: {}", request.username, e))?;

    info!("User registered successfully with ID: {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            resp: ResponseStatus::Success,
            message: "User registered successfully.".to_string(),
            token: token.key,
        }),
    ))
}

/// Log in and return the user's token
#[utoipa::path(
    post,
    path = "/api/v1/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid username or password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    trace!("Entering login function");

    let token = state
        .db
        .login(&request.username, &request.password)
        .await
        .inspect_err(|e| warn!("Login for '{}' refused: {}", request.username, e))?;

    state.cache.insert(token.key.clone(), token.user_id).await;
    info!("User {} logged in", token.user_id);
    Ok(Json(TokenResponse {
        resp: ResponseStatus::Success,
        message: "Logged in successfully.".to_string(),
        token: token.key,
    }))
}

/// Log out, revoking the caller's token
///
/// Revoking is idempotent in storage, but the token is gone afterwards, so repeating
/// the call with it is rejected with 401.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Missing, invalid or already revoked token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MessageResponse>, ApiError> {
    trace!("Entering logout function");

    state.db.logout(&auth.token).await?;
    state.cache.invalidate(&auth.token).await;

    info!("User {} logged out", auth.user_id);
    Ok(Json(MessageResponse::success("Logged out successfully.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("jane.doe+1@mail_x-y").is_ok());
        assert!(validate_username("jane doe").is_err());
        assert!(validate_username("jane/doe").is_err());

        let request = RegisterRequest {
            username: String::new(),
            email: "not-an-email".to_string(),
            password: String::new(),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}
