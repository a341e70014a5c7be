use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use model::store::IdentityStore;
use tracing::{debug, trace, warn};

use crate::error::ApiError;
use crate::schemas::AppState;

/// Scheme word expected in `Authorization: Token <key>`.
pub const TOKEN_SCHEME: &str = "Token";

/// The caller, resolved from its token by [`require_token`].
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i32,
    pub token: String,
}

/// Extract the key from an `Authorization: Token <key>` header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(TOKEN_SCHEME) {
        return None;
    }
    let key = key.trim();
    (!key.is_empty()).then_some(key)
}

/// Rejects the request with 401 unless it carries a known token, and otherwise makes
/// [`AuthUser`] available as a request extension.
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(key) = token_from_headers(request.headers()).map(str::to_owned) else {
        warn!("Rejected {} {}: no token", request.method(), request.uri().path());
        return Err(ApiError::Auth(
            "Authentication credentials were not provided.".to_string(),
        ));
    };

    let user_id = match state.cache.get(&key).await {
        Some(user_id) => {
            trace!("Token resolved from cache for user {}", user_id);
            user_id
        }
        None => match state.db.user_for_token(&key).await? {
            Some(user) => {
                debug!("Token resolved from database for user {}", user.id);
                state.cache.insert(key.clone(), user.id).await;
                user.id
            }
            None => {
                warn!("Rejected {} {}: unknown token", request.method(), request.uri().path());
                return Err(ApiError::Auth("Invalid token.".to_string()));
            }
        },
    };

    request.extensions_mut().insert(AuthUser { user_id, token: key });
    Ok(next.run(request).await)
}
