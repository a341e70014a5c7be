use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr, TransactionTrait,
};
use tracing::{debug, info, warn};

use super::{ActiveModel, Column, Entity, Model};
use crate::credentials::{generate_token_key, hash_password_blocking, verify_password_blocking};
use crate::entities::auth_token;
use crate::store::{IdentityStore, StoreError, StoreResult};

const USERNAME_TAKEN: &str = "Username already exists. Please enter a different username.";
const EMAIL_TAKEN: &str = "Email already exists. Please enter a different email.";
const BAD_CREDENTIALS: &str = "Invalid username or password.";

/// Maps a unique-constraint violation raised by a concurrent insert to the same
/// validation message the pre-check produces.
fn registration_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            if detail.contains("email") {
                StoreError::Validation(EMAIL_TAKEN.to_string())
            } else {
                StoreError::Validation(USERNAME_TAKEN.to_string())
            }
        }
        _ => StoreError::Database(err),
    }
}

fn new_token(user_id: i32) -> auth_token::ActiveModel {
    auth_token::ActiveModel {
        key: Set(generate_token_key()),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
    }
}

#[async_trait]
impl IdentityStore for DatabaseConnection {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> StoreResult<(Model, auth_token::Model)> {
        if Entity::find()
            .filter(Column::Username.eq(username))
            .one(self)
            .await?
            .is_some()
        {
            warn!("Registration rejected, username '{}' is taken", username);
            return Err(StoreError::Validation(USERNAME_TAKEN.to_string()));
        }
        if Entity::find()
            .filter(Column::Email.eq(email))
            .one(self)
            .await?
            .is_some()
        {
            warn!("Registration rejected, email '{}' is taken", email);
            return Err(StoreError::Validation(EMAIL_TAKEN.to_string()));
        }

        let password_hash = hash_password_blocking(password).await?;

        let txn = self.begin().await?;
        let user = ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(registration_error)?;
        let token = new_token(user.id).insert(&txn).await?;
        txn.commit().await?;

        info!("Registered user {} ({})", user.id, user.username);
        Ok((user, token))
    }

    async fn login(&self, username: &str, password: &str) -> StoreResult<auth_token::Model> {
        let Some(user) = Entity::find()
            .filter(Column::Username.eq(username))
            .one(self)
            .await?
        else {
            debug!("Login for unknown username '{}'", username);
            return Err(StoreError::Auth(BAD_CREDENTIALS.to_string()));
        };

        if !verify_password_blocking(password, &user.password_hash).await? {
            debug!("Login with wrong password for user {}", user.id);
            return Err(StoreError::Auth(BAD_CREDENTIALS.to_string()));
        }

        let existing = auth_token::Entity::find()
            .filter(auth_token::Column::UserId.eq(user.id))
            .one(self)
            .await?;
        let token = match existing {
            Some(token) => token,
            None => {
                debug!("Issuing a new token for user {}", user.id);
                new_token(user.id).insert(self).await?
            }
        };

        info!("User {} logged in", user.id);
        Ok(token)
    }

    async fn logout(&self, key: &str) -> StoreResult<()> {
        let result = auth_token::Entity::delete_by_id(key.to_string())
            .exec(self)
            .await?;
        debug!("Logout removed {} token(s)", result.rows_affected);
        Ok(())
    }

    async fn user_for_token(&self, key: &str) -> StoreResult<Option<Model>> {
        let found = auth_token::Entity::find_by_id(key.to_string())
            .find_also_related(Entity)
            .one(self)
            .await?;
        Ok(found.and_then(|(_, user)| user))
    }
}
