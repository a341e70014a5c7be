use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, info, warn};

use super::{ActiveModel, Column, Entity, Model};
use crate::entities::user;
use crate::store::{ProfileChanges, ProfileStore, StoreError, StoreResult};

const USERNAME_TAKEN: &str = "Username already exists. Please enter a different username.";
const EMAIL_TAKEN: &str = "Email already exists. Please enter a different email.";

async fn check_identity<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    username: Option<&str>,
    email: Option<&str>,
) -> StoreResult<()> {
    if let Some(username) = username {
        let owner = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::Id.ne(user_id))
            .one(db)
            .await?;
        if owner.is_some() {
            warn!("User {} asked for username '{}' owned by someone else", user_id, username);
            return Err(StoreError::Conflict(USERNAME_TAKEN.to_string()));
        }
    }
    if let Some(email) = email {
        let owner = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::Id.ne(user_id))
            .one(db)
            .await?;
        if owner.is_some() {
            warn!("User {} asked for email '{}' owned by someone else", user_id, email);
            return Err(StoreError::Conflict(EMAIL_TAKEN.to_string()));
        }
    }
    Ok(())
}

/// A concurrent rename can still trip the unique index after the pre-check passed.
fn identity_update_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains("email") => {
            StoreError::Conflict(EMAIL_TAKEN.to_string())
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Conflict(USERNAME_TAKEN.to_string()),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl ProfileStore for DatabaseConnection {
    async fn find_profile(&self, user_id: i32) -> StoreResult<Option<Model>> {
        Ok(Entity::find()
            .filter(Column::UserId.eq(user_id))
            .one(self)
            .await?)
    }

    async fn get_profile(&self, user_id: i32) -> StoreResult<(user::Model, Model)> {
        let found = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .find_also_related(user::Entity)
            .one(self)
            .await?;
        match found {
            Some((profile, Some(owner))) => Ok((owner, profile)),
            _ => Err(StoreError::NotFound(
                "No profile found for the current user.".to_string(),
            )),
        }
    }

    async fn ensure_identity_available(
        &self,
        user_id: i32,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<()> {
        check_identity(self, user_id, username, email).await
    }

    async fn upsert_profile(
        &self,
        user_id: i32,
        changes: ProfileChanges,
    ) -> StoreResult<(user::Model, Model)> {
        let txn = self.begin().await?;

        check_identity(
            &txn,
            user_id,
            changes.username.as_deref(),
            changes.email.as_deref(),
        )
        .await?;

        let owner = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("User {} not found.", user_id)))?;

        let mut owner_active: user::ActiveModel = owner.clone().into();
        if let Some(username) = changes.username {
            owner_active.username = Set(username);
        }
        if let Some(email) = changes.email {
            owner_active.email = Set(email);
        }
        let owner = if owner_active.is_changed() {
            owner_active.update(&txn).await.map_err(identity_update_error)?
        } else {
            owner
        };

        let existing = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .one(&txn)
            .await?;
        let profile = match existing {
            Some(profile) => match changes.profile_picture {
                Some(picture) => {
                    debug!("Replacing picture of profile {}", profile.id);
                    let mut active: ActiveModel = profile.into();
                    active.profile_picture = Set(Some(picture));
                    active.update(&txn).await?
                }
                None => profile,
            },
            None => {
                debug!("Creating profile for user {}", user_id);
                ActiveModel {
                    user_id: Set(user_id),
                    profile_picture: Set(changes.profile_picture),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;
        info!("Profile of user {} saved", user_id);
        Ok((owner, profile))
    }
}
