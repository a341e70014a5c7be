//! Update-or-create storage for the per-user Theme and Setting rows.
//!
//! Both tables carry a unique index on `user_id`; writes are a single
//! `INSERT ... ON CONFLICT (user_id) DO UPDATE` so a user never ends up with two rows.

use async_trait::async_trait;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tracing::{debug, info};

use super::{setting, theme};
use crate::store::{PreferenceStore, SettingsFields, StoreError, StoreResult};

#[async_trait]
impl PreferenceStore for DatabaseConnection {
    async fn get_theme(&self, user_id: i32) -> StoreResult<theme::Model> {
        theme::Entity::find()
            .filter(theme::Column::UserId.eq(user_id))
            .one(self)
            .await?
            .ok_or_else(|| StoreError::NotFound("No theme set for the current user.".to_string()))
    }

    async fn set_theme(&self, user_id: i32, theme_name: &str) -> StoreResult<theme::Model> {
        let row = theme::ActiveModel {
            user_id: Set(user_id),
            theme_name: Set(theme_name.to_string()),
            ..Default::default()
        };
        theme::Entity::insert(row)
            .on_conflict(
                OnConflict::column(theme::Column::UserId)
                    .update_column(theme::Column::ThemeName)
                    .to_owned(),
            )
            .exec(self)
            .await?;
        info!("Theme of user {} set to '{}'", user_id, theme_name);
        self.get_theme(user_id).await
    }

    async fn get_settings(&self, user_id: i32) -> StoreResult<setting::Model> {
        setting::Entity::find()
            .filter(setting::Column::UserId.eq(user_id))
            .one(self)
            .await?
            .ok_or_else(|| StoreError::NotFound("No settings found for the current user.".to_string()))
    }

    async fn set_settings(&self, user_id: i32, fields: SettingsFields) -> StoreResult<setting::Model> {
        debug!("Saving settings for user {}: {:?}", user_id, fields);
        let row = setting::ActiveModel {
            user_id: Set(user_id),
            is_screen_on: Set(fields.is_screen_on),
            is_sound_on: Set(fields.is_sound_on),
            is_dnd_on: Set(fields.is_dnd_on),
            default_sound_name: Set(fields.default_sound_name),
            default_sound_url: Set(fields.default_sound_url),
            ..Default::default()
        };
        setting::Entity::insert(row)
            .on_conflict(
                OnConflict::column(setting::Column::UserId)
                    .update_columns([
                        setting::Column::IsScreenOn,
                        setting::Column::IsSoundOn,
                        setting::Column::IsDndOn,
                        setting::Column::DefaultSoundName,
                        setting::Column::DefaultSoundUrl,
                    ])
                    .to_owned(),
            )
            .exec(self)
            .await?;
        info!("Settings of user {} saved", user_id);
        self.get_settings(user_id).await
    }
}
