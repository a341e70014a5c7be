use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Select, Set,
    TransactionTrait,
};
use tracing::{debug, info};

use super::{ActiveModel, Column, Entity, Model};
use crate::store::{ReminderFields, ReminderStore, StoreError, StoreResult};

/// Ids bound per `IN (...)` list, well under SQLite's variable limit.
const DELETE_CHUNK_SIZE: usize = 500;

fn not_found(reminder_id: i32) -> StoreError {
    StoreError::NotFound(format!("Reminder {} not found.", reminder_id))
}

impl ActiveModel {
    /// Copies every mutable attribute from `fields` into the active model.
    fn apply(&mut self, fields: ReminderFields) {
        self.content = Set(fields.content);
        self.reminder_date_time = Set(fields.reminder_date_time);
        self.repeat = Set(fields.repeat);
        self.reminder_type = Set(fields.reminder_type);
        self.sound_name = Set(fields.sound_name);
        self.sound_url = Set(fields.sound_url);
        self.animation_name = Set(fields.animation_name);
        self.animation_url = Set(fields.animation_url);
        self.break_time = Set(fields.break_time);
        self.break_duration = Set(fields.break_duration);
    }
}

/// Selects a reminder only if it belongs to `user_id`.
fn owned_reminder(user_id: i32, reminder_id: i32) -> Select<Entity> {
    Entity::find()
        .filter(Column::Id.eq(reminder_id))
        .filter(Column::UserId.eq(user_id))
}

#[async_trait]
impl ReminderStore for DatabaseConnection {
    async fn list_reminders(&self, user_id: i32) -> StoreResult<Vec<Model>> {
        let reminders = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_asc(Column::Id)
            .all(self)
            .await?;
        debug!("User {} has {} reminders", user_id, reminders.len());
        Ok(reminders)
    }

    async fn create_reminder(&self, user_id: i32, fields: ReminderFields) -> StoreResult<Model> {
        let mut reminder = ActiveModel {
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        reminder.apply(fields);
        let reminder = reminder.insert(self).await?;
        info!("Created reminder {} for user {}", reminder.id, user_id);
        Ok(reminder)
    }

    async fn update_reminder(
        &self,
        user_id: i32,
        reminder_id: i32,
        fields: ReminderFields,
    ) -> StoreResult<Model> {
        let existing = owned_reminder(user_id, reminder_id)
            .one(self)
            .await?
            .ok_or_else(|| not_found(reminder_id))?;

        let mut reminder: ActiveModel = existing.into();
        reminder.apply(fields);
        let reminder = reminder.update(self).await?;
        info!("Updated reminder {} for user {}", reminder.id, user_id);
        Ok(reminder)
    }

    async fn delete_reminder(&self, user_id: i32, reminder_id: i32) -> StoreResult<()> {
        let result = Entity::delete_many()
            .filter(Column::Id.eq(reminder_id))
            .filter(Column::UserId.eq(user_id))
            .exec(self)
            .await?;
        if result.rows_affected == 0 {
            return Err(not_found(reminder_id));
        }
        info!("Deleted reminder {} for user {}", reminder_id, user_id);
        Ok(())
    }

    async fn delete_reminders(&self, user_id: i32, reminder_ids: &[i32]) -> StoreResult<u64> {
        if reminder_ids.is_empty() {
            return Ok(0);
        }
        let txn = self.begin().await?;
        let mut deleted = 0;
        for chunk in reminder_ids.chunks(DELETE_CHUNK_SIZE) {
            let result = Entity::delete_many()
                .filter(Column::UserId.eq(user_id))
                .filter(Column::Id.is_in(chunk.iter().copied()))
                .exec(&txn)
                .await?;
            deleted += result.rows_affected;
        }
        txn.commit().await?;

        info!(
            "Deleted {} of {} requested reminders for user {}",
            deleted,
            reminder_ids.len(),
            user_id
        );
        Ok(deleted)
    }
}
