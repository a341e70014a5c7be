//! This file serves as the root for all SeaORM entity modules.
//! Every row except `users` is scoped to exactly one user through `user_id`.

pub mod auth_token;
pub mod reminder;
pub mod setting;
pub mod theme;
pub mod user;
pub mod user_profile;

mod preferences;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::auth_token::Entity as AuthToken;
    pub use super::reminder::Entity as Reminder;
    pub use super::setting::Entity as Setting;
    pub use super::theme::Entity as Theme;
    pub use super::user::Entity as User;
    pub use super::user_profile::Entity as UserProfile;
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
        PaginatorTrait, QueryFilter,
    };

    use super::*;
    use crate::store::{
        IdentityStore, PreferenceStore, ProfileChanges, ProfileStore, ReminderFields,
        ReminderStore, SettingsFields, StoreError,
    };
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        // Connect to the SQLite database
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn register(db: &DatabaseConnection, username: &str) -> (user::Model, auth_token::Model) {
        db.register(username, &format!("{}@example.com", username), "secret")
            .await
            .expect("registration failed")
    }

    fn stretch_break() -> ReminderFields {
        ReminderFields {
            content: "Stretch Break: Stretch Those Limbs!".to_string(),
            reminder_date_time: Utc.with_ymd_and_hms(2023, 8, 9, 11, 17, 0).unwrap(),
            repeat: true,
            reminder_type: reminder::ReminderType::Weekly,
            sound_name: Some("Bubbles".to_string()),
            sound_url: Some("./assets/sounds/cartoon-bubbles.mp3".to_string()),
            animation_name: Some("Stretch Limbs".to_string()),
            animation_url: Some("./assets/images/breaks/stretch-limbs.jpg".to_string()),
            break_time: Some(600),
            break_duration: Some(300),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username() -> Result<(), DbErr> {
        let db = setup_db().await?;
        register(&db, "johndoe").await;

        let second = db.register("johndoe", "other@example.com", "doe").await;
        match second {
            Err(StoreError::Validation(message)) => assert!(message.contains("Username already exists")),
            other => panic!("expected validation error, got {:?}", other),
        }

        let duplicate_email = db.register("johnny", "johndoe@example.com", "doe").await;
        assert!(matches!(duplicate_email, Err(StoreError::Validation(_))));

        assert_eq!(User::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_hashes_password() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let (user, token) = register(&db, "janedoe").await;

        assert_ne!(user.password_hash, "secret");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert_eq!(token.user_id, user.id);
        assert_eq!(token.key.len(), 40);
        Ok(())
    }

    #[tokio::test]
    async fn test_login_returns_existing_token() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let (_, registered) = register(&db, "janedoe").await;

        let token = db.login("janedoe", "secret").await.expect("login failed");
        assert_eq!(token.key, registered.key);

        let wrong_password = db.login("janedoe", "nope").await;
        assert!(matches!(wrong_password, Err(StoreError::Auth(_))));

        let unknown_user = db.login("nobody", "secret").await;
        assert!(matches!(unknown_user, Err(StoreError::Auth(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_and_login_reissues() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let (user, token) = register(&db, "janedoe").await;

        let resolved = db.user_for_token(&token.key).await.expect("lookup failed");
        assert_eq!(resolved.map(|u| u.id), Some(user.id));

        db.logout(&token.key).await.expect("logout failed");
        db.logout(&token.key).await.expect("second logout failed");
        assert!(db.user_for_token(&token.key).await.expect("lookup failed").is_none());

        let fresh = db.login("janedoe", "secret").await.expect("login failed");
        assert_ne!(fresh.key, token.key);
        assert_eq!(AuthToken::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_reminders_are_scoped_to_owner() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let (jane, _) = register(&db, "jane").await;
        let (john, _) = register(&db, "john").await;

        let created = db.create_reminder(jane.id, stretch_break()).await.expect("create failed");
        assert_eq!(created.to_string(), "Stretch Break: Stretch Those Limbs!");

        let janes = db.list_reminders(jane.id).await.expect("list failed");
        assert_eq!(janes.len(), 1);
        assert_eq!(janes[0].id, created.id);
        assert!(db.list_reminders(john.id).await.expect("list failed").is_empty());

        let mut changes = stretch_break();
        changes.content = "Drink water".to_string();
        changes.repeat = false;
        let hijack = db.update_reminder(john.id, created.id, changes.clone()).await;
        assert!(matches!(hijack, Err(StoreError::NotFound(_))));

        let updated = db
            .update_reminder(jane.id, created.id, changes)
            .await
            .expect("update failed");
        assert_eq!(updated.content, "Drink water");
        assert!(!updated.repeat);

        assert!(matches!(
            db.delete_reminder(john.id, created.id).await,
            Err(StoreError::NotFound(_))
        ));
        db.delete_reminder(jane.id, created.id).await.expect("delete failed");
        assert!(matches!(
            db.delete_reminder(jane.id, created.id).await,
            Err(StoreError::NotFound(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_reminder_is_not_found() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let (jane, _) = register(&db, "jane").await;

        let result = db.update_reminder(jane.id, 999, stretch_break()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_reminders_only_touches_callers_rows() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let (jane, _) = register(&db, "jane").await;
        let (john, _) = register(&db, "john").await;

        let first = db.create_reminder(jane.id, stretch_break()).await.expect("create failed");
        let second = db.create_reminder(jane.id, stretch_break()).await.expect("create failed");
        let johns = db.create_reminder(john.id, stretch_break()).await.expect("create failed");
        let kept = db.create_reminder(jane.id, stretch_break()).await.expect("create failed");

        let deleted = db
            .delete_reminders(jane.id, &[first.id, second.id, johns.id, 4242])
            .await
            .expect("bulk delete failed");
        assert_eq!(deleted, 2);

        let remaining: Vec<i32> = db
            .list_reminders(jane.id)
            .await
            .expect("list failed")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(remaining, vec![kept.id]);
        assert_eq!(db.list_reminders(john.id).await.expect("list failed").len(), 1);

        assert_eq!(db.delete_reminders(jane.id, &[]).await.expect("empty delete failed"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_reminders_with_more_ids_than_sql_variables() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let (jane, _) = register(&db, "jane").await;

        let first = db.create_reminder(jane.id, stretch_break()).await.expect("create failed");
        let last = db.create_reminder(jane.id, stretch_break()).await.expect("create failed");

        let mut ids: Vec<i32> = (10_000..50_000).collect();
        ids.insert(0, first.id);
        ids.push(last.id);

        let deleted = db
            .delete_reminders(jane.id, &ids)
            .await
            .expect("bulk delete failed");
        assert_eq!(deleted, 2);
        assert!(db.list_reminders(jane.id).await.expect("list failed").is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_theme_keeps_single_row() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let (jane, _) = register(&db, "jane").await;

        assert!(matches!(db.get_theme(jane.id).await, Err(StoreError::NotFound(_))));

        db.set_theme(jane.id, "Sanguine").await.expect("set failed");
        let latest = db.set_theme(jane.id, "Midnight").await.expect("set failed");
        assert_eq!(latest.theme_name, "Midnight");

        let rows = Theme::find()
            .filter(theme::Column::UserId.eq(jane.id))
            .count(&db)
            .await?;
        assert_eq!(rows, 1);
        assert_eq!(db.get_theme(jane.id).await.expect("get failed").theme_name, "Midnight");
        Ok(())
    }

    #[tokio::test]
    async fn test_set_settings_overwrites() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let (jane, _) = register(&db, "jane").await;

        let first = SettingsFields {
            is_screen_on: true,
            is_sound_on: false,
            is_dnd_on: true,
            default_sound_name: Some("Chime".to_string()),
            default_sound_url: Some("./assets/sounds/chime.mp3".to_string()),
        };
        db.set_settings(jane.id, first).await.expect("set failed");

        let second = SettingsFields {
            is_screen_on: false,
            is_sound_on: true,
            is_dnd_on: false,
            default_sound_name: Some("Bell".to_string()),
            default_sound_url: None,
        };
        let saved = db.set_settings(jane.id, second).await.expect("set failed");
        assert!(saved.is_sound_on);
        assert_eq!(saved.default_sound_name.as_deref(), Some("Bell"));
        assert_eq!(saved.default_sound_url, None);
        assert_eq!(Setting::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_profile_upsert_and_conflicts() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let (jane, _) = register(&db, "jane").await;
        register(&db, "john").await;

        assert!(matches!(db.get_profile(jane.id).await, Err(StoreError::NotFound(_))));

        let taken = db
            .upsert_profile(
                jane.id,
                ProfileChanges {
                    username: Some("john".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(taken, Err(StoreError::Conflict(_))));
        assert!(db.find_profile(jane.id).await.expect("lookup failed").is_none());

        let (owner, profile) = db
            .upsert_profile(
                jane.id,
                ProfileChanges {
                    username: Some("jane_doe".to_string()),
                    email: Some("jane@example.org".to_string()),
                    profile_picture: Some("profile_pictures/a.png".to_string()),
                },
            )
            .await
            .expect("upsert failed");
        assert_eq!(owner.username, "jane_doe");
        assert_eq!(profile.profile_picture.as_deref(), Some("profile_pictures/a.png"));

        let (_, replaced) = db
            .upsert_profile(
                jane.id,
                ProfileChanges {
                    profile_picture: Some("profile_pictures/b.png".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("upsert failed");
        assert_eq!(replaced.id, profile.id);
        assert_eq!(replaced.profile_picture.as_deref(), Some("profile_pictures/b.png"));
        assert_eq!(UserProfile::find().count(&db).await?, 1);

        let (owner, fetched) = db.get_profile(jane.id).await.expect("get failed");
        assert_eq!(owner.email, "jane@example.org");
        assert_eq!(fetched, replaced);

        // Keeping your own username is not a conflict.
        db.ensure_identity_available(jane.id, Some("jane_doe"), Some("jane@example.org"))
            .await
            .expect("own identity reported as taken");
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let (jane, _) = register(&db, "jane").await;
        db.create_reminder(jane.id, stretch_break()).await.expect("create failed");
        db.set_theme(jane.id, "Sanguine").await.expect("set failed");

        User::delete_by_id(jane.id).exec(&db).await?;

        assert_eq!(Reminder::find().count(&db).await?, 0);
        assert_eq!(Theme::find().count(&db).await?, 0);
        assert_eq!(AuthToken::find().count(&db).await?, 0);
        Ok(())
    }
}
