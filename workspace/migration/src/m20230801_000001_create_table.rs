use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::Username, 150).unique_key())
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create auth_tokens table (one token per user)
        manager
            .create_table(
                Table::create()
                    .table(AuthTokens::Table)
                    .if_not_exists()
                    .col(string_len(AuthTokens::Key, 40).primary_key())
                    .col(integer(AuthTokens::UserId).unique_key())
                    .col(timestamp_with_time_zone(AuthTokens::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_token_user")
                            .from(AuthTokens::Table, AuthTokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create user_profiles table (one profile per user)
        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(pk_auto(UserProfiles::Id))
                    .col(integer(UserProfiles::UserId).unique_key())
                    .col(string_null(UserProfiles::ProfilePicture))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_profile_user")
                            .from(UserProfiles::Table, UserProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create reminders table
        manager
            .create_table(
                Table::create()
                    .table(Reminders::Table)
                    .if_not_exists()
                    .col(pk_auto(Reminders::Id))
                    .col(integer(Reminders::UserId))
                    .col(text(Reminders::Content))
                    .col(timestamp_with_time_zone(Reminders::ReminderDateTime))
                    .col(boolean(Reminders::Repeat).default(false))
                    .col(string_len(Reminders::ReminderType, 20))
                    .col(string_null(Reminders::SoundName))
                    .col(string_null(Reminders::SoundUrl))
                    .col(string_null(Reminders::AnimationName))
                    .col(string_null(Reminders::AnimationUrl))
                    .col(integer_null(Reminders::BreakTime))
                    .col(integer_null(Reminders::BreakDuration))
                    .col(timestamp_with_time_zone(Reminders::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reminder_user")
                            .from(Reminders::Table, Reminders::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reminders_user_id")
                    .table(Reminders::Table)
                    .col(Reminders::UserId)
                    .to_owned(),
            )
            .await?;

        // Create themes table (one theme per user)
        manager
            .create_table(
                Table::create()
                    .table(Themes::Table)
                    .if_not_exists()
                    .col(pk_auto(Themes::Id))
                    .col(integer(Themes::UserId).unique_key())
                    .col(string(Themes::ThemeName))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_theme_user")
                            .from(Themes::Table, Themes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create settings table (one row per user)
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(pk_auto(Settings::Id))
                    .col(integer(Settings::UserId).unique_key())
                    .col(boolean(Settings::IsScreenOn).default(false))
                    .col(boolean(Settings::IsSoundOn).default(true))
                    .col(boolean(Settings::IsDndOn).default(false))
                    .col(string_null(Settings::DefaultSoundName))
                    .col(string_null(Settings::DefaultSoundUrl))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_setting_user")
                            .from(Settings::Table, Settings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Themes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reminders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AuthTokens {
    Table,
    Key,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserProfiles {
    Table,
    Id,
    UserId,
    ProfilePicture,
}

#[derive(DeriveIden)]
enum Reminders {
    Table,
    Id,
    UserId,
    Content,
    ReminderDateTime,
    Repeat,
    ReminderType,
    SoundName,
    SoundUrl,
    AnimationName,
    AnimationUrl,
    BreakTime,
    BreakDuration,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Themes {
    Table,
    Id,
    UserId,
    ThemeName,
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    Id,
    UserId,
    IsScreenOn,
    IsSoundOn,
    IsDndOn,
    DefaultSoundName,
    DefaultSoundUrl,
}
