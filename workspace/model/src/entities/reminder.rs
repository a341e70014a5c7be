use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use std::fmt;

mod store;

/// How often a reminder fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ReminderType {
    #[sea_orm(string_value = "Once")]
    Once,
    #[sea_orm(string_value = "Hourly")]
    Hourly,
    #[sea_orm(string_value = "Daily")]
    Daily,
    #[sea_orm(string_value = "Weekly")]
    Weekly,
    #[sea_orm(string_value = "Monthly")]
    Monthly,
    #[sea_orm(string_value = "Yearly")]
    Yearly,
}

/// A scheduled reminder owned by one user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reminders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    /// When the reminder first fires.
    pub reminder_date_time: DateTime<Utc>,
    #[sea_orm(default_value = "false")]
    pub repeat: bool,
    pub reminder_type: ReminderType,
    pub sound_name: Option<String>,
    pub sound_url: Option<String>,
    pub animation_name: Option<String>,
    pub animation_url: Option<String>,
    /// Seconds between breaks.
    pub break_time: Option<i32>,
    /// Length of a break in seconds.
    pub break_duration: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}
