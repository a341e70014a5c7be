use sea_orm::entity::prelude::*;

/// Notification and display toggles. One row per user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    #[sea_orm(default_value = "false")]
    pub is_screen_on: bool,
    #[sea_orm(default_value = "true")]
    pub is_sound_on: bool,
    #[sea_orm(default_value = "false")]
    pub is_dnd_on: bool,
    pub default_sound_name: Option<String>,
    pub default_sound_url: Option<String>,
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
