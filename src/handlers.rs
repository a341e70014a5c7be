pub mod health;
pub mod preferences;
pub mod profile;
pub mod reminders;
pub mod users;
