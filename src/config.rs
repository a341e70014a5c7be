use anyhow::{Context, Result};
use moka::future::Cache;
use sea_orm::Database;
use std::{path::PathBuf, str::FromStr, sync::Arc, time::Duration};
use tracing::{debug, info};

use crate::media::MediaStorage;
use crate::schemas::AppState;

/// Prefix of the environment variables read by [`AppConfig::load`].
const ENV_PREFIX: &str = "REMINDR_";

/// Runtime configuration.
///
/// Built-in defaults are overridden by `REMINDR_*` environment variables (a `.env`
/// file is loaded first), and those in turn by CLI flags.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database URL, e.g. `sqlite://remindr.db?mode=rwc` or `postgresql://user:pw@host/db`
    pub database_url: String,
    /// Format: IP:PORT
    pub bind_address: String,
    /// Directory uploaded media is written to
    pub media_root: PathBuf,
    /// URL prefix under which `media_root` is published
    pub media_url: String,
    /// Scheme and host used for absolute media URLs. Falls back to the request's Host header.
    pub public_base_url: Option<String>,
    /// Upper bound for a profile picture upload body
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
    /// How long a resolved token stays in the in-process cache
    pub token_cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://remindr.db?mode=rwc".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
            media_root: PathBuf::from("media"),
            media_url: "/media/".to_string(),
            public_base_url: None,
            max_upload_bytes: 5 * 1024 * 1024,
            request_timeout_secs: 30,
            token_cache_ttl_secs: 300,
        }
    }
}

fn parse_var<T>(name: &str, value: String) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}{}: {:?}", ENV_PREFIX, name, value))
}

impl AppConfig {
    /// Load configuration from the defaults and the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|name| std::env::var(format!("{}{}", ENV_PREFIX, name)).ok())?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Build a configuration where `lookup(NAME)` supplies the value of `REMINDR_NAME`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = lookup("DATABASE_URL") {
            config.database_url = value;
        }
        if let Some(value) = lookup("BIND_ADDRESS") {
            config.bind_address = value;
        }
        if let Some(value) = lookup("MEDIA_ROOT") {
            config.media_root = PathBuf::from(value);
        }
        if let Some(value) = lookup("MEDIA_URL") {
            config.media_url = value;
        }
        if let Some(value) = lookup("PUBLIC_BASE_URL") {
            config.public_base_url = Some(value).filter(|v| !v.trim().is_empty());
        }
        if let Some(value) = lookup("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", value)?;
        }
        if let Some(value) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", value)?;
        }
        if let Some(value) = lookup("TOKEN_CACHE_TTL_SECS") {
            config.token_cache_ttl_secs = parse_var("TOKEN_CACHE_TTL_SECS", value)?;
        }
        Ok(config)
    }

    /// Apply command line overrides on top of the loaded configuration.
    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Build the token cache used by the auth middleware.
pub fn token_cache(config: &AppConfig) -> Cache<String, i32> {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(config.token_cache_ttl_secs))
        .build()
}

/// Initialize application state from the given configuration
pub async fn initialize_app_state(config: AppConfig) -> Result<AppState> {
    // Connect to database
    info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url).await?;

    let media = MediaStorage::new(&config.media_root);
    media.ensure_root().await?;
    info!("Storing media under {}", config.media_root.display());

    let cache = token_cache(&config);

    Ok(AppState {
        db,
        cache,
        media,
        config: Arc::new(config),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_overrides_replace_only_given_values() {
        let config = AppConfig::default().with_overrides(None, Some("127.0.0.1:8080".to_string()));
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.database_url, AppConfig::default().database_url);
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let vars = HashMap::from([
            ("MEDIA_ROOT", "/var/lib/remindr/media"),
            ("PUBLIC_BASE_URL", "https://api.example.com"),
            ("TOKEN_CACHE_TTL_SECS", " 5 "),
        ]);
        let config = AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();

        assert_eq!(config.media_root, PathBuf::from("/var/lib/remindr/media"));
        assert_eq!(config.public_base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.token_cache_ttl_secs, 5);
        assert_eq!(config.media_url, "/media/");
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = AppConfig::from_lookup(|name| {
            (name == "MAX_UPLOAD_BYTES").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("REMINDR_MAX_UPLOAD_BYTES"));
    }
}
