#[cfg(test)]
pub mod test_utils {
    use crate::config::{token_cache, AppConfig};
    use crate::media::MediaStorage;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
    use axum_test::TestServer;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Base URL absolute media links are built from in tests.
    pub const TEST_BASE_URL: &str = "http://testserver";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing, with media written under `media_dir`
    pub async fn setup_test_app_state(media_dir: &TempDir) -> AppState {
        let db = setup_test_db().await;

        let config = AppConfig {
            media_root: media_dir.path().to_path_buf(),
            public_base_url: Some(TEST_BASE_URL.to_string()),
            ..AppConfig::default()
        };

        let media = MediaStorage::new(&config.media_root);
        media.ensure_root().await.expect("Failed to create media root");

        AppState {
            db,
            cache: token_cache(&config),
            media,
            config: Arc::new(config),
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr) // Output to stderr, which is captured by tests
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// A running test server plus the state and media directory behind it.
    pub struct TestApp {
        pub server: TestServer,
        pub state: AppState,
        pub media_dir: TempDir,
        _tracing: tracing::subscriber::DefaultGuard,
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> TestApp {
        let tracing = init_test_tracing();

        let media_dir = tempfile::tempdir().expect("Failed to create media dir");
        let state = setup_test_app_state(&media_dir).await;
        let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");

        TestApp {
            server,
            state,
            media_dir,
            _tracing: tracing,
        }
    }

    /// `Authorization` header pair for a token.
    pub fn token_header(token: &str) -> (HeaderName, HeaderValue) {
        (
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Token {}", token)).expect("Invalid token header"),
        )
    }

    /// Register `username` with password `secret` and return its token.
    pub async fn register_user(server: &TestServer, username: &str) -> String {
        let response = server
            .post("/api/v1/register")
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "secret",
            }))
            .await;
        assert_eq!(
            response.status_code(),
            axum::http::StatusCode::CREATED,
            "registration failed: {}",
            response.text()
        );
        let body: serde_json::Value = response.json();
        body["token"].as_str().expect("missing token").to_string()
    }
}
