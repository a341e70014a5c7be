use crate::auth::require_token;
use crate::handlers::{
    health::health_check,
    preferences::{get_settings, get_theme, set_settings, set_theme},
    profile::{get_profile, update_profile, upload_profile_picture},
    reminders::{create_reminder, delete_reminder, delete_reminders, get_reminders, update_reminder},
    users::{login, logout, register},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Routes that require `Authorization: Token <key>`
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/logout", post(logout))
        // Reminder routes
        .route("/api/v1/reminders", get(get_reminders).post(create_reminder))
        .route("/api/v1/reminders/delete", post(delete_reminders))
        .route(
            "/api/v1/reminders/:reminder_id",
            put(update_reminder).delete(delete_reminder),
        )
        // Preference routes
        .route("/api/v1/theme", get(get_theme).post(set_theme))
        .route("/api/v1/settings", get(get_settings).post(set_settings))
        // Profile routes
        .route("/api/v1/profile", get(get_profile).post(update_profile))
        .route(
            "/api/v1/profile/upload",
            post(upload_profile_picture)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
}

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Public auth routes
        .route("/api/v1/register", post(register))
        .route("/api/v1/login", post(login))
        .merge(protected_routes(&state))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // The Prometheus recorder is process-global, so tests run without it.
    #[cfg(not(test))]
    let router = {
        let (metric_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();
        router
            .route("/metrics", get(move || async move { metric_handle.render() }))
            .layer(metric_layer)
    };

    router
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(state.config.request_timeout()))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
