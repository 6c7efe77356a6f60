pub mod analytics;
pub mod health;
pub mod session;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::auth::{require_analytics_access, require_bearer_auth};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let base_routes = Router::new().route("/health", get(health::health));

    let analytics_routes = Router::new()
        .route(
            "/api/templates/:template_id/analytics",
            get(analytics::get_template_analytics),
        )
        .route_layer(axum::middleware::from_fn(require_analytics_access));

    let api = Router::new()
        .route(
            "/api/templates/:template_id/sessions",
            post(session::start_session),
        )
        .route("/api/sessions/:session_id", get(session::get_session))
        .route(
            "/api/sessions/:session_id/answers",
            put(session::save_answers),
        )
        .route(
            "/api/sessions/:session_id/check",
            get(session::check_answers),
        )
        .merge(analytics_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer_auth,
        ));

    base_routes
        .merge(api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
