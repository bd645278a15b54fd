use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::db::Repository;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Option<Arc<dyn Repository>>,
}

impl AppState {
    pub fn new(config: Config, db: Option<Arc<dyn Repository>>) -> Self {
        Self {
            config: Arc::new(config),
            db,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/hello", get(crate::api::hello))
        .route("/api/assist", post(crate::api::assist))
        .route("/api/trending", get(crate::api::trending));

    // Wildcards can't be combined with credentials, so mirror the request instead.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/", get(crate::api::root))
        .route("/test", get(crate::api::test_database))
        .merge(api_routes)
        .fallback(fallback_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum::middleware::from_fn(crate::middleware::log_request)),
        )
        .with_state(state)
}

async fn fallback_handler() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
