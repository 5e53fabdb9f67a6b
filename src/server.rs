use crate::analytics::{self, AnalyticsState};
use crate::images::{self, ImageState};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;

/// Assemble every route. Stored images are served from the blob directory
/// under `/images`.
pub fn router(
    image_state: Arc<ImageState>,
    analytics_state: Arc<AnalyticsState>,
    max_upload_bytes: usize,
) -> Router {
    let images_dir = image_state.blobs.root().to_path_buf();

    // ── Gallery routes ──
    let gallery_routes = Router::new()
        .route("/", get(images::handler::index))
        .route("/all", get(images::handler::list_all))
        .route(
            "/new",
            post(images::handler::upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(image_state);

    // ── Analytics routes ──
    let analytics_routes = Router::new()
        .route("/api/analytics/summary", get(analytics::handler::summary))
        .route("/api/analytics/usage", get(analytics::handler::usage))
        .route(
            "/api/analytics/popular-content",
            get(analytics::handler::popular_content),
        )
        .route("/api/analytics/health", get(analytics::handler::health))
        .with_state(analytics_state);

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .merge(gallery_routes)
        .merge(analytics_routes)
        .nest_service("/images", ServeDir::new(images_dir))
        .layer(cors)
}
