use crate::config::StaticConfig;
use crate::github::handler::{self as github_handler, GithubState};
use crate::quotes;
use crate::types::HealthResponse;
use crate::visitors::{self, VisitorState};
use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// GET /api/health - Liveness.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}

/// Assemble the full HTTP surface: JSON API routes plus the static front end
/// as the fallback for every other path.
pub fn router(
    visitor_state: Arc<VisitorState>,
    github_state: Arc<GithubState>,
    static_files: &StaticConfig,
) -> Router {
    let visitor_routes = Router::new()
        .route("/api/visitors", get(visitors::track_visit))
        .route("/api/visitors/stats", get(visitors::visitor_stats))
        .with_state(visitor_state);

    let github_routes = Router::new()
        .route("/api/github/stats", get(github_handler::stats))
        .route("/api/github/repos", get(github_handler::repos))
        .route("/api/github/activity", get(github_handler::activity))
        .with_state(github_state);

    let misc_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/quotes", get(quotes::random_quotes));

    // Unknown paths get the entry document so client-side routing works
    let front_end = ServeDir::new(&static_files.dir)
        .fallback(ServeFile::new(static_files.index_path()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .merge(misc_routes)
        .merge(visitor_routes)
        .merge(github_routes)
        .fallback_service(front_end)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
