// HTTP routes

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::aggregator::SnapshotAggregator;
use crate::entities_repo::EntitiesRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) aggregator: Arc<SnapshotAggregator>,
    pub(crate) repo: Arc<EntitiesRepo>,
}

pub fn app(aggregator: Arc<SnapshotAggregator>, repo: Arc<EntitiesRepo>) -> Router {
    let state = AppState { aggregator, repo };
    Router::new()
        .route("/", get(|| async { "brokerstats snapshot service" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/snapshot", get(http::snapshot_handler)) // GET /api/snapshot
        .route("/api/history", get(http::history_handler)) // GET /api/history?limit=N
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
