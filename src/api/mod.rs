use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{Classifier, LinkSearch, PipelineOrchestrator};
use crate::state::SharedState;

mod error;
mod observability;
mod results;
mod system;
mod types;

pub use error::ApiError;
pub use results::UPLOAD_FIELD;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn pipeline(&self) -> &Arc<PipelineOrchestrator> {
        &self.shared.pipeline
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

/// Builds the full state, loading the detection model and search client.
pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

/// Builds the state around caller-supplied detection and search.
pub async fn create_app_state_with(
    config: Config,
    classifier: Arc<dyn Classifier>,
    search: Arc<dyn LinkSearch>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_components(config, classifier, search).await?);
    Ok(create_app_state(shared, None))
}

pub fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, max_upload_bytes) = {
        let config = state.config();
        (
            config.server.cors_allowed_origins.clone(),
            config.server.max_upload_bytes,
        )
    };

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/upload/", post(results::upload_image))
        .route("/upload", post(results::upload_image))
        .route("/items/", get(results::list_items))
        .route("/items", get(results::list_items))
        .route("/health", get(system::health))
        .route("/metrics", get(observability::get_metrics))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(observability::logging_middleware))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
