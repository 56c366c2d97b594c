use std::sync::Arc;
use std::time::Duration;

use crate::clients::CustomSearchClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    Classifier, LinkSearch, PipelineOrchestrator, ResultStore, SeaOrmResultStore,
};

/// Process-wide components, built once at startup and shared by every request.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub pipeline: Arc<PipelineOrchestrator>,
}

impl SharedState {
    /// Connects the database, loads the detection model and builds the search
    /// client. A missing model file fails here, before any request is served.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let classifier = load_classifier(&config)?;
        let search: Arc<dyn LinkSearch> = Arc::new(CustomSearchClient::new(&config.search)?);

        Self::with_components(config, classifier, search).await
    }

    /// Same as [`SharedState::new`] with caller-supplied detection and search.
    pub async fn with_components(
        config: Config,
        classifier: Arc<dyn Classifier>,
        search: Arc<dyn LinkSearch>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        let result_store: Arc<dyn ResultStore> = Arc::new(SeaOrmResultStore::new(store.clone()));

        let pipeline = Arc::new(
            PipelineOrchestrator::new(classifier, search, result_store)
                .with_max_results(config.search.max_results)
                .with_detect_timeout(Duration::from_secs(config.detector.inference_timeout_secs)),
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            pipeline,
        })
    }
}

#[cfg(feature = "onnx")]
pub fn load_classifier(config: &Config) -> anyhow::Result<Arc<dyn Classifier>> {
    let detector = crate::services::OnnxDetector::load(&config.detector)?;
    Ok(Arc::new(detector))
}

#[cfg(not(feature = "onnx"))]
pub fn load_classifier(_config: &Config) -> anyhow::Result<Arc<dyn Classifier>> {
    anyhow::bail!("snapshop was built without the `onnx` feature; no detector is available")
}
