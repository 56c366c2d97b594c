//! Upload pipeline: image → product label → purchase links → stored set.
//!
//! Stages run strictly in order: `Validating → Detecting → Searching →
//! Storing → Done`. Any stage may fail, which ends the upload without touching
//! the stored set. Two outcomes are empty but successful: the detector found
//! nothing, or the search returned nothing. Both leave the store cleared.
//!
//! Concurrent uploads are not serialized here. Each one replaces the stored
//! set atomically and the store serializes replacements, so the last one to
//! commit is what readers see.

use crate::models::{NewSearchResult, SearchResult};
use crate::services::detector::{Classifier, DetectorError};
use crate::services::image_gate::{ImageGate, ImageGateError};
use crate::services::link_search::{
    DEFAULT_MAX_RESULTS, LinkSearch, SearchError, SearchHit, build_query,
};
use crate::services::result_store::{ResultStore, StorageError};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Validating,
    Detecting,
    Searching,
    Storing,
    Done,
}

impl UploadStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Detecting => "detecting",
            Self::Searching => "searching",
            Self::Storing => "storing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidInput(#[from] ImageGateError),

    #[error(transparent)]
    Detector(DetectorError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("{source} (while {stage})")]
    Storage {
        stage: UploadStage,
        #[source]
        source: StorageError,
    },

    #[error("Task failed while {stage}: {message}")]
    Internal { stage: UploadStage, message: String },
}

impl PipelineError {
    /// The stage the upload was in when it failed.
    #[must_use]
    pub const fn stage(&self) -> UploadStage {
        match self {
            Self::InvalidInput(_) => UploadStage::Validating,
            Self::Detector(_) => UploadStage::Detecting,
            Self::Search(_) => UploadStage::Searching,
            Self::Storage { stage, .. } | Self::Internal { stage, .. } => *stage,
        }
    }

    const fn outcome(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Detector(_) => "detector_error",
            Self::Search(_) => "search_error",
            Self::Storage { .. } => "storage_error",
            Self::Internal { .. } => "internal_error",
        }
    }
}

/// Default bound on a single detection run.
pub const DEFAULT_DETECT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct PipelineOrchestrator {
    gate: ImageGate,
    classifier: Arc<dyn Classifier>,
    search: Arc<dyn LinkSearch>,
    store: Arc<dyn ResultStore>,
    max_results: u32,
    detect_timeout: Duration,
}

impl PipelineOrchestrator {
    #[must_use]
    pub fn new(
        classifier: Arc<dyn Classifier>,
        search: Arc<dyn LinkSearch>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            gate: ImageGate::new(),
            classifier,
            search,
            store,
            max_results: DEFAULT_MAX_RESULTS,
            detect_timeout: DEFAULT_DETECT_TIMEOUT,
        }
    }

    /// Bounds each classifier call. A run past the bound is abandoned and the
    /// upload fails without touching the stored set.
    #[must_use]
    pub const fn with_detect_timeout(mut self, timeout: Duration) -> Self {
        self.detect_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Runs the whole upload flow and returns what is now stored.
    pub async fn handle_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<Vec<SearchResult>, PipelineError> {
        let start = Instant::now();
        let result = self.run_upload(filename, bytes).await;

        let outcome = match &result {
            Ok(results) if results.is_empty() => "empty",
            Ok(_) => "stored",
            Err(err) => {
                error!(
                    filename = %filename,
                    stage = %err.stage(),
                    error = %err,
                    "Upload pipeline failed"
                );
                err.outcome()
            }
        };

        metrics::counter!("pipeline_uploads_total", "outcome" => outcome).increment(1);
        metrics::histogram!("pipeline_upload_duration_seconds", "outcome" => outcome)
            .record(start.elapsed().as_secs_f64());

        result
    }

    /// Returns the stored set; empty when nothing is stored.
    pub async fn handle_list(&self) -> Result<Vec<SearchResult>, StorageError> {
        self.store.list_all().await
    }

    async fn run_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<Vec<SearchResult>, PipelineError> {
        debug!(stage = %UploadStage::Validating, filename = %filename, size = bytes.len(), "Upload stage");
        let image = {
            let gate = self.gate;
            let name = filename.to_string();
            tokio::task::spawn_blocking(move || gate.validate(&name, &bytes))
                .await
                .map_err(|e| PipelineError::Internal {
                    stage: UploadStage::Validating,
                    message: e.to_string(),
                })??
        };

        debug!(stage = %UploadStage::Detecting, "Upload stage");
        let detected = tokio::time::timeout(self.detect_timeout, self.classifier.classify(&image))
            .await
            .unwrap_or(Err(DetectorError::Timeout(self.detect_timeout)));

        let label = match detected {
            Ok(label) => label,
            Err(DetectorError::NoDetection) => {
                info!(filename = %filename, "No product identified, clearing stored results");
                self.store
                    .clear()
                    .await
                    .map_err(|source| PipelineError::Storage {
                        stage: UploadStage::Detecting,
                        source,
                    })?;
                return Ok(Vec::new());
            }
            Err(err) => return Err(PipelineError::Detector(err)),
        };

        debug!(stage = %UploadStage::Searching, label = %label, "Upload stage");
        let query = build_query(&label);
        let hits = self.search.search(&query, self.max_results).await?;

        debug!(stage = %UploadStage::Storing, hits = hits.len(), "Upload stage");
        let items = storable(hits);
        let results = self
            .store
            .replace_all(&items)
            .await
            .map_err(|source| PipelineError::Storage {
                stage: UploadStage::Storing,
                source,
            })?;

        if results.is_empty() {
            warn!(query = %query, "No results found");
        } else {
            info!(label = %label, count = results.len(), "Upload pipeline finished");
        }

        Ok(results)
    }
}

/// Keeps hits that satisfy the stored-row rules, in API order.
fn storable(hits: Vec<SearchHit>) -> Vec<NewSearchResult> {
    hits.into_iter()
        .filter_map(|hit| match NewSearchResult::parse(&hit.title, &hit.link) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(title = %hit.title, link = %hit.link, error = %e, "Dropping search hit");
                None
            }
        })
        .collect()
}
