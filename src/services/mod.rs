pub mod detector;
pub use detector::{Classifier, Detection, DetectorError};

#[cfg(feature = "onnx")]
pub mod onnx_detector;
#[cfg(feature = "onnx")]
pub use onnx_detector::OnnxDetector;

pub mod image_gate;
pub use image_gate::{DecodedImage, ImageGate, ImageGateError};

pub mod link_search;
pub use link_search::{LinkSearch, SearchError, SearchHit, build_query};

pub mod result_store;
pub mod result_store_impl;
pub use result_store::{ResultStore, StorageError};
pub use result_store_impl::SeaOrmResultStore;

pub mod pipeline;
pub use pipeline::{DEFAULT_DETECT_TIMEOUT, PipelineError, PipelineOrchestrator, UploadStage};
