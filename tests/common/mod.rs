#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use snapshop::config::Config;
use snapshop::services::{
    Classifier, DecodedImage, DetectorError, LinkSearch, SearchError, SearchHit,
};

pub const BOUNDARY: &str = "snapshop-test-boundary";

type ClassifyFn = dyn Fn(&DecodedImage) -> Result<String, DetectorError> + Send + Sync;

/// Classifier double that counts calls and answers through a closure.
pub struct FakeClassifier {
    calls: AtomicUsize,
    delay: Duration,
    answer: Box<ClassifyFn>,
}

impl FakeClassifier {
    pub fn labeling(label: &str) -> Arc<Self> {
        let label = label.to_string();
        Self::with(move |_| Ok(label.clone()))
    }

    pub fn finding_nothing() -> Arc<Self> {
        Self::with(|_| Err(DetectorError::NoDetection))
    }

    /// Labels images by pixel width, so concurrent uploads can differ.
    pub fn by_width(labels: &[(u32, &str)]) -> Arc<Self> {
        let labels: HashMap<u32, String> = labels
            .iter()
            .map(|(w, l)| (*w, (*l).to_string()))
            .collect();
        Self::with(move |image| {
            labels
                .get(&image.dimensions().0)
                .cloned()
                .ok_or(DetectorError::NoDetection)
        })
    }

    pub fn with<F>(answer: F) -> Arc<Self>
    where
        F: Fn(&DecodedImage) -> Result<String, DetectorError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            answer: Box::new(answer),
        })
    }

    /// Answers `label`, but only after `delay`.
    pub fn slow(label: &str, delay: Duration) -> Arc<Self> {
        let label = label.to_string();
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            answer: Box::new(move |_| Ok(label.clone())),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for FakeClassifier {
    async fn classify(&self, image: &DecodedImage) -> Result<String, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.answer)(image)
    }
}

/// Search double keyed by exact query string.
#[derive(Default)]
pub struct FakeSearch {
    responses: HashMap<String, Vec<SearchHit>>,
    failure: Option<u16>,
    queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn returning(query: &str, hits: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self::default().with(query, hits))
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(status),
            ..Self::default()
        })
    }

    pub fn with(mut self, query: &str, hits: &[(&str, &str)]) -> Self {
        self.responses.insert(query.to_string(), hits_from(hits));
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl LinkSearch for FakeSearch {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());

        if let Some(status) = self.failure {
            return Err(SearchError::Unavailable {
                status,
                body: "fake failure".to_string(),
            });
        }

        let mut hits = self.responses.get(query).cloned().unwrap_or_default();
        hits.truncate(max_results as usize);
        Ok(hits)
    }
}

pub fn hits_from(pairs: &[(&str, &str)]) -> Vec<SearchHit> {
    pairs
        .iter()
        .map(|(title, link)| SearchHit {
            title: (*title).to_string(),
            link: (*link).to_string(),
        })
        .collect()
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.search.api_key = "test-key".to_string();
    config.search.engine_id = "test-cx".to_string();
    config
}

pub fn encode(width: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, width, Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, format)
        .expect("encode test image");
    out.into_inner()
}

pub fn png_bytes() -> Vec<u8> {
    encode(16, ImageFormat::Png)
}

pub fn jpeg_bytes() -> Vec<u8> {
    encode(16, ImageFormat::Jpeg)
}

/// Builds a `multipart/form-data` body with a single file field.
pub fn multipart_body(field: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}
