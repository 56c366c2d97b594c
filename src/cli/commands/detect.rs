use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use crate::config::Config;
use crate::services::{DetectorError, ImageGate};
use crate::state::load_classifier;

pub async fn cmd_detect(config: &Config, path: &Path) -> anyhow::Result<()> {
    config.validate_detector()?;

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let image = ImageGate::new().validate(&filename, &bytes)?;
    let (width, height) = image.dimensions();
    println!("Image: {filename} ({width}x{height}, {})", image.media_type());

    let classifier = load_classifier(config)?;

    let limit = Duration::from_secs(config.detector.inference_timeout_secs);
    let detected = tokio::time::timeout(limit, classifier.classify(&image))
        .await
        .unwrap_or(Err(DetectorError::Timeout(limit)));

    match detected {
        Ok(label) => {
            println!("Detected: {label}");
            println!();
            println!("To find purchase links: snapshop search \"{label}\"");
            Ok(())
        }
        Err(DetectorError::NoDetection) => {
            println!("No product identified.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
