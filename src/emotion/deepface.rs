//! HTTP client for a DeepFace-compatible `/analyze` service.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use super::provider::{ClassificationError, EmotionClassifier, FaceAnalysis};
use crate::service::{build_client, parse_service_url, truncate_body};

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    img: String,
    actions: [&'a str; 1],
    enforce_detection: bool,
    detector_backend: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    results: Vec<FaceAnalysis>,
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

#[derive(Debug)]
pub struct DeepFaceClient {
    client: reqwest::Client,
    url: String,
    detector_backend: String,
}

impl DeepFaceClient {
    pub fn new(url: &str, detector_backend: &str) -> Result<Self, String> {
        let parsed = parse_service_url("Classifier", url)?;
        Ok(Self {
            client: build_client()?,
            url: parsed.to_string(),
            detector_backend: detector_backend.to_string(),
        })
    }

    fn build_request(&self, path: &Path, bytes: &[u8]) -> AnalyzeRequest<'_> {
        AnalyzeRequest {
            img: format!("data:{};base64,{}", mime_for(path), STANDARD.encode(bytes)),
            actions: ["emotion"],
            // A frame without a confidently detected face still gets an estimate
            enforce_detection: false,
            detector_backend: &self.detector_backend,
        }
    }
}

#[async_trait]
impl EmotionClassifier for DeepFaceClient {
    async fn analyze(&self, path: &Path) -> Result<Vec<FaceAnalysis>, ClassificationError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClassificationError::FrameRead(e.to_string()))?;

        debug!(
            "Sending {} byte frame to classifier at {}",
            bytes.len(),
            self.url
        );

        let response = self
            .client
            .post(&self.url)
            .json(&self.build_request(path, &bytes))
            .send()
            .await
            .map_err(|e| ClassificationError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Classifier returned {}", status);
            return Err(ClassificationError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| ClassificationError::InvalidResponse(e.to_string()))?;

        Ok(parsed.results)
    }
}
