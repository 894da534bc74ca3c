//! Classifier seam and result normalization.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during emotion classification
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Failed to read frame: {0}")]
    FrameRead(String),

    #[error("Failed to connect to classifier: {0}")]
    Connection(String),

    #[error("Classifier returned error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse classifier response: {0}")]
    InvalidResponse(String),

    #[error("Classifier returned no face results")]
    NoResults,
}

/// One face as reported by the classifier
#[derive(Debug, Clone, Deserialize)]
pub struct FaceAnalysis {
    pub dominant_emotion: String,
    /// Per-emotion scores, when the engine reports them
    #[serde(default)]
    pub emotion: BTreeMap<String, f64>,
    #[serde(default)]
    pub face_confidence: Option<f64>,
}

/// Normalized classification result returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionResult {
    pub dominant_emotion: String,
    pub confused: bool,
}

/// Emotions that count as "confused", stored lower-case
#[derive(Debug, Clone, Default)]
pub struct ConfusionSet {
    emotions: HashSet<String>,
}

impl ConfusionSet {
    pub fn new<I, S>(emotions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emotions: emotions
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive membership test
    pub fn contains(&self, label: &str) -> bool {
        self.emotions.contains(&label.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.emotions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emotions.is_empty()
    }
}

/// An external face/emotion engine
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Analyze the image at `path`, one entry per detected face.
    ///
    /// Implementations must not fail just because no face was confidently
    /// detected; they should still return a best-effort estimate.
    async fn analyze(&self, path: &Path) -> Result<Vec<FaceAnalysis>, ClassificationError>;
}

/// Classify a stored frame and check the result against `confusion`
///
/// When several faces come back, the first one wins. This is the engine's
/// detection order, not the most confident face.
pub async fn classify(
    classifier: &dyn EmotionClassifier,
    path: &Path,
    confusion: &ConfusionSet,
) -> Result<EmotionResult, ClassificationError> {
    let faces = classifier.analyze(path).await?;
    let face_count = faces.len();

    let first = faces
        .into_iter()
        .next()
        .ok_or(ClassificationError::NoResults)?;

    let confused = confusion.contains(&first.dominant_emotion);

    debug!(
        faces = face_count,
        emotion = %first.dominant_emotion,
        confused,
        "Frame classified"
    );

    Ok(EmotionResult {
        dominant_emotion: first.dominant_emotion,
        confused,
    })
}
