//! Facial emotion classification adapter.
//!
//! The classifier itself is an external engine reached through the
//! [`EmotionClassifier`] trait. [`DeepFaceClient`] talks to a DeepFace-style
//! REST service; [`classify`] applies the first-face policy and the
//! confusion-set check on top of whatever engine is plugged in.

mod deepface;
mod provider;

pub use deepface::DeepFaceClient;
pub use provider::{
    classify, ClassificationError, ConfusionSet, EmotionClassifier, EmotionResult, FaceAnalysis,
};
