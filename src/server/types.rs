//! Request and response bodies of the HTTP API.
//!
//! Adapters return typed `Result`s; the enums here pick the legacy wire
//! shapes (`{emotion, confused}` vs `{error}` and so on) at serialization time.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::emotion::EmotionResult;
use crate::speech::SpeechClip;

/// `POST /api/chat` body
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
}

/// `POST /chat` form
#[derive(Debug, Default, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub question: String,
}

/// `POST /api/speak` body
#[derive(Debug, Default, Deserialize)]
pub struct SpeakRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum EmotionResponse {
    Detected { emotion: String, confused: bool },
    Failed { error: String },
}

impl<E: Display> From<Result<EmotionResult, E>> for EmotionResponse {
    fn from(result: Result<EmotionResult, E>) -> Self {
        match result {
            Ok(r) => Self::Detected {
                emotion: r.dominant_emotion,
                confused: r.confused,
            },
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Chat answers and chat failures share the `response` field
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SpeakResponse {
    Spoken { audio_url: String },
    Failed { error: String },
}

impl<E: Display> From<Result<SpeechClip, E>> for SpeakResponse {
    fn from(result: Result<SpeechClip, E>) -> Self {
        match result {
            Ok(clip) => Self::Spoken {
                audio_url: clip.url,
            },
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub timestamp: String,
    pub version: &'static str,
}
