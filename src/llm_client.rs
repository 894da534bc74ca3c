//! Ollama API client for chat answers
//!
//! Sends one non-streaming `/api/generate` request per question. There is no
//! retry and no timeout beyond the HTTP client defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::service::{build_client, parse_service_url, truncate_body};

/// Answer used when the service replies without a `response` field
pub const NO_RESPONSE_FALLBACK: &str = "No response.";

#[derive(Debug, Error)]
pub enum ModelServiceError {
    #[error("Failed to connect to language model service: {0}")]
    Connection(String),

    #[error("Language model service returned error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse language model response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug)]
pub struct LLMClient {
    client: reqwest::Client,
    api_url: String,
    model: String,
}

impl LLMClient {
    /// Create a new client with URL validation
    ///
    /// # Arguments
    /// * `api_url` - Full generate endpoint (e.g., "http://localhost:11434/api/generate")
    /// * `model` - Model identifier sent with every request
    pub fn new(api_url: &str, model: &str) -> Result<Self, String> {
        let parsed = parse_service_url("LLM", api_url)?;

        if model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        info!("LLMClient created for {} (model {})", parsed, model);

        Ok(Self {
            client: build_client()?,
            api_url: parsed.to_string(),
            model: model.to_string(),
        })
    }

    /// Ask a single question and return the completion text
    pub async fn ask(&self, question: &str) -> Result<String, ModelServiceError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: question,
            stream: false,
        };

        debug!(
            "Asking {} at {} ({} chars)",
            self.model,
            self.api_url,
            question.chars().count()
        );

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("LLM request failed: {}", e);
                ModelServiceError::Connection(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("LLM generate failed: {}", status);
            return Err(ModelServiceError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ModelServiceError::Connection(e.to_string()))?;
        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| ModelServiceError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .response
            .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string()))
    }
}

/// Collapse a typed answer into the text shown to users
///
/// Failures become `"Error: <message>"` so callers always have something to
/// display.
pub fn reply_text(result: Result<String, ModelServiceError>) -> String {
    match result {
        Ok(answer) => answer,
        Err(e) => format!("Error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_mock, unreachable_url};
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn mock_generate(reply: Value) -> String {
        let router = Router::new().route(
            "/api/generate",
            post(move |Json(body): Json<Value>| {
                let reply = reply.clone();
                async move {
                    assert_eq!(body["stream"], false);
                    assert_eq!(body["model"], "phi3");
                    Json(reply)
                }
            }),
        );
        format!("{}/api/generate", spawn_mock(router).await)
    }

    #[test]
    fn test_llm_client_new() {
        let client = LLMClient::new("http://localhost:11434/api/generate", "phi3").unwrap();
        assert_eq!(client.api_url, "http://localhost:11434/api/generate");
        assert_eq!(client.model, "phi3");
    }

    #[test]
    fn test_llm_client_new_invalid_url() {
        let result = LLMClient::new("not-a-valid-url", "phi3");
        assert!(result.unwrap_err().contains("Invalid LLM URL"));
    }

    #[test]
    fn test_llm_client_new_empty_model() {
        let result = LLMClient::new("http://localhost:11434/api/generate", "  ");
        assert!(result.unwrap_err().contains("Model name cannot be empty"));
    }

    #[test]
    fn test_generate_request_shape() {
        let request = GenerateRequest {
            model: "phi3",
            prompt: "2+2",
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, json!({"model": "phi3", "prompt": "2+2", "stream": false}));
    }

    #[tokio::test]
    async fn test_ask_returns_response_field() {
        let url = mock_generate(json!({"model": "phi3", "response": "4", "done": true})).await;
        let client = LLMClient::new(&url, "phi3").unwrap();

        assert_eq!(client.ask("2+2").await.unwrap(), "4");
    }

    #[tokio::test]
    async fn test_ask_missing_response_falls_back() {
        let url = mock_generate(json!({"done": true})).await;
        let client = LLMClient::new(&url, "phi3").unwrap();

        assert_eq!(client.ask("hi").await.unwrap(), NO_RESPONSE_FALLBACK);
    }

    #[tokio::test]
    async fn test_ask_wrong_response_type_is_error() {
        let url = mock_generate(json!({"response": 42})).await;
        let client = LLMClient::new(&url, "phi3").unwrap();

        let err = client.ask("hi").await.unwrap_err();
        assert!(matches!(err, ModelServiceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_ask_non_json_body_is_error() {
        let router = Router::new().route("/api/generate", post(|| async { "<html>oops</html>" }));
        let url = format!("{}/api/generate", spawn_mock(router).await);
        let client = LLMClient::new(&url, "phi3").unwrap();

        let err = client.ask("hi").await.unwrap_err();
        assert!(matches!(err, ModelServiceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_ask_error_status() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async { (StatusCode::NOT_FOUND, r#"{"error":"model 'phi3' not found"}"#) }),
        );
        let url = format!("{}/api/generate", spawn_mock(router).await);
        let client = LLMClient::new(&url, "phi3").unwrap();

        match client.ask("hi").await.unwrap_err() {
            ModelServiceError::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("not found"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ask_unreachable() {
        let client = LLMClient::new(&unreachable_url("/api/generate"), "phi3").unwrap();
        let err = client.ask("hi").await.unwrap_err();
        assert!(matches!(err, ModelServiceError::Connection(_)));
    }

    #[test]
    fn test_reply_text() {
        assert_eq!(reply_text(Ok("4".to_string())), "4");

        let text = reply_text(Err(ModelServiceError::Connection("refused".to_string())));
        assert!(text.starts_with("Error: "));
        assert!(text.contains("refused"));
    }
}
