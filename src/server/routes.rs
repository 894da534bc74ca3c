//! Router, handlers and server startup.

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartRejection,
        rejection::{FormRejection, JsonRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::emotion::{
    classify, ClassificationError, ConfusionSet, DeepFaceClient, EmotionClassifier, EmotionResult,
};
use crate::frame_store::{FrameStore, FrameStoreError};
use crate::llm_client::{reply_text, LLMClient};
use crate::speech::{AudioRetention, GoogleTtsClient, SpeechSynthesizer};

use super::pages;
use super::types::{
    ChatForm, ChatRequest, ChatResponse, EmotionResponse, ErrorResponse, HealthResponse,
    SpeakRequest, SpeakResponse,
};

/// Public path the static directory is mounted at
pub const STATIC_URL_PREFIX: &str = "/static";

/// Public path synthesized clips are served from
pub const AUDIO_URL_PREFIX: &str = "/static/audio";

/// Multipart field carrying the image
const FRAME_FIELD: &str = "frame";

/// Adapters shared by all handlers, built once from [`Config`]
#[derive(Clone)]
pub struct AppState {
    pub frame_store: Arc<FrameStore>,
    pub classifier: Arc<dyn EmotionClassifier>,
    pub confusion: Arc<ConfusionSet>,
    pub synthesizer: Arc<SpeechSynthesizer>,
    pub tts_language: Arc<str>,
    pub llm: Arc<LLMClient>,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let classifier =
            DeepFaceClient::new(&config.classifier_url, &config.classifier_detector_backend)
                .map_err(anyhow::Error::msg)
                .context("Failed to create classifier client")?;
        let tts = GoogleTtsClient::new(&config.tts_url)
            .map_err(anyhow::Error::msg)
            .context("Failed to create TTS client")?;
        let llm = LLMClient::new(&config.llm_api_url, &config.llm_model)
            .map_err(anyhow::Error::msg)
            .context("Failed to create LLM client")?;

        Ok(Self {
            frame_store: Arc::new(FrameStore::new(&config.frame_dir)),
            classifier: Arc::new(classifier),
            confusion: Arc::new(ConfusionSet::new(&config.confusion_emotions)),
            synthesizer: Arc::new(SpeechSynthesizer::new(
                Arc::new(tts),
                config.audio_dir(),
                AUDIO_URL_PREFIX,
            )),
            tts_language: Arc::from(config.tts_language.as_str()),
            llm: Arc::new(llm),
        })
    }
}

/// Everything that can go wrong in `/api/emotion`
#[derive(Debug, Error)]
pub enum EmotionRouteError {
    #[error("Missing 'frame' upload")]
    MissingFrame,

    #[error("Invalid upload: {0}")]
    Upload(String),

    #[error(transparent)]
    Store(#[from] FrameStoreError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

pub fn build_router(state: AppState, static_dir: &Path, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/detect", get(detect_page))
        .route("/chat", get(chat_page).post(chat_submit))
        .route("/api/emotion", post(api_emotion))
        .route("/api/chat", post(api_chat))
        .route("/api/speak", post(api_speak))
        .route("/health", get(health_endpoint))
        .nest_service(STATIC_URL_PREFIX, ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server and run until Ctrl-C
pub async fn serve(config: Config) -> anyhow::Result<()> {
    config.prepare_directories()?;
    let addr = config.socket_addr()?;
    let state = AppState::from_config(&config)?;
    let app = build_router(state, &config.static_dir, config.max_upload_bytes);

    let _sweeper = if config.audio_retention_secs > 0 {
        let retention = AudioRetention::new(
            config.audio_dir(),
            Duration::from_secs(config.audio_retention_secs),
        );
        Some(retention.spawn(Duration::from_secs(config.audio_sweep_interval_secs.max(1))))
    } else {
        info!("Audio retention disabled, clips are kept indefinitely");
        None
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind server to {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Request handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Pages
// ============================================================================

async fn index_page() -> Html<String> {
    Html(pages::index())
}

async fn detect_page() -> Html<String> {
    Html(pages::detect())
}

async fn chat_page() -> Html<String> {
    Html(pages::chat(None))
}

async fn chat_submit(
    State(state): State<AppState>,
    form: Result<Form<ChatForm>, FormRejection>,
) -> Html<String> {
    let question = match form {
        Ok(Form(form)) => form.question,
        Err(e) => {
            warn!("Invalid chat form: {}", e.body_text());
            String::new()
        }
    };

    let answer = reply_text(state.llm.ask(&question).await);
    Html(pages::chat(Some((question.as_str(), answer.as_str()))))
}

// ============================================================================
// JSON API
// ============================================================================

async fn api_emotion(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<EmotionResponse> {
    let result = detect_emotion(&state, multipart).await;
    if let Err(ref e) = result {
        warn!("Emotion detection failed: {}", e);
    }
    Json(result.into())
}

async fn detect_emotion(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<EmotionResult, EmotionRouteError> {
    let mut multipart = multipart.map_err(|e| EmotionRouteError::Upload(e.body_text()))?;
    let (bytes, content_type) = read_frame_field(&mut multipart).await?;

    let frame = state
        .frame_store
        .store(&bytes, content_type.as_deref())
        .await?;
    let result = classify(state.classifier.as_ref(), frame.path(), &state.confusion).await;
    frame.delete().await;

    Ok(result?)
}

async fn read_frame_field(
    multipart: &mut Multipart,
) -> Result<(Bytes, Option<String>), EmotionRouteError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| EmotionRouteError::Upload(e.to_string()))?
    {
        if field.name() != Some(FRAME_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| EmotionRouteError::Upload(e.to_string()))?;
        return Ok((bytes, content_type));
    }

    Err(EmotionRouteError::MissingFrame)
}

async fn api_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatResponse> {
    let response = match body {
        Ok(Json(req)) => reply_text(state.llm.ask(&req.question).await),
        Err(e) => {
            warn!("Invalid chat request: {}", e.body_text());
            format!("Error: {}", e.body_text())
        }
    };
    Json(ChatResponse { response })
}

async fn api_speak(
    State(state): State<AppState>,
    body: Result<Json<SpeakRequest>, JsonRejection>,
) -> Json<SpeakResponse> {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => {
            warn!("Invalid speak request: {}", e.body_text());
            return Json(SpeakResponse::Failed {
                error: e.body_text(),
            });
        }
    };

    let result = state
        .synthesizer
        .synthesize(&req.text, &state.tts_language)
        .await;
    if let Err(ref e) = result {
        warn!("Speech synthesis failed: {}", e);
    }
    Json(result.into())
}

async fn health_endpoint() -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
