//! HTTP front end.
//!
//! ## Routes
//!
//! - `GET /`, `GET /detect`, `GET /chat` - rendered pages
//! - `POST /chat` - form round trip through the language model
//! - `POST /api/emotion` - multipart `frame` → `{emotion, confused}` or `{error}`
//! - `POST /api/chat` - `{question}` → `{response}`
//! - `POST /api/speak` - `{text}` → `{audio_url}` or `{error}`
//! - `GET /static/...` - static files, including synthesized clips
//! - `GET /health` - liveness check
//!
//! API failures are reported in the body with HTTP 200; only a panicking
//! handler produces a 500.

mod pages;
mod routes;
mod types;

pub use routes::{
    build_router, serve, AppState, EmotionRouteError, AUDIO_URL_PREFIX, STATIC_URL_PREFIX,
};
