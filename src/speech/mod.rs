//! Text-to-speech adapter.
//!
//! [`SpeechSynthesizer`] turns text into an MP3 clip under the public static
//! directory and hands back its URL. The audio itself comes from a
//! [`SpeechEngine`]; [`GoogleTtsClient`] is the production engine.
//! [`AudioRetention`] keeps the clip directory from growing without bound.

mod google;
mod provider;
mod retention;

pub use google::{split_text, GoogleTtsClient, MAX_CHUNK_CHARS};
pub use provider::{is_valid_language, SpeechClip, SpeechEngine, SpeechSynthesizer, SynthesisError};
pub use retention::AudioRetention;
