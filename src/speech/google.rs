//! Google Translate TTS client
//!
//! The endpoint only accepts short utterances, so text is split into chunks of
//! at most [`MAX_CHUNK_CHARS`] characters, each chunk is fetched separately,
//! and the MP3 frames are concatenated in order.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, USER_AGENT};
use tracing::debug;

use super::provider::{SpeechEngine, SynthesisError};
use crate::service::{build_client, parse_service_url, truncate_body};

/// Longest chunk the TTS endpoint accepts per request
pub const MAX_CHUNK_CHARS: usize = 100;

const BREAK_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Split `text` into chunks of at most `MAX_CHUNK_CHARS` characters
///
/// Breaks fall on whitespace. A run without whitespace that is longer than
/// the limit breaks after its last punctuation mark within the limit, and is
/// cut at the character limit only when there is none.
pub fn split_text(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: &str = word;
        let mut word_len = word.chars().count();

        while word_len > MAX_CHUNK_CHARS {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let (split_at, taken) = long_word_break(word);
            chunks.push(word[..split_at].to_string());
            word = &word[split_at..];
            word_len -= taken;
        }

        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };

        if needed > MAX_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Byte offset and char count of the first piece of an over-long word
fn long_word_break(word: &str) -> (usize, usize) {
    let mut hard_cut = word.len();
    let mut after_punctuation = None;

    for (count, (idx, c)) in word.char_indices().enumerate() {
        if count == MAX_CHUNK_CHARS {
            hard_cut = idx;
            break;
        }
        if BREAK_PUNCTUATION.contains(&c) {
            after_punctuation = Some((idx + c.len_utf8(), count + 1));
        }
    }

    after_punctuation.unwrap_or((hard_cut, MAX_CHUNK_CHARS))
}

#[derive(Debug)]
pub struct GoogleTtsClient {
    client: reqwest::Client,
    url: String,
}

impl GoogleTtsClient {
    pub fn new(url: &str) -> Result<Self, String> {
        let parsed = parse_service_url("TTS", url)?;
        Ok(Self {
            client: build_client()?,
            url: parsed.to_string(),
        })
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, SynthesisError> {
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&self.url)
            .header(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"))
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language),
                ("q", chunk),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SynthesisError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Connection(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechEngine for GoogleTtsClient {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError> {
        let chunks = split_text(text);
        if chunks.is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        debug!("TTS request: {} chunks, lang={}", chunks.len(), language);

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self.fetch_chunk(chunk, language, idx, chunks.len()).await?;
            audio.extend_from_slice(&bytes);
        }

        Ok(audio)
    }
}
