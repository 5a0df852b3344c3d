//! Speech-to-text.
//!
//! Failure is a distinct [`Transcription::Failed`] value so a failed
//! transcription can never be mistaken for (or persisted as) real text.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{info, warn};

use crate::config::TranscriptionConfig;
use crate::util::bounded;
use crate::{AppError, Result};

/// Outcome of a transcription attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcription {
    /// Recognized speech, never empty.
    Text(String),
    /// Nothing usable came back.
    Failed {
        /// Human-readable cause, for logs.
        reason: String,
    },
}

/// Provider of raw speech-to-text.
pub trait SpeechToText: Send + Sync {
    /// Transcribe `audio`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transcription` or `AppError::Timeout` on failure.
    fn transcribe(
        &self,
        audio: Bytes,
        filename: &str,
        mime: &str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}

/// Engine used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredSpeech;

impl SpeechToText for UnconfiguredSpeech {
    fn transcribe(
        &self,
        _audio: Bytes,
        _filename: &str,
        _mime: &str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async { Err(AppError::Transcription("API key not configured".into())) })
    }
}

/// Whisper-compatible `audio/transcriptions` endpoint.
#[derive(Clone)]
pub struct WhisperEngine {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl WhisperEngine {
    /// Build a client for `config` authenticated with `api_key`.
    #[must_use]
    pub fn new(config: &TranscriptionConfig, api_key: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint: format!(
                "{}/audio/transcriptions",
                config.base_url.trim_end_matches('/')
            ),
            api_key: api_key.to_owned(),
            model: config.model.clone(),
        }
    }
}

impl SpeechToText for WhisperEngine {
    fn transcribe(
        &self,
        audio: Bytes,
        filename: &str,
        mime: &str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let filename = filename.to_owned();
        let mime = mime.to_owned();
        Box::pin(async move {
            let part = Part::bytes(audio.to_vec())
                .file_name(filename)
                .mime_str(&mime)
                .map_err(|err| AppError::Transcription(format!("invalid mime type: {err}")))?;
            let form = Form::new()
                .part("file", part)
                .text("model", self.model.clone())
                .text("response_format", "text");

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .multipart(form)
                .send()
                .await
                .map_err(|err| {
                    if err.is_timeout() {
                        AppError::Timeout(format!("transcription: {err}"))
                    } else {
                        AppError::Transcription(err.to_string())
                    }
                })?;

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|err| AppError::Transcription(err.to_string()))?;
            if !status.is_success() {
                return Err(AppError::Transcription(format!(
                    "provider returned {status}: {}",
                    crate::util::preview(&text, 200)
                )));
            }
            Ok(text)
        })
    }
}

/// Time-bounded front over a [`SpeechToText`] engine.
#[derive(Clone)]
pub struct Transcriber {
    engine: Arc<dyn SpeechToText>,
    timeout: Duration,
}

impl Transcriber {
    /// Wrap `engine`.
    #[must_use]
    pub fn new(engine: Arc<dyn SpeechToText>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    /// Transcribe `audio`. Errors, timeouts and empty results all become
    /// [`Transcription::Failed`].
    pub async fn transcribe(&self, audio: Bytes, filename: &str, mime: &str) -> Transcription {
        let result = bounded(
            self.timeout,
            "transcription",
            self.engine.transcribe(audio, filename, mime),
        )
        .await;
        match result {
            Ok(text) if !text.trim().is_empty() => {
                let text = text.trim().to_owned();
                info!(chars = text.chars().count(), "voice note transcribed");
                Transcription::Text(text)
            }
            Ok(_) => {
                warn!("transcription came back empty");
                Transcription::Failed {
                    reason: "voice note was empty or inaudible".into(),
                }
            }
            Err(err) => {
                warn!(%err, "transcription failed");
                Transcription::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}
