//! Text-to-speech through the Fish Audio HTTP API.
//!
//! Each call narrates one instructional step and writes the audio to
//! `{output_dir}/{document_id}-{step}.{ext}`. The identifier is computed by
//! the caller (see [`crate::hash`]), so the same document always maps to the
//! same audio names and regenerating a step simply overwrites its file.
//!
//! One request, one buffered response, one write. No retries and no
//! streaming; callers narrating several steps of one document await each call
//! before the next so no two writes target the same file at once.

use crate::config::{SpeechConfig, FISH_AUDIO_API_KEY_ENV};
use crate::error::{Result, StepcastError};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Anything that can turn step text into an audio artifact.
///
/// Implemented by [`SpeechClient`]; the orchestrator depends only on this
/// trait so tests can substitute a recorder.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Narrate `text` as step `step` of `document_id` and return the file name.
    async fn synthesize(
        &self,
        text: &str,
        document_id: &str,
        step: u32,
        voice: Option<&str>,
    ) -> Result<String>;
}

/// Request body accepted by the TTS endpoint.
#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model: &'a str,
    voice: &'a str,
    format: &'a str,
}

/// Fish Audio client bound to one [`SpeechConfig`].
#[derive(Debug, Clone)]
pub struct SpeechClient {
    http: reqwest::Client,
    config: SpeechConfig,
}

impl SpeechClient {
    pub fn new(config: SpeechConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StepcastError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    /// Narrate `text` and write the audio for `(document_id, step)`.
    ///
    /// # Errors
    /// * [`StepcastError::MissingCredential`] — no API key configured; no request is sent
    /// * [`StepcastError::InvalidInput`] — blank text, step 0, or an unusable identifier
    /// * [`StepcastError::InvalidVoice`] — the service rejected the voice
    /// * [`StepcastError::RemoteApi`] — any other non-200 response
    /// * [`StepcastError::Io`] — the audio file could not be written
    pub async fn synthesize(
        &self,
        text: &str,
        document_id: &str,
        step: u32,
        voice: Option<&str>,
    ) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(StepcastError::MissingCredential {
                var: FISH_AUDIO_API_KEY_ENV,
            })?;
        validate_request(text, document_id, step)?;

        let voice = voice.unwrap_or(self.config.default_voice.as_str());
        let filename = audio_filename(document_id, step, self.config.format.extension());

        let payload = TtsRequest {
            text,
            model: &self.config.model,
            voice,
            format: self.config.format.as_str(),
        };

        debug!(
            "TTS request: doc={} step={} voice={} chars={}",
            document_id,
            step,
            voice,
            text.chars().count()
        );

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| StepcastError::Http {
                url: self.config.endpoint.clone(),
                source: e,
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.map_err(|e| StepcastError::Http {
                url: self.config.endpoint.clone(),
                source: e,
            })?;
            return Err(classify_failure(status, &body, voice));
        }

        let audio = response.bytes().await.map_err(|e| StepcastError::Http {
            url: self.config.endpoint.clone(),
            source: e,
        })?;

        let dir = &self.config.output_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StepcastError::io(dir, e))?;
        let path = dir.join(&filename);
        tokio::fs::write(&path, &audio)
            .await
            .map_err(|e| StepcastError::io(&path, e))?;

        info!("Audio saved to {} ({} bytes)", path.display(), audio.len());
        Ok(filename)
    }

    /// Read step text from a UTF-8 file, trim it, and narrate it.
    pub async fn synthesize_from_file(
        &self,
        input: &Path,
        document_id: &str,
        step: u32,
        voice: Option<&str>,
    ) -> Result<String> {
        let text = tokio::fs::read_to_string(input)
            .await
            .map_err(|e| StepcastError::io(input, e))?;
        self.synthesize(text.trim(), document_id, step, voice).await
    }
}

#[async_trait]
impl Synthesizer for SpeechClient {
    async fn synthesize(
        &self,
        text: &str,
        document_id: &str,
        step: u32,
        voice: Option<&str>,
    ) -> Result<String> {
        SpeechClient::synthesize(self, text, document_id, step, voice).await
    }
}

/// File name of the audio artifact for one step of one document.
pub fn audio_filename(document_id: &str, step: u32, extension: &str) -> String {
    format!("{document_id}-{step}.{extension}")
}

/// Map a non-200 TTS response to an error.
///
/// The service does not return a structured error code for a bad voice, so
/// any body mentioning "voice" (case-insensitive) counts as a voice
/// rejection. Everything else keeps the status and raw body.
pub fn classify_failure(status: u16, body: &str, voice: &str) -> StepcastError {
    if body.to_lowercase().contains("voice") {
        StepcastError::InvalidVoice {
            voice: voice.to_string(),
        }
    } else {
        StepcastError::RemoteApi {
            status,
            body: body.to_string(),
        }
    }
}

fn validate_request(text: &str, document_id: &str, step: u32) -> Result<()> {
    if text.trim().is_empty() {
        return Err(StepcastError::InvalidInput(
            "text to synthesize is empty".into(),
        ));
    }
    if step == 0 {
        return Err(StepcastError::InvalidInput(
            "step numbers start at 1".into(),
        ));
    }
    if document_id.is_empty() || document_id.contains(['/', '\\']) || document_id.starts_with('.') {
        return Err(StepcastError::InvalidInput(format!(
            "'{document_id}' cannot be used as a file name prefix"
        )));
    }
    Ok(())
}
