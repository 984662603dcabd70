//! Configuration types for the stepcast pipeline and its adapters.
//!
//! Each adapter owns its own config struct so it can be built and tested in
//! isolation: [`SpeechConfig`] for the Fish Audio client, [`ExtractionConfig`]
//! for pdfium rendering, [`VisionConfig`] for the LLM classifier, and
//! [`PipelineConfig`] for the orchestrator itself.
//!
//! Credentials are plain fields. Nothing in the library reads the process
//! environment on its own; [`SpeechConfig::from_env`] exists for callers who
//! want that behaviour explicitly.

use crate::error::StepcastError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the Fish Audio API key.
pub const FISH_AUDIO_API_KEY_ENV: &str = "FISH_AUDIO_API_KEY";

/// Fish Audio text-to-speech endpoint.
pub const DEFAULT_TTS_ENDPOINT: &str = "https://api.fish.audio/v1/tts";

/// Fish Audio synthesis model.
pub const DEFAULT_TTS_MODEL: &str = "fish-speech-1";

/// Voice profile used when a call does not name one.
pub const DEFAULT_VOICE: &str = "zh_CN-female-1";

/// Directory that holds every derived artifact unless overridden.
pub const DEFAULT_WORK_DIR: &str = "volume";

// ── Speech ───────────────────────────────────────────────────────────────

/// Audio container requested from the TTS service.
///
/// The value doubles as the file extension of the generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Opus,
}

impl AudioFormat {
    /// Wire name sent in the request body.
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Opus => "opus",
        }
    }

    /// File extension of generated artifacts (same as the wire name).
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

/// Configuration for [`crate::speech::SpeechClient`].
///
/// # Example
/// ```rust
/// use stepcast::SpeechConfig;
///
/// let config = SpeechConfig::builder()
///     .api_key("fa-test")
///     .output_dir("volume/audio")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "fish-speech-1");
/// ```
#[derive(Clone)]
pub struct SpeechConfig {
    /// Bearer credential for the TTS service. `None` makes every synthesis
    /// call fail with [`StepcastError::MissingCredential`] before any request.
    pub api_key: Option<String>,

    /// Full URL of the synthesis endpoint. Default: [`DEFAULT_TTS_ENDPOINT`].
    pub endpoint: String,

    /// Model name sent with each request. Default: [`DEFAULT_TTS_MODEL`].
    pub model: String,

    /// Voice used when a call passes `None`. Default: [`DEFAULT_VOICE`].
    pub default_voice: String,

    /// Requested audio format. Default: mp3.
    pub format: AudioFormat,

    /// Directory generated audio files are written to. Created on demand.
    pub output_dir: PathBuf,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_TTS_ENDPOINT.to_string(),
            model: DEFAULT_TTS_MODEL.to_string(),
            default_voice: DEFAULT_VOICE.to_string(),
            format: AudioFormat::default(),
            output_dir: PathBuf::from(DEFAULT_WORK_DIR),
        }
    }
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("default_voice", &self.default_voice)
            .field("format", &self.format)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl SpeechConfig {
    /// Create a new builder for `SpeechConfig`.
    pub fn builder() -> SpeechConfigBuilder {
        SpeechConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults plus the API key from [`FISH_AUDIO_API_KEY_ENV`], if set and non-empty.
    pub fn from_env() -> Self {
        let api_key = std::env::var(FISH_AUDIO_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self {
            api_key,
            ..Self::default()
        }
    }
}

/// Builder for [`SpeechConfig`].
#[derive(Debug)]
pub struct SpeechConfigBuilder {
    config: SpeechConfig,
}

impl SpeechConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.config.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn default_voice(mut self, voice: impl Into<String>) -> Self {
        self.config.default_voice = voice.into();
        self
    }

    pub fn format(mut self, format: AudioFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// A missing API key is not a build error: it is reported by the first
    /// synthesis call so that a pipeline without speech can share the config.
    pub fn build(self) -> Result<SpeechConfig, StepcastError> {
        let c = &self.config;
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(StepcastError::InvalidConfig(format!(
                "TTS endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        if c.model.trim().is_empty() {
            return Err(StepcastError::InvalidConfig("TTS model must not be empty".into()));
        }
        if c.default_voice.trim().is_empty() {
            return Err(StepcastError::InvalidConfig(
                "Default voice must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Extraction ───────────────────────────────────────────────────────────

/// Configuration for [`crate::pipeline::extract::PdfiumExtractor`].
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Cap on the longest edge of a rendered page, in pixels. Default: 2000.
    ///
    /// Page sizes vary wildly; capping the edge instead of fixing a DPI keeps
    /// memory bounded and lands in the range vision models read well.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to a libpdfium shared library. If `None`, the system
    /// library is used.
    pub pdfium_library: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_rendered_pixels: 2000,
            password: None,
            pdfium_library: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library", &self.pdfium_library)
            .finish()
    }
}

// ── Vision ───────────────────────────────────────────────────────────────

/// Configuration for [`crate::pipeline::vision::LlmClassifier`].
#[derive(Clone)]
pub struct VisionConfig {
    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "gemini"). If None, auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens in the model's reply. Default: 4096.
    pub max_tokens: usize,

    /// Custom system prompt. If None, uses [`crate::prompts::CLASSIFY_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .finish()
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────────

/// Orchestrator switches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Narrate every instructional step after classification. Default: false.
    pub generate_speech: bool,

    /// Voice for narrated steps. `None` uses the speech client's default.
    pub voice: Option<String>,
}
