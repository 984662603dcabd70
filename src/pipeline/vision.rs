//! Vision classification: ask a VLM which extracted images are steps.
//!
//! All images of a document go out in a single request together with the
//! manual text, so the model can line pictures up with the written steps.
//! The reply is expected to be the JSON object described in
//! [`crate::prompts::CLASSIFY_SYSTEM_PROMPT`]; models still wrap it in
//! fences or prose now and then, so [`parse_classification`] cuts the JSON
//! out before deserialising.

use crate::config::VisionConfig;
use crate::error::{Result, StepcastError};
use crate::output::{ClassificationResult, ImageMatch};
use crate::pipeline::{encode, Classifier};
use crate::prompts::{build_user_prompt, CLASSIFY_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Model used when a provider is named without one.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4.1-nano";

/// [`Classifier`] backed by an `edgequake-llm` provider.
pub struct LlmClassifier {
    provider: Arc<dyn LLMProvider>,
    config: VisionConfig,
}

impl LlmClassifier {
    pub fn new(provider: Arc<dyn LLMProvider>, config: VisionConfig) -> Self {
        Self { provider, config }
    }

    /// Resolve the provider from `config` (see [`resolve_provider`]).
    pub fn from_config(config: VisionConfig) -> Result<Self> {
        let provider = resolve_provider(&config)?;
        Ok(Self::new(provider, config))
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(
        &self,
        image_filenames: &[String],
        instructions_filename: &str,
    ) -> Result<ClassificationResult> {
        if image_filenames.is_empty() {
            warn!("No images to classify");
            return Ok(ClassificationResult::default());
        }

        let instructions = tokio::fs::read_to_string(instructions_filename)
            .await
            .map_err(|e| StepcastError::io(instructions_filename, e))?;

        let mut images = Vec::with_capacity(image_filenames.len());
        for name in image_filenames {
            images.push(encode::encode_image_file(Path::new(name)).await?);
        }

        let system_prompt = self
            .config
            .system_prompt
            .as_deref()
            .unwrap_or(CLASSIFY_SYSTEM_PROMPT);

        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user_with_images(
                &build_user_prompt(&instructions, image_filenames),
                images,
            ),
        ];

        let start = Instant::now();
        let response = self
            .provider
            .chat(&messages, Some(&build_options(&self.config)))
            .await
            .map_err(|e| StepcastError::LlmApiError {
                message: e.to_string(),
            })?;

        info!(
            "Classified {} images in {:?} ({} input tokens, {} output tokens)",
            image_filenames.len(),
            start.elapsed(),
            response.prompt_tokens,
            response.completion_tokens
        );

        parse_classification(&response.content, image_filenames)
    }
}

/// Build `CompletionOptions` from the vision config.
fn build_options(config: &VisionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

static RE_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*\n(.*?)\n?```\s*$").unwrap());

/// Parse a model reply into a [`ClassificationResult`].
///
/// Accepts the JSON object on its own, inside ``` fences, or surrounded by
/// prose. A bare JSON array is taken as the `matches` list. Matches that only
/// carry an `image_index` get their `image_filename` filled in from
/// `image_filenames`.
pub fn parse_classification(
    reply: &str,
    image_filenames: &[String],
) -> Result<ClassificationResult> {
    let trimmed = reply.trim();
    let body = match RE_FENCES.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    };

    let mut result = if body.starts_with('[') {
        let matches: Vec<ImageMatch> =
            serde_json::from_str(&body).map_err(|e| StepcastError::MalformedClassification {
                detail: e.to_string(),
            })?;
        ClassificationResult {
            matches,
            ..Default::default()
        }
    } else {
        let json = outermost_object(&body).ok_or_else(|| StepcastError::MalformedClassification {
            detail: format!("no JSON object in reply: {}", preview(&body)),
        })?;
        serde_json::from_str::<ClassificationResult>(json).map_err(|e| {
            StepcastError::MalformedClassification {
                detail: e.to_string(),
            }
        })?
    };

    for m in &mut result.matches {
        if m.image_filename.is_none() {
            m.image_filename = m.image_index.and_then(|i| image_filenames.get(i).cloned());
        }
    }

    if result.matches.len() != image_filenames.len() {
        warn!(
            "Model returned {} matches for {} images",
            result.matches.len(),
            image_filenames.len()
        );
    }
    debug!(
        "Parsed {} matches ({} instructional)",
        result.matches.len(),
        result.instructional_count()
    );

    Ok(result)
}

fn outermost_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    (end > start).then(|| &s[start..=end])
}

fn preview(s: &str) -> String {
    s.chars().take(80).collect()
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_VISION_MODEL`].
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_provider(config: &VisionConfig) -> Result<Arc<dyn LLMProvider>> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_VISION_MODEL);
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_VISION_MODEL);
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| StepcastError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, GEMINI_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_vision_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        StepcastError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
