//! # stepcast
//!
//! Turn a PDF assembly manual into a list of instructional steps, optionally
//! narrated, stored under a content-addressed identifier.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract   render pages to PNG + dump page text (pdfium, spawn_blocking)
//!  ├─ 2. Classify  one VLM call: which images are instructional steps?
//!  ├─ 3. Report    "Found N instructional images … Total: M images"
//!  ├─ 4. Speech    optional Fish Audio TTS per step → {id}-{step}.mp3
//!  └─ 5. Persist   JSON record keyed by the document's content id
//! ```
//!
//! The content id is the first 12 hex characters of the SHA-1 of the PDF
//! bytes ([`hash::content_id`]). Every artifact derived from a document is
//! named after it, so the same bytes always land in the same place.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stepcast::pipeline::{extract::PdfiumExtractor, store::JsonStore, vision::LlmClassifier};
//! use stepcast::{ExtractionConfig, Pipeline, PipelineConfig, SpeechClient, SpeechConfig, VisionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::new(
//!         Arc::new(PdfiumExtractor::new("volume", ExtractionConfig::default())),
//!         Arc::new(LlmClassifier::from_config(VisionConfig::default())?),
//!         Arc::new(JsonStore::new("volume")),
//!         PipelineConfig { generate_speech: true, voice: None },
//!     )
//!     .with_synthesizer(Arc::new(SpeechClient::new(SpeechConfig::from_env())?));
//!
//!     let output = pipeline.run("manual.pdf".as_ref()).await?;
//!     println!("{}", output.report);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `stepcast` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod hash;
pub mod orchestrate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod speech;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AudioFormat, ExtractionConfig, PipelineConfig, SpeechConfig, SpeechConfigBuilder, VisionConfig,
};
pub use error::StepcastError;
pub use hash::{content_id, hash_file};
pub use orchestrate::Pipeline;
pub use output::{
    ClassificationResult, DocumentRecord, DocumentSummary, Extraction, ImageMatch,
    InstructionReport, PipelineOutput,
};
pub use pipeline::{Classifier, Extractor, ResultStore};
pub use progress::{NoopProgress, PipelineProgress, ProgressCallback, Stage};
pub use speech::{audio_filename, classify_failure, SpeechClient, Synthesizer};
