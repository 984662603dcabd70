//! Pipeline stages and the adapter contracts the orchestrator depends on.
//!
//! The orchestrator ([`crate::orchestrate::Pipeline`]) only sees the traits
//! below. Each has one production implementation in a submodule; tests swap
//! in doubles.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ vision ──▶ (speech) ──▶ store
//! (%PDF)    (pdfium)    (VLM)     (Fish TTS)    (JSON)
//! ```
//!
//! 1. [`input`]   — validate the user-supplied path before pdfium sees it
//! 2. [`extract`] — render pages to PNG and dump page text; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]  — image file → base64 `ImageData` for the multimodal request
//! 4. [`vision`]  — one VLM call classifying every image at once
//! 5. [`store`]   — content-addressed JSON records and per-step text files

pub mod encode;
pub mod extract;
pub mod input;
pub mod store;
pub mod vision;

use crate::error::Result;
use crate::output::{ClassificationResult, Extraction};
use async_trait::async_trait;
use std::path::Path;

/// Turns a source document into page images plus an instructions file.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, document: &Path) -> Result<Extraction>;
}

/// Classifies extracted images against the document's instructions.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        image_filenames: &[String],
        instructions_filename: &str,
    ) -> Result<ClassificationResult>;
}

/// Persists a run's results and reports the identifier they were stored under.
///
/// The returned identifier is authoritative: callers use it rather than
/// recomputing one.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn store(
        &self,
        pdf_path: &Path,
        pdf_filename: &str,
        image_filenames: &[String],
        results: &ClassificationResult,
    ) -> Result<String>;
}
