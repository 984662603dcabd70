//! Error types for the stepcast library.
//!
//! Every failure in the pipeline is fatal: no stage recovers locally, so a
//! single enum, [`StepcastError`], covers the whole run. Variants are grouped
//! by the stage that raises them so callers can match on the family they care
//! about (for example, telling a rejected voice apart from a generic TTS
//! failure).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the stepcast library.
#[derive(Debug, Error)]
pub enum StepcastError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// A caller-supplied argument is unusable (blank text, step 0, …).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Vision errors ─────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The model replied, but not with the expected JSON shape.
    #[error("Vision reply could not be parsed as a classification: {detail}")]
    MalformedClassification { detail: String },

    // ── Speech errors ─────────────────────────────────────────────────────
    /// The TTS credential is absent. Raised before any request is sent.
    #[error("{var} is not set; a Fish Audio API key is required for speech synthesis")]
    MissingCredential { var: &'static str },

    /// The TTS service rejected the requested voice profile.
    #[error("Invalid voice ID: {voice}")]
    InvalidVoice { voice: String },

    /// The TTS service answered with any other non-success status.
    #[error("API Error ({status}): {body}")]
    RemoteApi { status: u16, body: String },

    /// The request never produced a response (DNS, connection reset, …).
    #[error("HTTP request to '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Reading or writing a file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StepcastError {
    /// Wrap an [`std::io::Error`] with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StepcastError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = StepcastError> = std::result::Result<T, E>;
