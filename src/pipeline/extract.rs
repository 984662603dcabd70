//! PDF extraction: render every page to PNG and collect the page text.
//!
//! Artifacts land under `{work_dir}/{content_id}/`:
//!
//! ```text
//! volume/3f9a0c1d2e4b/
//!   images/page-001.png
//!   images/page-002.png
//!   instructions.txt
//! ```
//!
//! Naming by content id means re-running the same PDF rewrites the same
//! files instead of accumulating copies.
//!
//! ## Why spawn_blocking?
//!
//! pdfium-render wraps a C++ library with thread-local state; it must not run
//! on a Tokio worker thread. The whole extraction is moved to the blocking
//! pool in one go.

use crate::config::ExtractionConfig;
use crate::error::{Result, StepcastError};
use crate::hash;
use crate::output::Extraction;
use crate::pipeline::{input, Extractor};
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the instructions file inside a document's directory.
pub const INSTRUCTIONS_FILE: &str = "instructions.txt";

/// [`Extractor`] backed by pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumExtractor {
    work_dir: PathBuf,
    config: ExtractionConfig,
}

impl PdfiumExtractor {
    pub fn new(work_dir: impl Into<PathBuf>, config: ExtractionConfig) -> Self {
        Self {
            work_dir: work_dir.into(),
            config,
        }
    }
}

#[async_trait]
impl Extractor for PdfiumExtractor {
    async fn extract(&self, document: &Path) -> Result<Extraction> {
        let pdf_path = input::validate_pdf(document)?;
        let out_dir = self.work_dir.join(hash::hash_file(&pdf_path)?);
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || extract_blocking(&pdf_path, &out_dir, &config))
            .await
            .map_err(|e| StepcastError::Internal(format!("Extraction task panicked: {}", e)))?
    }
}

/// File name of the rendered image for a 1-indexed page.
pub fn page_image_name(page_num: usize) -> String {
    format!("page-{page_num:03}.png")
}

/// Bind to an explicit libpdfium, or the system one.
fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium> {
    let bindings = match library {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| StepcastError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

fn extract_blocking(
    pdf_path: &Path,
    out_dir: &Path,
    config: &ExtractionConfig,
) -> Result<Extraction> {
    let images_dir = out_dir.join("images");
    std::fs::create_dir_all(&images_dir).map_err(|e| StepcastError::io(&images_dir, e))?;

    let pdfium = bind_pdfium(config.pdfium_library.as_deref())?;
    let password = config.password.as_deref();

    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                StepcastError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                StepcastError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            StepcastError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let max_pixels = config.max_rendered_pixels.max(100) as i32;
    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels)
        .set_maximum_height(max_pixels);

    let mut image_filenames = Vec::with_capacity(pages.len() as usize);
    let mut instructions = String::new();

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            StepcastError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            }
        })?;
        let rendered = bitmap.as_image();
        let image_path = images_dir.join(page_image_name(page_num));
        rendered
            .save_with_format(&image_path, image::ImageFormat::Png)
            .map_err(|e| StepcastError::RasterisationFailed {
                page: page_num,
                detail: format!("PNG write to {} failed: {}", image_path.display(), e),
            })?;
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            rendered.width(),
            rendered.height()
        );
        image_filenames.push(image_path.to_string_lossy().into_owned());

        let text = match page.text() {
            Ok(t) => t.all(),
            Err(e) => {
                warn!("Page {}: no text layer ({:?})", page_num, e);
                String::new()
            }
        };
        instructions.push_str(&format!("--- page {} ---\n{}\n\n", page_num, text.trim()));
    }

    let instructions_path = out_dir.join(INSTRUCTIONS_FILE);
    std::fs::write(&instructions_path, &instructions)
        .map_err(|e| StepcastError::io(&instructions_path, e))?;

    info!(
        "Extracted {} images and {} chars of text into {}",
        image_filenames.len(),
        instructions.len(),
        out_dir.display()
    );

    Ok(Extraction {
        image_filenames,
        instructions_filename: instructions_path.to_string_lossy().into_owned(),
    })
}
