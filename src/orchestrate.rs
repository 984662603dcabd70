//! The pipeline orchestrator: extract → classify → report → speech → store.
//!
//! Stages run strictly in order and each consumes the previous one's output.
//! Nothing is retried and nothing is recovered: the first error is returned
//! as-is, and artifacts earlier stages already wrote stay on disk.

use crate::config::PipelineConfig;
use crate::error::{Result, StepcastError};
use crate::hash;
use crate::output::{ClassificationResult, InstructionReport, PipelineOutput};
use crate::pipeline::{input, Classifier, Extractor, ResultStore};
use crate::progress::{ProgressCallback, Stage};
use crate::speech::Synthesizer;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A configured pipeline. Adapters are injected; see [`crate::pipeline`].
pub struct Pipeline {
    extractor: Arc<dyn Extractor>,
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn ResultStore>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    progress: Option<ProgressCallback>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn ResultStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extractor,
            classifier,
            store,
            synthesizer: None,
            progress: None,
            config,
        }
    }

    /// Attach a synthesizer. Used only when `config.generate_speech` is set.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Process one document end to end.
    pub async fn run(&self, pdf_path: &Path) -> Result<PipelineOutput> {
        if self.config.generate_speech && self.synthesizer.is_none() {
            return Err(StepcastError::InvalidConfig(
                "speech generation requested but no synthesizer configured".into(),
            ));
        }

        let started = Instant::now();
        let pdf_filename = input::document_filename(pdf_path);
        info!("Processing {}", pdf_path.display());

        // ── Step 1: Extract ──────────────────────────────────────────────────
        self.stage_start(Stage::Extract);
        let extraction = self.extractor.extract(pdf_path).await?;
        self.stage_complete(Stage::Extract);
        info!(
            "Extracted {} images, instructions in {}",
            extraction.image_filenames.len(),
            extraction.instructions_filename
        );

        // ── Step 2: Classify ─────────────────────────────────────────────────
        self.stage_start(Stage::Classify);
        let results = self
            .classifier
            .classify(&extraction.image_filenames, &extraction.instructions_filename)
            .await?;
        self.stage_complete(Stage::Classify);

        // ── Step 3: Report ───────────────────────────────────────────────────
        let report = InstructionReport::from_results(&results);
        info!(
            "Found {} instructional images (total: {} images)",
            report.steps.len(),
            report.total_images
        );

        // ── Step 4: Speech (optional) ────────────────────────────────────────
        let local_id = hash::hash_file_async(pdf_path).await?;
        let audio_files = match self.synthesizer {
            Some(ref synth) if self.config.generate_speech => {
                self.stage_start(Stage::Speech);
                let files = self.narrate(synth.as_ref(), &local_id, &results).await?;
                self.stage_complete(Stage::Speech);
                files
            }
            _ => Vec::new(),
        };

        // ── Step 5: Persist ──────────────────────────────────────────────────
        self.stage_start(Stage::Persist);
        let document_id = self
            .store
            .store(pdf_path, &pdf_filename, &extraction.image_filenames, &results)
            .await?;
        self.stage_complete(Stage::Persist);

        if document_id != local_id {
            warn!(
                "Store reported id {} but content hash is {}; using the stored id",
                document_id, local_id
            );
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        info!("Pipeline complete: {} in {}ms", document_id, duration_ms);

        Ok(PipelineOutput {
            document_id,
            extraction,
            results,
            report,
            audio_files,
            duration_ms,
        })
    }

    /// Narrate every instructional match as steps `1..=n`, one at a time.
    async fn narrate(
        &self,
        synth: &dyn Synthesizer,
        document_id: &str,
        results: &ClassificationResult,
    ) -> Result<Vec<String>> {
        let total = results.instructional_count();
        let voice = self.config.voice.as_deref();
        let mut files = Vec::with_capacity(total);

        for (i, m) in results.instructional().enumerate() {
            let step = (i + 1) as u32;
            let Some(text) = m.narration() else {
                warn!("Step {}: no title or description, skipping speech", step);
                continue;
            };
            let filename = synth.synthesize(text, document_id, step, voice).await?;
            debug!("Step {}/{} → {}", step, total, filename);
            if let Some(ref cb) = self.progress {
                cb.on_audio_generated(step, total, &filename);
            }
            files.push(filename);
        }

        Ok(files)
    }

    fn stage_start(&self, stage: Stage) {
        if let Some(ref cb) = self.progress {
            cb.on_stage_start(stage);
        }
    }

    fn stage_complete(&self, stage: Stage) {
        if let Some(ref cb) = self.progress {
            cb.on_stage_complete(stage);
        }
    }
}
