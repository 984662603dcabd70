//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn PipelineProgress>`] with
//! [`crate::orchestrate::Pipeline::with_progress`] to hear about each stage
//! as the run moves through it. The CLI uses this to drive a spinner; a
//! service could forward the same events to a websocket or a job table.
//!
//! # Example
//!
//! ```rust
//! use stepcast::{PipelineProgress, Stage};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct StageLog(Mutex<Vec<Stage>>);
//!
//! impl PipelineProgress for StageLog {
//!     fn on_stage_complete(&self, stage: Stage) {
//!         self.0.lock().unwrap().push(stage);
//!     }
//! }
//!
//! let log = StageLog::default();
//! log.on_stage_complete(Stage::Extract);
//! assert_eq!(*log.0.lock().unwrap(), vec![Stage::Extract]);
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A step of [`crate::orchestrate::Pipeline::run`], in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Extract,
    Classify,
    Speech,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Extract => "Extracting pages",
            Stage::Classify => "Classifying images",
            Stage::Speech => "Synthesizing speech",
            Stage::Persist => "Storing results",
        };
        f.write_str(label)
    }
}

/// Called by the pipeline as it moves through its stages.
///
/// All methods default to no-ops so implementations override only what they
/// need. The pipeline is sequential, but implementations must still be
/// `Send + Sync` because the pipeline itself may be moved across tasks.
pub trait PipelineProgress: Send + Sync {
    /// Called just before `stage` begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after `stage` finished without error.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after each audio file is written.
    ///
    /// # Arguments
    /// * `step`     — 1-indexed step number
    /// * `total`    — number of steps being narrated
    /// * `filename` — generated file name
    fn on_audio_generated(&self, step: u32, total: usize, filename: &str) {
        let _ = (step, total, filename);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl PipelineProgress for NoopProgress {}

/// Convenience alias for the type the pipeline stores.
pub type ProgressCallback = Arc<dyn PipelineProgress>;
