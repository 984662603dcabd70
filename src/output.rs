//! Data types flowing between pipeline stages and out of a run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// What the extraction stage produced for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Paths of the extracted page images, in page order.
    pub image_filenames: Vec<String>,
    /// Path of the text file holding the document's instructions.
    pub instructions_filename: String,
}

/// Classification of a single image.
///
/// Fields the model returns beyond the documented ones are kept in `extra`
/// and round-trip into storage untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMatch {
    /// 0-based index into the image list sent to the classifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_index: Option<usize>,

    /// Image path, filled from `image_index` when the model omits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_filename: Option<String>,

    #[serde(default)]
    pub is_instruction: bool,

    #[serde(default)]
    pub instruction_title: String,

    #[serde(default)]
    pub instruction_description: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageMatch {
    /// Text to narrate for this match: the description, or the title when
    /// the description is blank.
    pub fn narration(&self) -> Option<&str> {
        [&self.instruction_description, &self.instruction_title]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }
}

/// Everything the vision stage returned for a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(default)]
    pub matches: Vec<ImageMatch>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClassificationResult {
    /// Matches flagged as instructional, in their original order.
    pub fn instructional(&self) -> impl Iterator<Item = &ImageMatch> {
        self.matches.iter().filter(|m| m.is_instruction)
    }

    pub fn instructional_count(&self) -> usize {
        self.instructional().count()
    }
}

/// Console summary of a classification.
///
/// Built from a [`ClassificationResult`] for display only; nothing stored
/// depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionReport {
    pub steps: Vec<ReportedStep>,
    pub total_images: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedStep {
    pub title: String,
    pub description: String,
}

/// Descriptions longer than this are cut in the report.
const REPORT_DESCRIPTION_CHARS: usize = 100;

impl InstructionReport {
    pub fn from_results(results: &ClassificationResult) -> Self {
        Self {
            steps: results
                .instructional()
                .map(|m| ReportedStep {
                    title: m.instruction_title.clone(),
                    description: m.instruction_description.clone(),
                })
                .collect(),
            total_images: results.matches.len(),
        }
    }
}

impl fmt::Display for InstructionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Found {} instructional images:", self.steps.len())?;
        for step in &self.steps {
            let preview: String = step
                .description
                .chars()
                .take(REPORT_DESCRIPTION_CHARS)
                .collect();
            writeln!(f)?;
            writeln!(f, "{}", step.title)?;
            writeln!(f, "  {}...", preview)?;
        }
        writeln!(f)?;
        write!(f, "Total: {} images", self.total_images)
    }
}

/// Result of a complete [`crate::orchestrate::Pipeline::run`].
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// Identifier the store reported for the persisted record.
    pub document_id: String,
    pub extraction: Extraction,
    pub results: ClassificationResult,
    pub report: InstructionReport,
    /// Generated audio file names, in step order. Empty when speech is off.
    pub audio_files: Vec<String>,
    pub duration_ms: u64,
}

/// A persisted document record, as written by [`crate::pipeline::store::JsonStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub hash: String,
    pub pdf_path: String,
    pub pdf_filename: String,
    pub image_filenames: Vec<String>,
    pub results: ClassificationResult,
    pub step_count: usize,
    /// Seconds since the UNIX epoch.
    pub stored_at: u64,
}

/// One entry of a store listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub hash: String,
    pub pdf_filename: String,
    pub step_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClassificationResult {
        serde_json::from_str(
            r#"{
                "matches": [
                    {"image_index": 0, "is_instruction": false},
                    {"image_index": 1, "is_instruction": true,
                     "instruction_title": "Attach Legs",
                     "instruction_description": "Screw the four legs into the corner brackets.",
                     "confidence": 0.92},
                    {"image_index": 2, "is_instruction": false, "instruction_title": ""}
                ],
                "model_notes": "ok"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn report_counts_instructional_and_total() {
        let report = InstructionReport::from_results(&sample());
        let text = report.to_string();
        assert!(text.contains("Found 1 instructional images"), "got: {text}");
        assert!(text.contains("Total: 3 images"), "got: {text}");
        assert!(text.contains("\nAttach Legs\n"));
        assert!(text.contains("  Screw the four legs"));
    }

    #[test]
    fn report_truncates_long_descriptions_by_chars() {
        let results = ClassificationResult {
            matches: vec![ImageMatch {
                is_instruction: true,
                instruction_title: "步骤".into(),
                instruction_description: "拧".repeat(150),
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = InstructionReport::from_results(&results).to_string();
        assert!(text.contains(&format!("  {}...", "拧".repeat(100))));
        assert!(!text.contains(&"拧".repeat(101)));
    }

    #[test]
    fn extra_fields_survive_a_round_trip() {
        let results = sample();
        assert_eq!(results.extra.get("model_notes"), Some(&Value::from("ok")));
        let back: ClassificationResult =
            serde_json::from_str(&serde_json::to_string(&results).unwrap()).unwrap();
        assert_eq!(back, results);
        assert_eq!(
            back.matches[1].extra.get("confidence"),
            Some(&Value::from(0.92))
        );
    }

    #[test]
    fn narration_falls_back_to_title() {
        let m = ImageMatch {
            instruction_title: "Insert Brackets".into(),
            instruction_description: "  ".into(),
            ..Default::default()
        };
        assert_eq!(m.narration(), Some("Insert Brackets"));
        assert_eq!(ImageMatch::default().narration(), None);
    }
}
