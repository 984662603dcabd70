//! Content-addressed result storage on the local filesystem.
//!
//! ```text
//! volume/
//!   records/3f9a0c1d2e4b.json          one DocumentRecord per document
//!   instructions/3f9a0c1d2e4b-1.txt    "title\n\ndescription" per step
//!   instructions/3f9a0c1d2e4b-2.txt
//! ```
//!
//! The record key is the document's content id, so storing the same PDF
//! twice replaces its record rather than adding a second one. Records are
//! written to a temp file in the same directory and then renamed into place,
//! so a reader never sees a half-written JSON file.

use crate::error::{Result, StepcastError};
use crate::hash;
use crate::output::{ClassificationResult, DocumentRecord, DocumentSummary};
use crate::pipeline::ResultStore;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// JSON-file [`ResultStore`] rooted at a work directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn records_dir(&self) -> PathBuf {
        self.root.join("records")
    }

    pub fn instructions_dir(&self) -> PathBuf {
        self.root.join("instructions")
    }

    /// Path of the per-step text file for `(document_id, step)`.
    pub fn step_text_path(&self, document_id: &str, step: usize) -> PathBuf {
        self.instructions_dir()
            .join(format!("{document_id}-{step}.txt"))
    }

    /// Load the record stored under `document_id`, if any.
    pub async fn load(&self, document_id: &str) -> Result<Option<DocumentRecord>> {
        let path = self.records_dir().join(format!("{document_id}.json"));
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StepcastError::io(&path, e)),
        };
        let record = serde_json::from_slice(&raw).map_err(|e| {
            StepcastError::Internal(format!("corrupt record {}: {e}", path.display()))
        })?;
        Ok(Some(record))
    }

    /// Summaries of every stored document, sorted by file name then hash.
    ///
    /// Unreadable records are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let dir = self.records_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StepcastError::io(&dir, e)),
        };

        let mut out = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StepcastError::io(&dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = tokio::fs::read(&path)
                .await
                .ok()
                .and_then(|raw| serde_json::from_slice::<DocumentRecord>(&raw).ok());
            match parsed {
                Some(r) => out.push(DocumentSummary {
                    hash: r.hash,
                    pdf_filename: r.pdf_filename,
                    step_count: r.step_count,
                }),
                None => warn!("Skipping unreadable record {}", path.display()),
            }
        }

        out.sort_by(|a, b| {
            a.pdf_filename
                .cmp(&b.pdf_filename)
                .then_with(|| a.hash.cmp(&b.hash))
        });
        Ok(out)
    }

    fn store_blocking(
        &self,
        pdf_path: &Path,
        pdf_filename: &str,
        image_filenames: Vec<String>,
        results: ClassificationResult,
    ) -> Result<String> {
        let document_id = hash::hash_file(pdf_path)?;
        let step_count = self.write_step_texts(&document_id, &results)?;
        let image_count = image_filenames.len();

        let record = DocumentRecord {
            hash: document_id.clone(),
            pdf_path: pdf_path.to_string_lossy().into_owned(),
            pdf_filename: pdf_filename.to_string(),
            image_filenames,
            results,
            step_count,
            stored_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };
        let path = self.write_record(&record)?;
        debug!("Record written to {}", path.display());

        info!(
            "Stored {} ({} images, {} steps) as {}",
            pdf_filename,
            image_count,
            step_count,
            document_id
        );
        Ok(document_id)
    }

    fn write_record(&self, record: &DocumentRecord) -> Result<PathBuf> {
        let dir = self.records_dir();
        std::fs::create_dir_all(&dir).map_err(|e| StepcastError::io(&dir, e))?;
        let path = dir.join(format!("{}.json", record.hash));

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| StepcastError::Internal(format!("record serialisation: {e}")))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| StepcastError::io(&dir, e))?;
        tmp.write_all(&json).map_err(|e| StepcastError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| StepcastError::io(&path, e.error))?;
        Ok(path)
    }

    fn write_step_texts(&self, document_id: &str, results: &ClassificationResult) -> Result<usize> {
        let dir = self.instructions_dir();
        std::fs::create_dir_all(&dir).map_err(|e| StepcastError::io(&dir, e))?;

        let mut steps = 0;
        for m in results.instructional() {
            steps += 1;
            let path = self.step_text_path(document_id, steps);
            let body = format!(
                "{}\n\n{}",
                m.instruction_title.trim(),
                m.instruction_description.trim()
            );
            std::fs::write(&path, body).map_err(|e| StepcastError::io(&path, e))?;
        }
        Ok(steps)
    }
}

#[async_trait]
impl ResultStore for JsonStore {
    async fn store(
        &self,
        pdf_path: &Path,
        pdf_filename: &str,
        image_filenames: &[String],
        results: &ClassificationResult,
    ) -> Result<String> {
        let store = self.clone();
        let pdf_path = pdf_path.to_path_buf();
        let pdf_filename = pdf_filename.to_string();
        let image_filenames = image_filenames.to_vec();
        let results = results.clone();

        tokio::task::spawn_blocking(move || {
            store.store_blocking(&pdf_path, &pdf_filename, image_filenames, results)
        })
        .await
        .map_err(|e| StepcastError::Internal(format!("Store task panicked: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ImageMatch;

    fn write_pdf(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    fn results() -> ClassificationResult {
        ClassificationResult {
            matches: vec![
                ImageMatch {
                    image_index: Some(0),
                    ..Default::default()
                },
                ImageMatch {
                    image_index: Some(1),
                    is_instruction: true,
                    instruction_title: "Prepare Workspace".into(),
                    instruction_description: "Place the frame upside down on a soft surface.".into(),
                    ..Default::default()
                },
                ImageMatch {
                    image_index: Some(2),
                    is_instruction: true,
                    instruction_title: "Attach Legs".into(),
                    instruction_description: "Screw the legs into the brackets.".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn store_returns_content_id_and_writes_record() {
        let docs = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let pdf = write_pdf(docs.path(), "table.pdf", b"%PDF-1.4 table manual");

        let store = JsonStore::new(work.path());
        let id = store
            .store(&pdf, "table.pdf", &["a.png".into(), "b.png".into(), "c.png".into()], &results())
            .await
            .unwrap();
        assert_eq!(id, hash::content_id(b"%PDF-1.4 table manual"));

        let record = store.load(&id).await.unwrap().expect("record exists");
        assert_eq!(record.pdf_filename, "table.pdf");
        assert_eq!(record.step_count, 2);
        assert_eq!(record.image_filenames.len(), 3);
        assert_eq!(record.results, results());
    }

    #[tokio::test]
    async fn step_texts_use_title_blank_line_description() {
        let docs = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let pdf = write_pdf(docs.path(), "t.pdf", b"%PDF-1.4 t");

        let store = JsonStore::new(work.path());
        let id = store.store(&pdf, "t.pdf", &[], &results()).await.unwrap();

        let first = std::fs::read_to_string(store.step_text_path(&id, 1)).unwrap();
        assert_eq!(first, "Prepare Workspace\n\nPlace the frame upside down on a soft surface.");
        let second = std::fs::read_to_string(store.step_text_path(&id, 2)).unwrap();
        assert!(second.starts_with("Attach Legs\n\n"));
        assert!(!store.step_text_path(&id, 3).exists());
    }

    #[tokio::test]
    async fn storing_same_bytes_twice_keeps_one_record() {
        let docs = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let a = write_pdf(docs.path(), "a.pdf", b"%PDF-1.4 same");
        let b = write_pdf(docs.path(), "b.pdf", b"%PDF-1.4 same");
        let c = write_pdf(docs.path(), "c.pdf", b"%PDF-1.4 other");

        let store = JsonStore::new(work.path());
        let id_a = store.store(&a, "a.pdf", &[], &results()).await.unwrap();
        let id_b = store.store(&b, "b.pdf", &[], &results()).await.unwrap();
        let id_c = store.store(&c, "c.pdf", &[], &ClassificationResult::default()).await.unwrap();
        assert_eq!(id_a, id_b);
        assert_ne!(id_a, id_c);

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].pdf_filename, "b.pdf");
        assert_eq!(listed[0].step_count, 2);
        assert_eq!(listed[1].pdf_filename, "c.pdf");
        assert_eq!(listed[1].step_count, 0);
    }

    #[test]
    fn store_completes_on_a_single_threaded_runtime() {
        let docs = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let pdf = write_pdf(docs.path(), "manual.pdf", b"%PDF-1.4 single thread");
        let store = JsonStore::new(work.path());

        let id = tokio_test::block_on(store.store(&pdf, "manual.pdf", &[], &results())).unwrap();

        assert_eq!(id, hash::hash_file(&pdf).unwrap());
        assert!(store.records_dir().join(format!("{id}.json")).is_file());
        assert!(store.step_text_path(&id, 1).is_file());
    }

    #[tokio::test]
    async fn list_on_empty_root_is_empty() {
        let work = tempfile::tempdir().unwrap();
        let store = JsonStore::new(work.path().join("never-created"));
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.load("a1b2c3d4e5f6").await.unwrap().is_none());
    }

    #[test]
    fn corrupt_records_are_skipped_in_listing() {
        let work = tempfile::tempdir().unwrap();
        let store = JsonStore::new(work.path());
        std::fs::create_dir_all(store.records_dir()).unwrap();
        std::fs::write(store.records_dir().join("broken.json"), b"{not json").unwrap();
        let listed = tokio_test::block_on(store.list()).unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn missing_pdf_fails_without_writing() {
        let work = tempfile::tempdir().unwrap();
        let store = JsonStore::new(work.path());
        let err = store
            .store(Path::new("/no/such.pdf"), "such.pdf", &[], &results())
            .await
            .unwrap_err();
        assert!(matches!(err, StepcastError::Io { .. }));
        assert!(!store.records_dir().exists());
    }
}
