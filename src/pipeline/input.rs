//! Input validation: make sure a user-supplied path is a readable PDF.
//!
//! pdfium reports a missing or non-PDF file as an opaque load failure.
//! Checking existence, permissions and the `%PDF` magic bytes up front turns
//! those cases into errors that say what is actually wrong.

use crate::error::{Result, StepcastError};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with `%PDF`.
pub fn validate_pdf(path: &Path) -> Result<PathBuf> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(StepcastError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(f) => {
            let mut head = Vec::with_capacity(4);
            f.take(4)
                .read_to_end(&mut head)
                .map_err(|e| StepcastError::io(&path, e))?;
            if head != b"%PDF" {
                let mut magic = [0u8; 4];
                magic[..head.len()].copy_from_slice(&head);
                return Err(StepcastError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(StepcastError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(StepcastError::FileNotFound { path });
        }
    }

    debug!("Validated PDF: {}", path.display());
    Ok(path)
}

/// File-name component of a document path, for display and storage.
pub fn document_filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn accepts_pdf_magic() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n").unwrap();
        assert!(validate_pdf(tmp.path()).is_ok());
    }

    #[test]
    fn rejects_other_magic() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"PK\x03\x04zip").unwrap();
        match validate_pdf(tmp.path()) {
            Err(StepcastError::NotAPdf { magic, .. }) => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn short_file_is_not_a_pdf() {
        for body in [&b""[..], b"%P", b"%PD"] {
            let mut tmp = tempfile::NamedTempFile::new().unwrap();
            tmp.write_all(body).unwrap();
            match validate_pdf(tmp.path()) {
                Err(StepcastError::NotAPdf { magic, .. }) => {
                    assert_eq!(&magic[..body.len()], body);
                }
                other => panic!("expected NotAPdf for {body:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = validate_pdf(Path::new("/no/such/manual.pdf")).unwrap_err();
        assert!(matches!(err, StepcastError::FileNotFound { .. }));
    }

    #[test]
    fn filename_is_last_component() {
        assert_eq!(document_filename(Path::new("volume/test.pdf")), "test.pdf");
        assert_eq!(document_filename(Path::new("manual.pdf")), "manual.pdf");
    }
}
