//! Content hashing: a short, stable identifier for a document's bytes.
//!
//! The identifier names every artifact derived from a document (page images,
//! audio files, stored records), so two byte-identical PDFs share one set of
//! artifacts no matter what they are called on disk. The id is the SHA-1 hex
//! digest cut to [`CONTENT_ID_LEN`] characters, so it lines up with the
//! `{hash}-{step}.mp3` names other tools already produce for the same PDF.
//! This is naming, not security.

use crate::error::{Result, StepcastError};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Length of a content identifier in hex characters.
pub const CONTENT_ID_LEN: usize = 12;

/// Compute the content identifier of an in-memory byte slice.
pub fn content_id(bytes: &[u8]) -> String {
    let mut h = Sha1::new();
    h.update(bytes);
    truncate(format!("{:x}", h.finalize()))
}

/// Compute the content identifier of a file, streaming it in 1 MiB chunks.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut f = File::open(path).map_err(|e| StepcastError::io(path, e))?;
    let mut h = Sha1::new();
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = f.read(&mut buf).map_err(|e| StepcastError::io(path, e))?;
        if n == 0 {
            break;
        }
        h.update(&buf[..n]);
    }
    let id = truncate(format!("{:x}", h.finalize()));
    debug!("Hashed {} → {}", path.display(), id);
    Ok(id)
}

/// [`hash_file`] on the blocking pool, for callers on the async runtime.
pub async fn hash_file_async(path: &Path) -> Result<String> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || hash_file(&owned))
        .await
        .map_err(|e| StepcastError::Internal(format!("Hash task panicked: {}", e)))?
}

/// True if `s` has the shape of a content identifier.
pub fn is_content_id(s: &str) -> bool {
    s.len() == CONTENT_ID_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn truncate(mut hex: String) -> String {
    hex.truncate(CONTENT_ID_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn identical_bytes_give_identical_ids() {
        let a = content_id(b"%PDF-1.7 manual");
        let b = content_id(b"%PDF-1.7 manual");
        assert_eq!(a, b);
    }

    #[test]
    fn one_byte_change_gives_a_different_id() {
        let a = content_id(b"%PDF-1.7 manual");
        let b = content_id(b"%PDF-1.7 manuaL");
        assert_ne!(a, b);
    }

    #[test]
    fn id_is_twelve_lowercase_hex_chars() {
        for input in [&b""[..], b"x", &[0xffu8; 4096][..]] {
            let id = content_id(input);
            assert_eq!(id.len(), 12);
            assert!(is_content_id(&id), "not a content id: {id}");
        }
    }

    #[test]
    fn empty_input_matches_sha1_prefix() {
        // sha1("") = da39a3ee5e6b4b0d3255bfef95601890afd80709
        assert_eq!(content_id(b""), "da39a3ee5e6b");
    }

    #[test]
    fn manual_bytes_match_known_sha1_prefix() {
        let pdf = b"%PDF-1.4\nSANDSBERG table assembly\n%%EOF\n";
        assert_eq!(content_id(pdf), "fed88c5c7db3");
    }

    #[test]
    fn file_and_slice_agree() {
        let payload: Vec<u8> = (0..3_000_000u32).map(|i| (i % 251) as u8).collect();
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&payload).unwrap();
        assert_eq!(hash_file(tmp.path()).unwrap(), content_id(&payload));
    }

    #[tokio::test]
    async fn async_variant_agrees_with_blocking_one() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.4 async").unwrap();
        assert_eq!(
            hash_file_async(tmp.path()).await.unwrap(),
            hash_file(tmp.path()).unwrap()
        );
        let err = hash_file_async(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, StepcastError::Io { .. }), "got: {err:?}");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = hash_file(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, StepcastError::Io { .. }), "got: {err:?}");
    }

    #[test]
    fn is_content_id_rejects_uppercase_and_wrong_length() {
        assert!(!is_content_id("A1B2C3D4E5F6"));
        assert!(!is_content_id("a1b2c3"));
        assert!(is_content_id("a1b2c3d4e5f6"));
    }
}
