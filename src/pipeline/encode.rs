//! Image encoding: extracted image file → base64 `ImageData`.
//!
//! VLM APIs take images as base64 data embedded in the JSON request body.
//! Files are sent as-is when already PNG or JPEG; anything else is decoded
//! and re-encoded as PNG so the provider always receives a format it accepts.
//! `detail: "high"` keeps small print on assembly diagrams legible to
//! GPT-4-class models.

use crate::error::{Result, StepcastError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// MIME type for a file, judged by extension.
pub fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// Read an image file and wrap it for a multimodal request.
pub async fn encode_image_file(path: &Path) -> Result<ImageData> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| StepcastError::io(path, e))?;

    let (payload, mime) = match mime_for(path) {
        Some(mime) => (bytes, mime),
        None => (reencode_as_png(&bytes, path)?, "image/png"),
    };

    let b64 = STANDARD.encode(&payload);
    debug!("Encoded {} → {} bytes base64", path.display(), b64.len());

    Ok(ImageData::new(b64, mime).with_detail("high"))
}

fn reencode_as_png(bytes: &[u8], path: &Path) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).map_err(|e| {
        StepcastError::InvalidInput(format!("'{}' is not a readable image: {}", path.display(), e))
    })?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| StepcastError::Internal(format!("PNG encoding failed: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    #[test]
    fn mime_by_extension() {
        assert_eq!(mime_for(Path::new("a/page-001.png")), Some("image/png"));
        assert_eq!(mime_for(Path::new("a/photo.JPG")), Some("image/jpeg"));
        assert_eq!(mime_for(Path::new("a/scan.bmp")), None);
        assert_eq!(mime_for(Path::new("a/noext")), None);
    }

    #[tokio::test]
    async fn png_file_is_sent_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page-001.png");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        img.save_with_format(&path, image::ImageFormat::Png).unwrap();

        let data = encode_image_file(&path).await.expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(decoded, std::fs::read(&path).unwrap());
    }

    #[tokio::test]
    async fn unknown_extension_is_reencoded_as_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.img");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255])));
        img.save_with_format(&path, image::ImageFormat::Png).unwrap();

        let data = encode_image_file(&path).await.unwrap();
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).unwrap();
        assert_eq!(&decoded[..4], b"\x89PNG");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        match encode_image_file(Path::new("/nope/page-001.png")).await {
            Err(StepcastError::Io { .. }) => {}
            Err(other) => panic!("expected Io, got {other:?}"),
            Ok(_) => panic!("expected an error for a missing file"),
        }
    }
}
