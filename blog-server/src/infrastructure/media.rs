use std::path::PathBuf;

use image::ImageFormat;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::error::DomainError;

const INVALID_IMAGE: &str = "Upload a valid image. The file you uploaded was either not an image \
                             or a corrupted image.";

/// A file part received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Stores uploaded images on the local filesystem under `root/images`.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url_prefix: String,
    max_bytes: usize,
}

impl MediaStorage {
    pub fn new(root: PathBuf, url_prefix: String, max_bytes: usize) -> Self {
        Self {
            root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Rejects files that are too large or whose bytes do not decode as a
    /// JPEG, PNG, GIF or WebP image. Returns the extension of the detected format.
    ///
    /// The client's Content-Type is ignored.
    pub fn check_image(&self, file: &UploadedFile) -> Result<&'static str, String> {
        if file.bytes.len() > self.max_bytes {
            return Err(format!(
                "The file is too large (limit is {} KB).",
                self.max_bytes / 1024
            ));
        }
        let format = image::guess_format(&file.bytes).map_err(|_| INVALID_IMAGE.to_string())?;
        let ext = extension_for(format).ok_or_else(|| INVALID_IMAGE.to_string())?;
        image::load_from_memory_with_format(&file.bytes, format).map_err(|e| {
            debug!(filename = %file.filename, "upload does not decode: {}", e);
            INVALID_IMAGE.to_string()
        })?;
        Ok(ext)
    }

    /// Writes the image and returns its path relative to the media root.
    pub async fn save_image(&self, file: &UploadedFile) -> Result<String, DomainError> {
        let ext = self.check_image(file).map_err(DomainError::Validation)?;
        let relative = format!("images/{}.{}", Uuid::new_v4(), ext);
        let target = self.root.join(&relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                error!("failed to create media directory {:?}: {}", parent, e);
                DomainError::Internal(e.to_string())
            })?;
        }
        tokio::fs::write(&target, &file.bytes).await.map_err(|e| {
            error!("failed to store upload {:?}: {}", target, e);
            DomainError::Internal(e.to_string())
        })?;

        info!(
            path = %relative,
            size = file.bytes.len(),
            original = %file.filename,
            declared = %file.content_type,
            "image stored"
        );
        Ok(relative)
    }

    pub fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.url_prefix, relative.trim_start_matches('/'))
    }
}

fn extension_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::Png => Some("png"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::WebP => Some("webp"),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, RgbImage};

    use super::*;

    /// Encodes a small real image in the given format.
    pub(crate) fn encoded(format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(4, 4))
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    pub(crate) fn upload(content_type: &str, bytes: Vec<u8>) -> UploadedFile {
        UploadedFile {
            filename: "photo.png".into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    fn storage(max_bytes: usize) -> MediaStorage {
        let root = std::env::temp_dir().join(format!("blogicum-media-{}", Uuid::new_v4()));
        MediaStorage::new(root, "/media/".into(), max_bytes)
    }

    #[test]
    fn check_image_detects_format_from_bytes() {
        let storage = storage(64 * 1024);
        let png = encoded(ImageFormat::Png);
        let jpeg = encoded(ImageFormat::Jpeg);
        let gif = encoded(ImageFormat::Gif);

        assert_eq!(storage.check_image(&upload("image/png", png)), Ok("png"));
        assert_eq!(storage.check_image(&upload("image/png", jpeg)), Ok("jpg"));
        assert_eq!(
            storage.check_image(&upload("application/octet-stream", gif)),
            Ok("gif")
        );
    }

    #[test]
    fn check_image_enforces_size_limit() {
        let png = encoded(ImageFormat::Png);
        let exact = storage(png.len());
        assert!(exact.check_image(&upload("image/png", png.clone())).is_ok());

        let smaller = storage(png.len() - 1);
        let err = smaller.check_image(&upload("image/png", png)).unwrap_err();
        assert!(err.contains("too large"));
    }

    #[test]
    fn html_labelled_as_png_is_rejected() {
        let storage = storage(1024);
        let html = upload("image/png", b"<html><script>alert(1)</script></html>".to_vec());
        assert_eq!(storage.check_image(&html), Err(INVALID_IMAGE.to_string()));
    }

    #[test]
    fn truncated_image_is_rejected() {
        let storage = storage(64 * 1024);
        let mut png = encoded(ImageFormat::Png);
        png.truncate(png.len() / 2);
        assert!(storage.check_image(&upload("image/png", png)).is_err());
    }

    #[test]
    fn unsupported_formats_are_rejected() {
        let storage = storage(64 * 1024);
        let bmp = encoded(ImageFormat::Bmp);
        assert!(storage.check_image(&upload("image/bmp", bmp)).is_err());
    }

    #[test]
    fn urls_join_prefix_and_path() {
        assert_eq!(storage(1).url("images/a.png"), "/media/images/a.png");
    }

    #[tokio::test]
    async fn save_image_uses_detected_extension() {
        let storage = storage(64 * 1024);
        let jpeg = encoded(ImageFormat::Jpeg);
        let size = jpeg.len();
        let relative = storage.save_image(&upload("image/png", jpeg)).await.unwrap();

        assert!(relative.starts_with("images/"));
        assert!(relative.ends_with(".jpg"));
        let written = tokio::fs::read(storage.root().join(&relative)).await.unwrap();
        assert_eq!(written.len(), size);

        tokio::fs::remove_dir_all(storage.root()).await.unwrap();
    }

    #[tokio::test]
    async fn save_image_refuses_non_image_bytes() {
        let storage = storage(1024);
        let html = upload("image/png", b"<html></html>".to_vec());
        let err = storage.save_image(&html).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert!(!storage.root().join("images").exists());
    }
}
