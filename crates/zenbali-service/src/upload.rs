//! Event image storage.
//!
//! Images are written to the configured upload directory under a random name
//! and served back from `/uploads`.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Public URL prefix for stored images.
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

/// Accepted image extensions, lower case with the leading dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];

/// Error type for image uploads.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The file exceeds the configured size cap.
    #[error("file too large (max {max_bytes} bytes)")]
    FileTooLarge {
        /// The configured cap.
        max_bytes: usize,
    },

    /// The file extension is not an accepted image type.
    #[error("invalid file type {0:?}, allowed: jpg, jpeg, png, webp")]
    InvalidFileType(String),

    /// Writing to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores event images on the local filesystem.
#[derive(Debug, Clone)]
pub struct UploadService {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadService {
    /// Create an upload service writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    /// Directory images are stored in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Size cap in bytes.
    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Store an image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `FileTooLarge` or `InvalidFileType` for rejected files and `Io`
    /// if the file cannot be written.
    pub async fn save_image(&self, bytes: &[u8], filename: &str) -> Result<String, UploadError> {
        if bytes.len() > self.max_bytes {
            return Err(UploadError::FileTooLarge {
                max_bytes: self.max_bytes,
            });
        }

        let ext = extension_of(filename)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| UploadError::InvalidFileType(filename.to_string()))?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let name = format!("{}{ext}", Uuid::new_v4());
        let path = self.dir.join(&name);
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }

        tracing::debug!(file = %name, size = bytes.len(), "Stored event image");

        Ok(format!("{UPLOAD_URL_PREFIX}{name}"))
    }

    /// Remove a previously stored image. Missing files and foreign URLs are ignored.
    pub async fn delete_image(&self, image_url: &str) {
        let Some(name) = image_url.strip_prefix(UPLOAD_URL_PREFIX) else {
            return;
        };
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            tracing::warn!(image_url = %image_url, "Refusing to delete suspicious image path");
            return;
        }

        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => tracing::debug!(file = %name, "Deleted event image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(error = %e, file = %name, "Failed to delete event image"),
        }
    }
}

/// Lower-cased extension including the dot, e.g. `.png`.
fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}
