// src/core/image.rs — Resolving a user-supplied image path

use std::path::{Path, PathBuf};

use crate::infra::errors::CalaiError;

/// Extensions the estimation service accepts.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A validated, readable image on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    path: PathBuf,
    file_name: String,
    mime: &'static str,
}

impl ImageRef {
    /// Check that `path` names a readable image file of an accepted type.
    pub async fn resolve(path: &Path) -> Result<Self, CalaiError> {
        let invalid = |reason: String| CalaiError::InvalidImage {
            path: path.display().to_string(),
            reason,
        };

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let mime = match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            _ => {
                return Err(invalid(format!(
                    "unsupported file type (expected one of: {})",
                    ALLOWED_EXTENSIONS.join(", ")
                )))
            }
        };

        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| invalid(format!("not found or inaccessible: {e}")))?;
        if !meta.is_file() {
            return Err(invalid("not a regular file".into()));
        }
        tokio::fs::File::open(path)
            .await
            .map_err(|e| invalid(format!("not readable: {e}")))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("image.{ext}"));

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            mime,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    /// Handle recorded in the session log.
    pub fn reference(&self) -> String {
        self.path.display().to_string()
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>, CalaiError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| CalaiError::InvalidImage {
                path: self.reference(),
                reason: format!("not readable: {e}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_existing_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Food.JPG");
        std::fs::write(&path, b"\xff\xd8\xff").unwrap();

        let image = ImageRef::resolve(&path).await.unwrap();
        assert_eq!(image.file_name(), "Food.JPG");
        assert_eq!(image.mime(), "image/jpeg");
        assert_eq!(image.read_bytes().await.unwrap(), b"\xff\xd8\xff");
    }

    #[tokio::test]
    async fn test_missing_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageRef::resolve(&dir.path().join("nope.png")).await.unwrap_err();
        assert!(matches!(err, CalaiError::InvalidImage { .. }));
    }

    #[tokio::test]
    async fn test_directory_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("photos.png");
        std::fs::create_dir(&sub).unwrap();
        let err = ImageRef::resolve(&sub).await.unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meal.gif");
        std::fs::write(&path, b"GIF89a").unwrap();
        let err = ImageRef::resolve(&path).await.unwrap_err();
        assert!(err.to_string().contains("unsupported file type"));
    }
}
