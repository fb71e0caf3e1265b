// Upload lookup and artifact output on the local filesystem

use std::path::{Path, PathBuf};

use image::ImageFormat;
use serde::Serialize;
use tracing::{info, warn};

use crate::composer::RenderedPage;
use crate::errors::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Document,
    Image,
}

impl UploadKind {
    /// PDFs are documents; anything the image decoder knows by extension is
    /// an image; everything else is refused.
    pub fn classify(file_name: &str) -> Option<Self> {
        let path = Path::new(file_name);
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if extension == "pdf" {
            return Some(UploadKind::Document);
        }
        ImageFormat::from_extension(&extension).map(|_| UploadKind::Image)
    }
}

/// Resolve a bare file name inside `base`, refusing anything that could
/// escape it.
pub fn resolve_upload(base: &Path, file_name: &str) -> Result<PathBuf, StorageError> {
    if file_name.is_empty()
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains("..")
    {
        return Err(StorageError::InvalidPath(file_name.to_string()));
    }

    let path = base.join(file_name);
    if !path.exists() {
        warn!("Upload not found at path: {:?}", path);
        return Err(StorageError::FileNotFound {
            path: file_name.to_string(),
        });
    }
    Ok(path)
}

/// Write a composed page to `dir/file_name`, creating `dir` if needed.
pub async fn save_artifact(
    dir: &Path,
    file_name: &str,
    page: &RenderedPage,
) -> Result<PathBuf, StorageError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, &page.bytes).await?;
    info!("Wrote {} bytes to {:?}", page.bytes.len(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_classify_uploads() {
        assert_eq!(UploadKind::classify("thesis.PDF"), Some(UploadKind::Document));
        assert_eq!(UploadKind::classify("cat.jpeg"), Some(UploadKind::Image));
        assert_eq!(UploadKind::classify("scan.png"), Some(UploadKind::Image));
        assert_eq!(UploadKind::classify("notes.docx"), None);
        assert_eq!(UploadKind::classify("README"), None);
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["../etc/passwd", "a/b.pdf", "", "..\\x.pdf"] {
            assert!(matches!(
                resolve_upload(dir.path(), name),
                Err(StorageError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn test_resolve_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_upload(dir.path(), "missing.pdf"),
            Err(StorageError::FileNotFound { .. })
        ));

        std::fs::write(dir.path().join("here.pdf"), b"%PDF").unwrap();
        assert_eq!(
            resolve_upload(dir.path(), "here.pdf").unwrap(),
            dir.path().join("here.pdf")
        );
    }

    #[tokio::test]
    async fn test_save_artifact_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = dir.path().join("outputs");
        let page = RenderedPage {
            bytes: Bytes::from_static(b"png"),
            extension: "png",
        };

        let path = save_artifact(&outputs, "page.png", &page).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"png");
    }
}
