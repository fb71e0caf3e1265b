// Page counting for uploaded PDF documents

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::DocumentError;

/// Anything that can tell how many pages an uploaded document has.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Total pages of the document behind `handle`, at least 1.
    async fn page_count(&self, handle: &str) -> Result<u32, DocumentError>;
}

/// Reads PDFs from the storage directory.
pub struct PdfDocumentSource {
    base_path: PathBuf,
}

impl PdfDocumentSource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        PdfDocumentSource {
            base_path: base_path.into(),
        }
    }
}

#[async_trait]
impl DocumentSource for PdfDocumentSource {
    async fn page_count(&self, handle: &str) -> Result<u32, DocumentError> {
        let path = self.base_path.join(handle);
        if !path.exists() {
            return Err(DocumentError::NotFound {
                path: path.display().to_string(),
            });
        }

        let data = tokio::fs::read(&path).await?;
        let name = handle.to_string();
        let pages = tokio::task::spawn_blocking(move || count_pages(&name, &data))
            .await
            .unwrap_or_else(|e| {
                warn!("Page counting task failed: {}", e);
                1
            });
        Ok(pages)
    }
}

/// Pages in a PDF. Unreadable documents count as a single page so the
/// customer can still configure and pay for them.
pub fn count_pages(name: &str, data: &[u8]) -> u32 {
    match lopdf::Document::load_mem(data) {
        Ok(document) => {
            let pages = document.get_pages().len() as u32;
            debug!("{} has {} pages", name, pages);
            pages.max(1)
        }
        Err(e) => {
            warn!("Could not read pages of {}, assuming 1: {}", name, e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object};

    fn pdf_with_pages(count: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..count)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_counts_pdf_pages() {
        assert_eq!(count_pages("three.pdf", &pdf_with_pages(3)), 3);
    }

    #[test]
    fn test_garbage_counts_as_one_page() {
        assert_eq!(count_pages("junk.pdf", b"definitely not a pdf"), 1);
    }

    #[tokio::test]
    async fn test_source_reads_from_storage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.pdf"), pdf_with_pages(5)).unwrap();
        let source = PdfDocumentSource::new(dir.path());

        assert_eq!(source.page_count("notes.pdf").await.unwrap(), 5);
        assert!(matches!(
            source.page_count("missing.pdf").await,
            Err(DocumentError::NotFound { .. })
        ));
    }
}
