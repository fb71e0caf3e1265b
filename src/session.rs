use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult, SelectionError};
use crate::layouts::{self, ImageAsset, LayoutSelection};
use crate::queue::PrintQueue;

/// An uploaded PDF and its page count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub handle: String,
    pub name: String,
    pub total_pages: u32,
}

/// One customer's visit: what they uploaded, the image layout they are
/// arranging and the jobs they have queued.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub created_at: String,
    pub documents: Vec<UploadedDocument>,
    pub images: Vec<ImageAsset>,
    pub selection: LayoutSelection,
    pub queue: PrintQueue,
}

impl Session {
    /// Create a new session with a unique ID and current timestamp
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339(),
            documents: Vec::new(),
            images: Vec::new(),
            selection: LayoutSelection::new(layouts::default_layout(), &[]),
            queue: PrintQueue::new(),
        }
    }

    /// Replace the uploaded files. The image selection is reseeded for the
    /// current layout; the queue is kept.
    pub fn set_uploads(&mut self, documents: Vec<UploadedDocument>, images: Vec<ImageAsset>) {
        info!(
            "Session {} now has {} documents and {} images",
            self.id,
            documents.len(),
            images.len()
        );
        self.documents = documents;
        self.images = images;
        let layout = self.selection.layout();
        self.selection.select_layout(layout, &self.images);
    }

    pub fn document(&self, handle: &str) -> Option<&UploadedDocument> {
        self.documents.iter().find(|doc| doc.handle == handle)
    }

    pub fn select_layout(&mut self, layout_id: &str) -> Result<&[ImageAsset], SelectionError> {
        let layout = layouts::find_layout(layout_id)?;
        Ok(self.selection.select_layout(layout, &self.images))
    }

    /// Add the uploaded image at `index` to the layout.
    pub fn add_image(&mut self, index: usize) -> Result<(), SelectionError> {
        let asset = self
            .images
            .get(index)
            .cloned()
            .ok_or(SelectionError::UnknownAsset { index })?;
        self.selection.add_image(asset)
    }

    pub fn remove_image(&mut self, position: usize) -> Option<ImageAsset> {
        self.selection.remove_image(position)
    }

    /// Back to an empty upload screen.
    pub fn reset(&mut self) {
        info!("Resetting session {}", self.id);
        self.documents.clear();
        self.images.clear();
        self.selection = LayoutSelection::new(layouts::default_layout(), &[]);
        self.queue.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory sessions. Every mutation runs under the write lock, so readers
/// never observe a half-applied change to a queue.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Session {
        let session = Session::new();
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        info!("Created session {}", session.id);
        session
    }

    /// Copy of the session as it is right now.
    pub async fn get(&self, id: &str) -> AppResult<Session> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::SessionNotFound { id: id.to_string() })
    }

    /// Apply `f` to the session atomically.
    pub async fn update<T, F>(&self, id: &str, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Session) -> AppResult<T>,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| AppError::SessionNotFound { id: id.to_string() })?;
        f(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueItem;
    use crate::pricing::PrintSettings;

    fn images(count: usize) -> Vec<ImageAsset> {
        (0..count)
            .map(|i| ImageAsset::new(format!("{}.jpg", i), format!("{}.jpg", i)))
            .collect()
    }

    #[test]
    fn test_new_session() {
        let session = Session::new();
        assert!(!session.id.is_empty());
        assert!(session.selection.is_empty());
        assert_eq!(session.selection.layout().id, "1x1");
        assert_eq!(session.queue.total(), 0);
    }

    #[test]
    fn test_uploads_seed_first_image() {
        let mut session = Session::new();
        session.set_uploads(Vec::new(), images(3));
        assert_eq!(session.selection.images(), &session.images[..1]);
    }

    #[test]
    fn test_layout_switch_and_manual_edits() {
        let mut session = Session::new();
        session.set_uploads(Vec::new(), images(5));
        session.select_layout("2x2").unwrap();
        session.remove_image(0);
        session.add_image(4).unwrap();
        let names: Vec<&str> = session
            .selection
            .images()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["1.jpg", "2.jpg", "3.jpg", "4.jpg"]);

        assert!(matches!(
            session.add_image(0),
            Err(SelectionError::CapacityExceeded { capacity: 4 })
        ));
        assert!(matches!(
            session.add_image(9),
            Err(SelectionError::UnknownAsset { index: 9 })
        ));

        let reseeded = session.select_layout("2x1").unwrap();
        assert_eq!(reseeded, &images(5)[..2]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = Session::new();
        session.set_uploads(
            vec![UploadedDocument {
                handle: "a.pdf".to_string(),
                name: "a.pdf".to_string(),
                total_pages: 2,
            }],
            images(2),
        );
        session
            .queue
            .add(QueueItem::document("a.pdf", 2, PrintSettings::default()));

        session.reset();
        assert!(session.documents.is_empty());
        assert!(session.images.is_empty());
        assert!(session.selection.is_empty());
        assert!(session.queue.is_empty());
    }

    #[tokio::test]
    async fn test_store_update_and_missing_session() {
        let store = SessionStore::new();
        let session = store.create().await;

        let total = store
            .update(&session.id, |s| {
                s.queue
                    .add(QueueItem::document("a.pdf", 3, PrintSettings::default()));
                Ok(s.queue.total())
            })
            .await
            .unwrap();
        assert_eq!(total, 6);
        assert_eq!(store.get(&session.id).await.unwrap().queue.len(), 1);

        assert!(matches!(
            store.get("nope").await,
            Err(AppError::SessionNotFound { .. })
        ));
    }
}
