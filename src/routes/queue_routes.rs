use actix_web::{delete, get, post, web, HttpResponse};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::composer::DocumentComposer;
use crate::config::Config;
use crate::errors::{AppError, QueueError, StorageError};
use crate::pricing::{ColorMode, PrintSettings};
use crate::queue::{QueueItem, QueueItemId};
use crate::session::SessionStore;
use crate::storage;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueDocumentRequest {
    pub handle: String,
    #[serde(default)]
    pub settings: PrintSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueLayoutRequest {
    #[serde(default = "default_copies")]
    pub copies: u32,
    #[serde(default = "default_color_mode")]
    pub color_mode: ColorMode,
}

fn default_copies() -> u32 {
    1
}

fn default_color_mode() -> ColorMode {
    ColorMode::Color
}

#[post("/session/{id}/queue/document")]
pub async fn queue_document(
    path: web::Path<String>,
    body: web::Json<QueueDocumentRequest>,
    store: web::Data<SessionStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    let settings = request.settings.clamped(config.orders.max_copies);

    let (item, total) = store
        .update(&path.into_inner(), |session| {
            let document = session.document(&request.handle).ok_or_else(|| {
                StorageError::FileNotFound {
                    path: request.handle.clone(),
                }
            })?;
            let item = QueueItem::document(document.name.clone(), document.total_pages, settings)
                .require_pages()?;
            session.queue.add(item.clone());
            Ok((item, session.queue.total()))
        })
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "item": item,
        "total": total
    })))
}

/// Compose the current image selection into a page, save it and queue it.
///
/// Composition runs without holding the session lock. The queue is only
/// touched once the page is safely on disk.
#[post("/session/{id}/queue/layout")]
pub async fn queue_layout(
    path: web::Path<String>,
    body: web::Json<QueueLayoutRequest>,
    store: web::Data<SessionStore>,
    composer: web::Data<DocumentComposer>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let copies = body.copies.clamp(1, config.orders.max_copies.max(1));
    let color_mode = body.color_mode;

    let snapshot = store.get(&session_id).await?;
    let layout = snapshot.selection.layout();
    let images = snapshot.selection.images().to_vec();
    if images.is_empty() {
        return Err(QueueError::EmptySelection.into());
    }

    info!(
        "Composing {} images on layout {} for session {}",
        images.len(),
        layout.id,
        session_id
    );
    let composed = composer.compose(&images, layout, color_mode).await?;

    let file_name = format!(
        "photo-print-{}-{}.{}",
        layout.id,
        chrono::Utc::now().timestamp_millis(),
        composed.page.extension
    );
    let output_path = storage::save_artifact(&config.outputs_path(), &file_name, &composed.page).await?;

    let item = QueueItem::image_layout(layout, images, copies, color_mode, file_name.clone())?;
    let result = store
        .update(&session_id, |session| {
            session.queue.add(item.clone());
            Ok(session.queue.total())
        })
        .await;

    let total = match result {
        Ok(total) => total,
        Err(e) => {
            error!("Could not queue {} for session {}: {}", file_name, session_id, e);
            if let Err(remove_err) = tokio::fs::remove_file(&output_path).await {
                warn!("Failed to remove {:?}: {}", output_path, remove_err);
            }
            return Err(e);
        }
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "item": item,
        "total": total,
        "url": format!("/outputs/{}", file_name)
    })))
}

#[delete("/session/{id}/queue/{item}")]
pub async fn remove_queue_item(
    path: web::Path<(String, String)>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, AppError> {
    let (session_id, item) = path.into_inner();
    let item_id: QueueItemId = item
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid queue item id: {}", item)))?;

    let (removed, total) = store
        .update(&session_id, |session| {
            let removed = session.queue.remove(item_id).is_some();
            Ok((removed, session.queue.total()))
        })
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "removed": removed,
        "total": total
    })))
}

/// Final totals plus the per-document options handed to the print backend.
#[get("/session/{id}/checkout")]
pub async fn checkout(
    path: web::Path<String>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, AppError> {
    let session = store.get(&path.into_inner()).await?;
    if session.queue.is_empty() {
        return Err(QueueError::Empty.into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "summary": session.queue.summary(),
        "printOptions": session.queue.print_options(),
        "items": session.queue.items()
    })))
}
