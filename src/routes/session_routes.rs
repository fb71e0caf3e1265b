use std::sync::Arc;

use actix_web::{delete, get, post, web, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::documents::DocumentSource;
use crate::errors::{AppError, StorageError};
use crate::layouts::ImageAsset;
use crate::session::{SessionStore, UploadedDocument};
use crate::storage::{self, UploadKind};

#[derive(Debug, Deserialize)]
pub struct UploadsRequest {
    pub files: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub layout_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    pub image_index: usize,
}

#[post("/session")]
pub async fn create_session(store: web::Data<SessionStore>) -> Result<HttpResponse, AppError> {
    let session = store.create().await;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "session_id": session.id,
        "session": session
    })))
}

#[get("/session/{id}")]
pub async fn get_session(
    path: web::Path<String>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, AppError> {
    let session = store.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "total": session.queue.total(),
        "session": session
    })))
}

#[post("/session/{id}/reset")]
pub async fn reset_session(
    path: web::Path<String>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, AppError> {
    let session = store
        .update(&path.into_inner(), |session| {
            session.reset();
            Ok(session.clone())
        })
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "session": session
    })))
}

/// Register files already placed in the upload directory. PDFs have their
/// pages counted; images become layout assets in upload order.
#[post("/session/{id}/uploads")]
pub async fn register_uploads(
    path: web::Path<String>,
    body: web::Json<UploadsRequest>,
    store: web::Data<SessionStore>,
    documents: web::Data<Arc<dyn DocumentSource>>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let uploads_path = config.uploads_path();

    let mut uploaded_documents = Vec::new();
    let mut images = Vec::new();
    for file_name in &body.files {
        let kind = UploadKind::classify(file_name).ok_or_else(|| {
            warn!("Rejecting unsupported upload {}", file_name);
            StorageError::UnsupportedFile {
                name: file_name.clone(),
            }
        })?;
        storage::resolve_upload(&uploads_path, file_name)?;

        match kind {
            UploadKind::Document => {
                let total_pages = documents.page_count(file_name).await?;
                if total_pages > config.orders.max_pages {
                    return Err(AppError::BadRequest(format!(
                        "{} has {} pages; documents are limited to {}",
                        file_name, total_pages, config.orders.max_pages
                    )));
                }
                uploaded_documents.push(UploadedDocument {
                    handle: file_name.clone(),
                    name: file_name.clone(),
                    total_pages,
                });
            }
            UploadKind::Image => images.push(ImageAsset::new(file_name.clone(), file_name.clone())),
        }
    }

    info!(
        "Registering {} uploads for session {}",
        body.files.len(),
        session_id
    );
    let session = store
        .update(&session_id, move |session| {
            session.set_uploads(uploaded_documents, images);
            Ok(session.clone())
        })
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "session": session
    })))
}

#[post("/session/{id}/layout")]
pub async fn select_layout(
    path: web::Path<String>,
    body: web::Json<LayoutRequest>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, AppError> {
    let selection = store
        .update(&path.into_inner(), |session| {
            session.select_layout(&body.layout_id)?;
            Ok(session.selection.clone())
        })
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "selection": selection
    })))
}

#[post("/session/{id}/selection")]
pub async fn add_to_selection(
    path: web::Path<String>,
    body: web::Json<SelectionRequest>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, AppError> {
    let selection = store
        .update(&path.into_inner(), |session| {
            session.add_image(body.image_index)?;
            Ok(session.selection.clone())
        })
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "selection": selection
    })))
}

#[delete("/session/{id}/selection/{index}")]
pub async fn remove_from_selection(
    path: web::Path<(String, usize)>,
    store: web::Data<SessionStore>,
) -> Result<HttpResponse, AppError> {
    let (session_id, index) = path.into_inner();
    let (removed, selection) = store
        .update(&session_id, |session| {
            let removed = session.remove_image(index).is_some();
            Ok((removed, session.selection.clone()))
        })
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "removed": removed,
        "selection": selection
    })))
}
