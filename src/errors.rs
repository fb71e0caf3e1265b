use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("No images selected for the layout")]
    EmptySelection,

    #[error("Failed to read image {name}: {reason}")]
    Source { name: String, reason: String },

    #[error("Failed to decode image {name}: {reason}")]
    Decode { name: String, reason: String },

    #[error("Failed to render page: {0}")]
    Render(String),

    #[error("Failed to export page: {0}")]
    Export(String),
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Layout holds at most {capacity} images")]
    CapacityExceeded { capacity: usize },

    #[error("Unknown layout: {id}")]
    UnknownLayout { id: String },

    #[error("No uploaded image at position {index}")]
    UnknownAsset { index: usize },
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Please add at least one image to the layout")]
    EmptySelection,

    #[error("No pages selected to print")]
    NoPagesSelected,

    #[error("Please add at least one item to the queue")]
    Empty,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document not found: {path}")]
    NotFound { path: String },

    #[error("Document I/O error: {0}")]
    IoError(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid render DPI: {value}")]
    InvalidDpi { value: String },

    #[error("Invalid copy limit: {value}")]
    InvalidMaxCopies { value: String },

    #[error("Invalid page limit: {value}")]
    InvalidMaxPages { value: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported file type: {name}. Please upload PDF or image files only.")]
    UnsupportedFile { name: String },

    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Initialization(_) => 500,
            AppError::Composition(CompositionError::EmptySelection) => 422,
            AppError::Composition(CompositionError::Decode { .. }) => 422,
            AppError::Composition(_) => 500,
            AppError::Selection(SelectionError::CapacityExceeded { .. }) => 409,
            AppError::Selection(_) => 404,
            AppError::Queue(_) => 422,
            AppError::Document(DocumentError::NotFound { .. }) => 404,
            AppError::Document(_) => 500,
            AppError::Config(_) => 500,
            AppError::Storage(StorageError::FileNotFound { .. }) => 404,
            AppError::Storage(StorageError::UnsupportedFile { .. }) => 415,
            AppError::Storage(StorageError::InvalidPath(_)) => 400,
            AppError::Storage(_) => 500,
            AppError::SessionNotFound { .. } => 404,
            AppError::BadRequest(_) => 400,
        }
    }

    pub fn error_response(&self) -> serde_json::Value {
        serde_json::json!({
            "ok": false,
            "error": self.to_string(),
            "error_type": self.error_type()
        })
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::Initialization(_) => "initialization_error",
            AppError::Composition(_) => "composition_error",
            AppError::Selection(_) => "selection_error",
            AppError::Queue(_) => "queue_error",
            AppError::Document(_) => "document_error",
            AppError::Config(_) => "config_error",
            AppError::Storage(_) => "storage_error",
            AppError::SessionNotFound { .. } => "session_error",
            AppError::BadRequest(_) => "bad_request",
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::from_u16(AppError::status_code(self))
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(actix_web::ResponseError::status_code(self))
            .json(AppError::error_response(self))
    }
}
