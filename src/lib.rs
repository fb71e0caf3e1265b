// Library module organization

pub mod composer;
pub mod config;
pub mod documents;
pub mod errors;
pub mod layouts;
pub mod page_range;
pub mod pricing;
pub mod queue;
pub mod render;
pub mod routes;
pub mod session;
pub mod storage;

// Re-export commonly used types for convenience
pub use composer::{DocumentComposer, ImageSource, PageCanvas, PageGeometry, PageRenderer};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use layouts::{ImageAsset, Layout, LayoutSelection, LAYOUTS};
pub use page_range::{expand, PageSet};
pub use pricing::{price, ColorMode, Duplex, PrintSettings, Quote};
pub use queue::{PrintQueue, QueueItem, QueueItemId};
pub use session::{Session, SessionStore};
