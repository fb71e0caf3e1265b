// Composition of selected images onto a single grid page
//
// Images are handled strictly one at a time: fetch, decode, optional
// grayscale, embed. The next image is not fetched until the previous one is on
// the page, so at most one decoded raster is alive and placement order always
// follows selection order.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::CompositionError;
use crate::layouts::{ImageAsset, Layout};
use crate::pricing::ColorMode;

// A4 portrait, in millimetres
pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;
pub const PAGE_MARGIN_MM: f64 = 10.0;
pub const CELL_PADDING_MM: f64 = 2.0;

/// Rectangle in page coordinates (millimetres, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Physical page size plus the outer margin and per-cell padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub padding: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry {
            width: PAGE_WIDTH_MM,
            height: PAGE_HEIGHT_MM,
            margin: PAGE_MARGIN_MM,
            padding: CELL_PADDING_MM,
        }
    }
}

impl PageGeometry {
    pub fn cell_size(&self, layout: Layout) -> (f64, f64) {
        let cell_width = (self.width - 2.0 * self.margin) / f64::from(layout.columns);
        let cell_height = (self.height - 2.0 * self.margin) / f64::from(layout.rows);
        (cell_width, cell_height)
    }

    /// Grid cell for the image at flattened `index`, before padding.
    pub fn cell_rect(&self, layout: Layout, index: usize) -> Rect {
        let (cell_width, cell_height) = self.cell_size(layout);
        let columns = layout.columns as usize;
        let row = index / columns;
        let col = index % columns;
        Rect {
            x: self.margin + col as f64 * cell_width,
            y: self.margin + row as f64 * cell_height,
            width: cell_width,
            height: cell_height,
        }
    }

    /// Area the image at `index` is stretched to fill.
    pub fn image_rect(&self, layout: Layout, index: usize) -> Rect {
        let cell = self.cell_rect(layout, index);
        Rect {
            x: cell.x + self.padding,
            y: cell.y + self.padding,
            width: cell.width - 2.0 * self.padding,
            height: cell.height - 2.0 * self.padding,
        }
    }
}

/// Where encoded image bytes come from.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, asset: &ImageAsset) -> Result<Bytes, CompositionError>;
}

/// Creates blank pages to compose onto.
pub trait PageRenderer: Send + Sync {
    fn begin_page(&self, geometry: &PageGeometry) -> Result<Box<dyn PageCanvas>, CompositionError>;
}

/// A page being composed. Dropping it without `export` discards the work.
pub trait PageCanvas: Send {
    /// Stretch `image` to exactly cover `rect`.
    fn embed(&mut self, image: &DynamicImage, rect: &Rect) -> Result<(), CompositionError>;

    fn export(self: Box<Self>) -> Result<RenderedPage, CompositionError>;
}

/// Exported page bytes, ready to hand to the print backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub bytes: Bytes,
    pub extension: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub index: usize,
    pub asset: ImageAsset,
    pub rect: Rect,
}

#[derive(Debug, Clone)]
pub struct ComposedDocument {
    pub layout: Layout,
    pub color_mode: ColorMode,
    pub placements: Vec<Placement>,
    pub page: RenderedPage,
}

#[derive(Clone)]
pub struct DocumentComposer {
    source: Arc<dyn ImageSource>,
    renderer: Arc<dyn PageRenderer>,
    geometry: PageGeometry,
}

impl DocumentComposer {
    pub fn new(source: Arc<dyn ImageSource>, renderer: Arc<dyn PageRenderer>) -> Self {
        DocumentComposer {
            source,
            renderer,
            geometry: PageGeometry::default(),
        }
    }

    /// Compose `assets` onto one page of `layout`.
    ///
    /// Cells past the last asset stay empty. Any failure abandons the page;
    /// no partial output is returned.
    pub async fn compose(
        &self,
        assets: &[ImageAsset],
        layout: Layout,
        color_mode: ColorMode,
    ) -> Result<ComposedDocument, CompositionError> {
        if assets.is_empty() {
            return Err(CompositionError::EmptySelection);
        }
        if assets.len() > layout.capacity() {
            return Err(CompositionError::Render(format!(
                "{} images do not fit layout {} ({} cells)",
                assets.len(),
                layout.id,
                layout.capacity()
            )));
        }

        info!(
            "Composing {} images on layout {} ({:?})",
            assets.len(),
            layout.id,
            color_mode
        );

        let mut canvas = self.renderer.begin_page(&self.geometry)?;
        let mut placements = Vec::with_capacity(assets.len());

        for (index, asset) in assets.iter().enumerate() {
            let encoded = self.source.fetch(asset).await.map_err(|e| {
                warn!("Composition aborted at image {}: {}", index, e);
                e
            })?;
            let image = decode(asset, encoded, color_mode).await.map_err(|e| {
                warn!("Composition aborted at image {}: {}", index, e);
                e
            })?;

            let rect = self.geometry.image_rect(layout, index);
            canvas.embed(&image, &rect)?;
            let (width, height) = image.dimensions();
            debug!(
                "Placed {} ({}x{}) at ({:.1}, {:.1}) size {:.1}x{:.1} mm",
                asset.name,
                width,
                height,
                rect.x,
                rect.y,
                rect.width,
                rect.height
            );

            placements.push(Placement {
                index,
                asset: asset.clone(),
                rect,
            });
        }

        let page = canvas.export()?;
        info!(
            "Composed layout {} into {} bytes",
            layout.id,
            page.bytes.len()
        );

        Ok(ComposedDocument {
            layout,
            color_mode,
            placements,
            page,
        })
    }
}

async fn decode(
    asset: &ImageAsset,
    encoded: Bytes,
    color_mode: ColorMode,
) -> Result<DynamicImage, CompositionError> {
    let name = asset.name.clone();
    tokio::task::spawn_blocking(move || -> Result<DynamicImage, CompositionError> {
        let image = image::load_from_memory(&encoded).map_err(|e| CompositionError::Decode {
            name,
            reason: e.to_string(),
        })?;
        Ok(match color_mode {
            ColorMode::BlackWhite => grayscale(&image),
            ColorMode::Color => image,
        })
    })
    .await
    .map_err(|e| CompositionError::Render(format!("Decode task failed: {}", e)))?
}

/// Luminance-weighted desaturation; alpha is kept.
pub fn grayscale(image: &DynamicImage) -> DynamicImage {
    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let gray = luminance(r, g, b);
        pixel.0 = [gray, gray, gray, a];
    }
    DynamicImage::ImageRgba8(rgba)
}

/// `0.299 R + 0.587 G + 0.114 B`, rounded half to even like a clamped byte
/// array store.
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let gray = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    gray.round_ties_even().clamp(0.0, 255.0) as u8
}
