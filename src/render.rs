// Raster page rendering and file-backed image loading for composed prints

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgba, RgbaImage};
use tracing::debug;

use crate::composer::{ImageSource, PageCanvas, PageGeometry, PageRenderer, Rect, RenderedPage};
use crate::errors::CompositionError;
use crate::layouts::ImageAsset;

const MM_PER_INCH: f64 = 25.4;

pub fn mm_to_px(mm: f64, dpi: u32) -> i64 {
    (mm * f64::from(dpi) / MM_PER_INCH).round() as i64
}

/// Renders pages as white PNG rasters at a fixed resolution.
pub struct RasterRenderer {
    dpi: u32,
    background: Rgba<u8>,
}

impl RasterRenderer {
    pub fn new(dpi: u32) -> Self {
        RasterRenderer {
            dpi,
            background: Rgba([255, 255, 255, 255]),
        }
    }
}

impl PageRenderer for RasterRenderer {
    fn begin_page(&self, geometry: &PageGeometry) -> Result<Box<dyn PageCanvas>, CompositionError> {
        let width = mm_to_px(geometry.width, self.dpi);
        let height = mm_to_px(geometry.height, self.dpi);
        if width <= 0 || height <= 0 {
            return Err(CompositionError::Render(format!(
                "Page of {}x{} mm has no pixels at {} DPI",
                geometry.width, geometry.height, self.dpi
            )));
        }

        debug!("New {}x{} px page at {} DPI", width, height, self.dpi);
        Ok(Box::new(RasterCanvas {
            canvas: ImageBuffer::from_pixel(width as u32, height as u32, self.background),
            dpi: self.dpi,
        }))
    }
}

struct RasterCanvas {
    canvas: RgbaImage,
    dpi: u32,
}

impl PageCanvas for RasterCanvas {
    fn embed(&mut self, image: &DynamicImage, rect: &Rect) -> Result<(), CompositionError> {
        let x = mm_to_px(rect.x, self.dpi);
        let y = mm_to_px(rect.y, self.dpi);
        let width = mm_to_px(rect.width, self.dpi);
        let height = mm_to_px(rect.height, self.dpi);
        if width <= 0 || height <= 0 {
            return Err(CompositionError::Render(format!(
                "Cell of {:.1}x{:.1} mm is too small at {} DPI",
                rect.width, rect.height, self.dpi
            )));
        }

        // Stretched to the cell, aspect ratio is not kept. Pixels are copied,
        // not blended; transparency flattens on export.
        let scaled = imageops::resize(
            &image.to_rgba8(),
            width as u32,
            height as u32,
            FilterType::Lanczos3,
        );
        imageops::replace(&mut self.canvas, &scaled, x, y);
        Ok(())
    }

    fn export(self: Box<Self>) -> Result<RenderedPage, CompositionError> {
        let flattened = DynamicImage::ImageRgba8(self.canvas).to_rgb8();
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(flattened)
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .map_err(|e| CompositionError::Export(e.to_string()))?;

        Ok(RenderedPage {
            bytes: Bytes::from(buf),
            extension: "png",
        })
    }
}

/// Reads uploaded images from the storage directory; handles are file names.
pub struct FileImageSource {
    base_path: PathBuf,
}

impl FileImageSource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        FileImageSource {
            base_path: base_path.into(),
        }
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    async fn fetch(&self, asset: &ImageAsset) -> Result<Bytes, CompositionError> {
        let path = self.base_path.join(&asset.handle);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| CompositionError::Source {
                name: asset.name.clone(),
                reason: format!("{}: {}", path.display(), e),
            })?;
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::DocumentComposer;
    use crate::layouts::find_layout;
    use crate::pricing::ColorMode;
    use image::GenericImageView;
    use std::sync::Arc;

    #[test]
    fn test_mm_to_px() {
        assert_eq!(mm_to_px(25.4, 300), 300);
        assert_eq!(mm_to_px(210.0, 150), 1240);
        assert_eq!(mm_to_px(297.0, 150), 1754);
    }

    #[test]
    fn test_page_is_white_until_embedded() {
        let renderer = RasterRenderer::new(72);
        let canvas = renderer.begin_page(&PageGeometry::default()).unwrap();
        let page = canvas.export().unwrap();
        let decoded = image::load_from_memory(&page.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (595, 842));
        assert_eq!(decoded.get_pixel(300, 400).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_embed_stretches_into_rect() {
        let renderer = RasterRenderer::new(254);
        let geometry = PageGeometry::default();
        let mut canvas = renderer.begin_page(&geometry).unwrap();
        let red = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 1, Rgba([255, 0, 0, 255])));
        let rect = Rect {
            x: 10.0,
            y: 20.0,
            width: 5.0,
            height: 8.0,
        };
        canvas.embed(&red, &rect).unwrap();
        let page = image::load_from_memory(&canvas.export().unwrap().bytes).unwrap();

        // 254 DPI is 10 px per mm
        assert_eq!(page.get_pixel(100, 200).0, [255, 0, 0, 255]);
        assert_eq!(page.get_pixel(149, 279).0, [255, 0, 0, 255]);
        assert_eq!(page.get_pixel(150, 200).0, [255, 255, 255, 255]);
        assert_eq!(page.get_pixel(100, 280).0, [255, 255, 255, 255]);
    }

    #[tokio::test]
    async fn test_file_source_composes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]))
            .save(dir.path().join("blue.png"))
            .unwrap();

        let composer = DocumentComposer::new(
            Arc::new(FileImageSource::new(dir.path())),
            Arc::new(RasterRenderer::new(72)),
        );
        let doc = composer
            .compose(
                &[ImageAsset::new("blue.png", "Blue")],
                find_layout("1x1").unwrap(),
                ColorMode::BlackWhite,
            )
            .await
            .unwrap();

        let page = image::load_from_memory(&doc.page.bytes).unwrap();
        let center = page.get_pixel(297, 421).0;
        assert_eq!(center, [29, 29, 29, 255]);
    }

    #[tokio::test]
    async fn test_missing_file_is_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileImageSource::new(dir.path());
        let result = source.fetch(&ImageAsset::new("nope.jpg", "Nope")).await;
        assert!(matches!(result, Err(CompositionError::Source { .. })));
    }
}
