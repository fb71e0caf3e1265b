// Grid layouts for image prints and the selection of images placed on them

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::SelectionError;

/// A fixed grid of `columns` x `rows` image cells on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub id: &'static str,
    pub columns: u32,
    pub rows: u32,
}

impl Layout {
    pub const fn capacity(&self) -> usize {
        (self.columns * self.rows) as usize
    }
}

/// Every layout offered, smallest first.
pub const LAYOUTS: [Layout; 4] = [
    Layout {
        id: "1x1",
        columns: 1,
        rows: 1,
    },
    Layout {
        id: "2x1",
        columns: 2,
        rows: 1,
    },
    Layout {
        id: "2x2",
        columns: 2,
        rows: 2,
    },
    Layout {
        id: "3x3",
        columns: 3,
        rows: 3,
    },
];

pub fn default_layout() -> Layout {
    LAYOUTS[0]
}

pub fn find_layout(id: &str) -> Result<Layout, SelectionError> {
    LAYOUTS
        .iter()
        .copied()
        .find(|layout| layout.id == id)
        .ok_or_else(|| SelectionError::UnknownLayout { id: id.to_string() })
}

/// An uploaded image. The session owns these; layouts only reference them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageAsset {
    /// Opaque key understood by the image source.
    pub handle: String,
    pub name: String,
}

impl ImageAsset {
    pub fn new(handle: impl Into<String>, name: impl Into<String>) -> Self {
        ImageAsset {
            handle: handle.into(),
            name: name.into(),
        }
    }
}

/// Images chosen for the current layout, in the order they were added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSelection {
    layout: Layout,
    images: Vec<ImageAsset>,
}

impl LayoutSelection {
    /// Start on `layout`, seeded from the front of `available`.
    pub fn new(layout: Layout, available: &[ImageAsset]) -> Self {
        LayoutSelection {
            layout,
            images: seed(layout, available),
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn images(&self) -> &[ImageAsset] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.images.len() >= self.layout.capacity()
    }

    /// Switch to `layout` and reseed from `available`.
    ///
    /// Any images added or removed by hand are discarded: the result is always
    /// the first `capacity` entries of `available`, never a subset of what was
    /// selected before.
    pub fn select_layout(&mut self, layout: Layout, available: &[ImageAsset]) -> &[ImageAsset] {
        let previous = self.images.len();
        self.layout = layout;
        self.images = seed(layout, available);
        info!(
            "Switched to layout {} ({} -> {} images)",
            layout.id,
            previous,
            self.images.len()
        );
        &self.images
    }

    /// Append `asset` if there is a free cell. On error nothing changes.
    pub fn add_image(&mut self, asset: ImageAsset) -> Result<(), SelectionError> {
        if self.is_full() {
            debug!(
                "Layout {} is full, not adding {}",
                self.layout.id, asset.name
            );
            return Err(SelectionError::CapacityExceeded {
                capacity: self.layout.capacity(),
            });
        }
        self.images.push(asset);
        Ok(())
    }

    /// Remove the image at `index`. Later images shift down; nothing refills.
    pub fn remove_image(&mut self, index: usize) -> Option<ImageAsset> {
        if index < self.images.len() {
            Some(self.images.remove(index))
        } else {
            None
        }
    }
}

fn seed(layout: Layout, available: &[ImageAsset]) -> Vec<ImageAsset> {
    available.iter().take(layout.capacity()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets(count: usize) -> Vec<ImageAsset> {
        (0..count)
            .map(|i| ImageAsset::new(format!("img{}.jpg", i), format!("Photo {}", i)))
            .collect()
    }

    #[test]
    fn test_catalog_capacities() {
        let capacities: Vec<usize> = LAYOUTS.iter().map(Layout::capacity).collect();
        assert_eq!(capacities, vec![1, 2, 4, 9]);
        assert_eq!(default_layout().id, "1x1");
    }

    #[test]
    fn test_find_layout() {
        assert_eq!(find_layout("2x2").unwrap().capacity(), 4);
        assert!(matches!(
            find_layout("4x4"),
            Err(SelectionError::UnknownLayout { .. })
        ));
    }

    #[test]
    fn test_new_selection_takes_first_capacity_images() {
        let available = assets(3);
        let selection = LayoutSelection::new(find_layout("2x1").unwrap(), &available);
        assert_eq!(selection.images(), &available[..2]);
    }

    #[test]
    fn test_switching_layout_reseeds_from_available() {
        let available = assets(5);
        let mut selection = LayoutSelection::new(find_layout("3x3").unwrap(), &available);
        selection.remove_image(0);
        selection.remove_image(0);
        assert_eq!(selection.images()[0], available[2]);

        let chosen = selection
            .select_layout(find_layout("2x1").unwrap(), &available)
            .to_vec();
        assert_eq!(chosen, available[..2].to_vec());
    }

    #[test]
    fn test_add_respects_capacity() {
        let available = assets(3);
        let mut selection = LayoutSelection::new(find_layout("2x1").unwrap(), &available[..1]);
        assert!(selection.add_image(available[2].clone()).is_ok());
        assert!(selection.is_full());

        let result = selection.add_image(available[1].clone());
        assert!(matches!(
            result,
            Err(SelectionError::CapacityExceeded { capacity: 2 })
        ));
        assert_eq!(selection.images(), &[available[0].clone(), available[2].clone()]);
    }

    #[test]
    fn test_remove_does_not_refill() {
        let available = assets(4);
        let mut selection = LayoutSelection::new(find_layout("2x1").unwrap(), &available);
        let removed = selection.remove_image(0);
        assert_eq!(removed, Some(available[0].clone()));
        assert_eq!(selection.images(), &[available[1].clone()]);
        assert_eq!(selection.remove_image(7), None);
    }

    #[test]
    fn test_same_asset_can_fill_several_cells() {
        let available = assets(1);
        let mut selection = LayoutSelection::new(find_layout("2x2").unwrap(), &available);
        selection.add_image(available[0].clone()).unwrap();
        assert_eq!(selection.len(), 2);
    }
}
