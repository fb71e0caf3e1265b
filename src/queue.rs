// Print queue: the billable jobs a customer has confirmed

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::info;

use crate::errors::QueueError;
use crate::layouts::{ImageAsset, Layout};
use crate::pricing::{self, ColorMode, Duplex, PrintSettings, Quote};

/// Identity of a queue entry, taken from a nanosecond clock and forced to be
/// strictly increasing. Not small, not reused. Serialized as a string since
/// the values overflow a JSON double.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueItemId(i64);

impl QueueItemId {
    pub fn next() -> Self {
        static LAST: AtomicI64 = AtomicI64::new(0);
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX / 2);
        let mut last = LAST.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match LAST.compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return QueueItemId(candidate),
                Err(actual) => last = actual,
            }
        }
    }
}

impl From<i64> for QueueItemId {
    fn from(value: i64) -> Self {
        QueueItemId(value)
    }
}

impl fmt::Display for QueueItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(QueueItemId)
    }
}

impl Serialize for QueueItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A document printed as uploaded, with the settings it was quoted under.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentJob {
    pub file_name: String,
    pub settings: PrintSettings,
    pub total_pages: u32,
    pub pages_to_print: u32,
}

/// A single composed page of images.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLayoutJob {
    pub layout: Layout,
    pub images: Vec<ImageAsset>,
    pub copies: u32,
    pub color_mode: ColorMode,
    /// Composed artifact, relative to the output directory.
    pub output_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QueueJob {
    Document(DocumentJob),
    ImageLayout(ImageLayoutJob),
}

/// One queued job and the cost it was added at. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: QueueItemId,
    pub cost: u64,
    pub added_at: DateTime<Utc>,
    #[serde(flatten)]
    pub job: QueueJob,
}

impl QueueItem {
    /// Price a document under `settings`; the cost is fixed from here on.
    ///
    /// A range that leaves no pages still produces an item (costing 0); use
    /// [`QueueItem::require_pages`] to refuse it.
    pub fn document(file_name: impl Into<String>, total_pages: u32, settings: PrintSettings) -> Self {
        let quote = Quote::for_document(total_pages, &settings);
        QueueItem {
            id: QueueItemId::next(),
            cost: quote.cost,
            added_at: Utc::now(),
            job: QueueJob::Document(DocumentJob {
                file_name: file_name.into(),
                settings,
                total_pages,
                pages_to_print: quote.pages_to_print,
            }),
        }
    }

    /// A composed image page. Costs one page per copy.
    pub fn image_layout(
        layout: Layout,
        images: Vec<ImageAsset>,
        copies: u32,
        color_mode: ColorMode,
        output_file: impl Into<String>,
    ) -> Result<Self, QueueError> {
        if images.is_empty() {
            return Err(QueueError::EmptySelection);
        }
        let cost = pricing::price(1, color_mode, Duplex::Single, u64::from(copies));
        Ok(QueueItem {
            id: QueueItemId::next(),
            cost,
            added_at: Utc::now(),
            job: QueueJob::ImageLayout(ImageLayoutJob {
                layout,
                images,
                copies,
                color_mode,
                output_file: output_file.into(),
            }),
        })
    }

    pub fn require_pages(self) -> Result<Self, QueueError> {
        if self.pages_to_print() == 0 {
            return Err(QueueError::NoPagesSelected);
        }
        Ok(self)
    }

    pub fn pages_to_print(&self) -> u32 {
        match &self.job {
            QueueJob::Document(job) => job.pages_to_print,
            QueueJob::ImageLayout(_) => 1,
        }
    }

    pub fn copies(&self) -> u32 {
        match &self.job {
            QueueJob::Document(job) => job.settings.copies,
            QueueJob::ImageLayout(job) => job.copies,
        }
    }

    /// Physical pages this item produces across all copies.
    pub fn printed_pages(&self) -> u64 {
        u64::from(self.pages_to_print()) * u64::from(self.copies())
    }
}

/// Options uploaded with each document so the print backend can honour them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOptions {
    pub copies: u32,
    pub color_mode: ColorMode,
    pub duplex: Duplex,
    pub page_range: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub total_amount: u64,
    pub total_pages: u64,
    pub item_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PrintQueue {
    items: Vec<QueueItem>,
}

impl PrintQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: QueueItem) -> QueueItemId {
        let id = item.id;
        info!("Queued item {} costing {}", id, item.cost);
        self.items.push(item);
        id
    }

    /// Remove the item with `id`; absent ids are ignored.
    pub fn remove(&mut self, id: QueueItemId) -> Option<QueueItem> {
        let position = self.items.iter().position(|item| item.id == id)?;
        let removed = self.items.remove(position);
        info!("Removed queue item {}", id);
        Some(removed)
    }

    pub fn total(&self) -> u64 {
        self.items.iter().map(|item| item.cost).sum()
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn summary(&self) -> CheckoutSummary {
        CheckoutSummary {
            total_amount: self.total(),
            total_pages: self.items.iter().map(QueueItem::printed_pages).sum(),
            item_count: self.items.len(),
        }
    }

    /// Per-document options, in queue order. Image layouts ship as composed
    /// files and carry no options.
    pub fn print_options(&self) -> Vec<PrintOptions> {
        self.items
            .iter()
            .filter_map(|item| match &item.job {
                QueueJob::Document(job) => Some(PrintOptions {
                    copies: job.settings.copies,
                    color_mode: job.settings.color_mode,
                    duplex: job.settings.duplex,
                    page_range: if job.settings.prints_all_pages() {
                        "all".to_string()
                    } else {
                        job.settings.page_range.clone()
                    },
                    name: job.file_name.clone(),
                }),
                QueueJob::ImageLayout(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layouts::find_layout;

    fn bw_settings(range: &str, copies: u32) -> PrintSettings {
        PrintSettings {
            copies,
            color_mode: ColorMode::BlackWhite,
            duplex: Duplex::Double,
            page_range: range.to_string(),
        }
    }

    fn layout_item(copies: u32, color_mode: ColorMode) -> QueueItem {
        QueueItem::image_layout(
            find_layout("2x1").unwrap(),
            vec![ImageAsset::new("a.jpg", "A")],
            copies,
            color_mode,
            "photo-print-2x1.png",
        )
        .unwrap()
    }

    #[test]
    fn test_ids_are_distinct_and_increasing() {
        let ids: Vec<QueueItemId> = (0..100).map(|_| QueueItemId::next()).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_document_cost_is_snapshotted() {
        let item = QueueItem::document("thesis.pdf", 10, bw_settings("1-5", 3));
        assert_eq!(item.cost, 24);
        assert_eq!(item.pages_to_print(), 5);
    }

    #[test]
    fn test_image_layout_costs_one_page_per_copy() {
        assert_eq!(layout_item(3, ColorMode::Color).cost, 30);
        assert_eq!(layout_item(3, ColorMode::BlackWhite).cost, 6);
    }

    #[test]
    fn test_image_layout_requires_images() {
        let result = QueueItem::image_layout(
            find_layout("1x1").unwrap(),
            Vec::new(),
            1,
            ColorMode::Color,
            "x.png",
        );
        assert!(matches!(result, Err(QueueError::EmptySelection)));
    }

    #[test]
    fn test_zero_pages_is_distinguishable() {
        let item = QueueItem::document("a.pdf", 3, bw_settings("9-12", 1));
        assert_eq!(item.cost, 0);
        assert!(matches!(
            item.require_pages(),
            Err(QueueError::NoPagesSelected)
        ));
    }

    #[test]
    fn test_total_tracks_adds_and_removes() {
        let mut queue = PrintQueue::new();
        let a = queue.add(QueueItem::document("a.pdf", 4, bw_settings("all", 1)));
        let b = queue.add(layout_item(2, ColorMode::Color));
        let c = queue.add(QueueItem::document("c.pdf", 5, bw_settings("all", 3)));
        assert_eq!(queue.total(), 6 + 20 + 24);

        queue.remove(b);
        assert_eq!(queue.total(), 30);
        queue.remove(a);
        queue.remove(c);
        assert_eq!(queue.total(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut queue = PrintQueue::new();
        queue.add(layout_item(1, ColorMode::Color));
        assert!(queue.remove(QueueItemId::from(42)).is_none());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.total(), 10);
    }

    #[test]
    fn test_summary_counts_printed_pages() {
        let mut queue = PrintQueue::new();
        queue.add(QueueItem::document("a.pdf", 10, bw_settings("1-4", 2)));
        queue.add(layout_item(3, ColorMode::BlackWhite));

        let summary = queue.summary();
        assert_eq!(summary.total_pages, 8 + 3);
        assert_eq!(summary.total_amount, 12 + 6);
        assert_eq!(summary.item_count, 2);
    }

    #[test]
    fn test_print_options_cover_documents_only() {
        let mut queue = PrintQueue::new();
        queue.add(QueueItem::document("a.pdf", 10, bw_settings("", 1)));
        queue.add(layout_item(1, ColorMode::Color));
        queue.add(QueueItem::document("b.pdf", 10, bw_settings("2-3", 2)));

        let options = queue.print_options();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].page_range, "all");
        assert_eq!(options[1].page_range, "2-3");
        assert_eq!(options[1].name, "b.pdf");

        let json = serde_json::to_value(&options[1]).unwrap();
        assert_eq!(json["duplex"], "double");
        assert_eq!(json["colorMode"], "bw");
    }

    #[test]
    fn test_item_json_is_tagged() {
        let item = layout_item(1, ColorMode::Color);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "imageLayout");
        assert_eq!(json["cost"], 10);
        assert_eq!(json["layout"]["id"], "2x1");
        assert_eq!(json["id"], item.id.to_string());
        assert_eq!(item.id.to_string().parse::<QueueItemId>().unwrap(), item.id);
    }
}
