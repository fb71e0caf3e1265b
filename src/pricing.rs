// Pricing for print jobs, in whole currency units

use serde::{Deserialize, Serialize};

use crate::page_range::{self, PageSet};

/// Per-page price of a colour page, either side.
pub const COLOR_PAGE_PRICE: u64 = 10;
/// Per-page price of a single-sided black-and-white page.
pub const BW_PAGE_PRICE: u64 = 2;
/// Price of one double-sided black-and-white sheet (two pages).
pub const BW_DUPLEX_SHEET_PRICE: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorMode {
    #[serde(rename = "color")]
    Color,
    #[serde(rename = "bw")]
    BlackWhite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Duplex {
    Single,
    Double,
}

/// Cost of printing `page_count` pages `copies` times.
///
/// `copies` is expected to be at least 1; callers clamp it.
pub fn price(page_count: u64, color_mode: ColorMode, duplex: Duplex, copies: u64) -> u64 {
    per_copy_price(page_count, color_mode, duplex) * copies
}

fn per_copy_price(page_count: u64, color_mode: ColorMode, duplex: Duplex) -> u64 {
    match (color_mode, duplex) {
        // Toner dominates colour cost, so sides do not matter.
        (ColorMode::Color, _) => page_count * COLOR_PAGE_PRICE,
        (ColorMode::BlackWhite, Duplex::Single) => page_count * BW_PAGE_PRICE,
        (ColorMode::BlackWhite, Duplex::Double) => {
            let full_sheets = page_count / 2;
            let leftover = page_count % 2;
            full_sheets * BW_DUPLEX_SHEET_PRICE + leftover * BW_PAGE_PRICE
        }
    }
}

/// Settings a customer picks for one uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintSettings {
    pub copies: u32,
    pub color_mode: ColorMode,
    pub duplex: Duplex,
    #[serde(default)]
    pub page_range: String,
}

impl Default for PrintSettings {
    fn default() -> Self {
        PrintSettings {
            copies: 1,
            color_mode: ColorMode::BlackWhite,
            duplex: Duplex::Single,
            page_range: "all".to_string(),
        }
    }
}

impl PrintSettings {
    /// Clamp copies into `1..=max_copies`.
    pub fn clamped(mut self, max_copies: u32) -> Self {
        self.copies = self.copies.clamp(1, max_copies.max(1));
        self
    }

    pub fn prints_all_pages(&self) -> bool {
        let range = self.page_range.trim();
        range.is_empty() || range.eq_ignore_ascii_case("all")
    }
}

/// Live price preview for a document of `total_pages` pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub pages: PageSet,
    pub pages_to_print: u32,
    pub cost: u64,
}

impl Quote {
    pub fn for_document(total_pages: u32, settings: &PrintSettings) -> Self {
        Quote::for_pages(page_range::expand(&settings.page_range, total_pages), settings)
    }

    /// Price an already expanded page set.
    pub fn for_pages(pages: PageSet, settings: &PrintSettings) -> Self {
        let pages_to_print = pages.len() as u32;
        let cost = price(
            u64::from(pages_to_print),
            settings.color_mode,
            settings.duplex,
            u64::from(settings.copies),
        );
        Quote {
            pages,
            pages_to_print,
            cost,
        }
    }
}
