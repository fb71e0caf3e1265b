// Page range expansion for user-typed print ranges

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Strictly increasing, duplicate-free 1-based page numbers within a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageSet(Vec<u32>);

impl PageSet {
    pub fn all(max_pages: u32) -> Self {
        PageSet((1..=max_pages).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pages(&self) -> &[u32] {
        &self.0
    }
}

impl From<BTreeSet<u32>> for PageSet {
    fn from(pages: BTreeSet<u32>) -> Self {
        PageSet(pages.into_iter().collect())
    }
}

impl fmt::Display for PageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Why a single token of a range expression was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeTokenError {
    #[error("'{token}' is not a page number or span")]
    Unparsable { token: String },

    #[error("'{token}' has no pages between 1 and {max_pages}")]
    OutOfRange { token: String, max_pages: u32 },
}

/// Expansion result together with the tokens that contributed nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeReport {
    pub pages: PageSet,
    pub dropped: Vec<RangeTokenError>,
}

/// Expand `range` into the pages of a `max_pages` document.
///
/// Malformed or out-of-range tokens are skipped; see [`expand_with_report`]
/// to find out which.
pub fn expand(range: &str, max_pages: u32) -> PageSet {
    expand_with_report(range, max_pages).pages
}

pub fn expand_with_report(range: &str, max_pages: u32) -> RangeReport {
    let trimmed = range.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        return RangeReport {
            pages: PageSet::all(max_pages),
            dropped: Vec::new(),
        };
    }

    let mut pages = BTreeSet::new();
    let mut dropped = Vec::new();

    for raw in trimmed.split(',') {
        let token = raw.trim();
        match expand_token(token, max_pages, &mut pages) {
            Ok(()) => {}
            Err(e) => {
                debug!("Dropping page range token: {}", e);
                dropped.push(e);
            }
        }
    }

    RangeReport {
        pages: pages.into(),
        dropped,
    }
}

fn expand_token(
    token: &str,
    max_pages: u32,
    pages: &mut BTreeSet<u32>,
) -> Result<(), RangeTokenError> {
    let unparsable = || RangeTokenError::Unparsable {
        token: token.to_string(),
    };

    // Bounds are signed so "0" and "-3"-style values parse and get filtered
    // by range rather than failing as garbage.
    let (low, high) = match token.split_once('-') {
        Some((start, end)) => {
            let start = parse_bound(start).ok_or_else(unparsable)?;
            let end = parse_bound(end).ok_or_else(unparsable)?;
            (start.min(end), start.max(end))
        }
        None => {
            let page = parse_bound(token).ok_or_else(unparsable)?;
            (page, page)
        }
    };

    let first = low.max(1);
    let last = high.min(i64::from(max_pages));
    if first > last {
        return Err(RangeTokenError::OutOfRange {
            token: token.to_string(),
            max_pages,
        });
    }

    // Both ends are clamped into 1..=max_pages, so they fit in u32.
    pages.extend(first as u32..=last as u32);
    Ok(())
}

fn parse_bound(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}
