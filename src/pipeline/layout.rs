//! Record layout: [`Record`] + images → [`RecordBlock`].
//!
//! The block is a renderer-independent description of what one movie looks
//! like on the page. [`crate::pipeline::document`] maps it onto PDF elements
//! using the geometry and style constants defined here.
//!
//! ```text
//! ┌────────┬───────────────────────────────────────────┬────┐
//! │        │ Title                                     │flag│
//! │ poster │ 8 (7,9)                                   │    │
//! │        │ Year: 1995                                     │
//! │        │ Director: …                                    │
//! │        │ Cast: …                                        │
//! └────────┴────────────────────────────────────────────────┘
//! ─────────────────────── separator ───────────────────────
//! ```

use crate::pipeline::assets::{Asset, AssetFetcher};
use crate::progress::{AssetKind, ProgressCallback};
use crate::record::Record;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// ── Presentation constants ───────────────────────────────────────────────────

/// Font size, colour and weight of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub size: u8,
    pub color: (u8, u8, u8),
    pub bold: bool,
}

pub const DOCUMENT_TITLE_STYLE: TextStyle = TextStyle {
    size: 20,
    color: (0x1F, 0x49, 0x7D),
    bold: true,
};

pub const MOVIE_TITLE_STYLE: TextStyle = TextStyle {
    size: 14,
    color: (0x2E, 0x74, 0xB5),
    bold: true,
};

pub const RATING_STYLE: TextStyle = TextStyle {
    size: 12,
    color: (0xC0, 0x00, 0x00),
    bold: false,
};

pub const BODY_STYLE: TextStyle = TextStyle {
    size: 10,
    color: (0x33, 0x33, 0x33),
    bold: false,
};

/// Poster box, in inches. The image is stretched to fill it.
pub const POSTER_BOX_IN: (f64, f64) = (0.8, 1.2);

/// Flag box, in points.
pub const FLAG_BOX_PT: (f64, f64) = (16.0, 12.0);

/// Poster column / info column, in inches.
pub const RECORD_COLUMNS_IN: [f64; 2] = [1.0, 5.5];

/// Title column / flag column, in inches.
pub const TITLE_COLUMNS_IN: [f64; 2] = [5.2, 0.3];

/// Line height of the sans families used for export, in ems.
pub const LINE_HEIGHT_EM: f64 = 1.15;

/// How far the flag is lowered so its middle lines up with the middle of
/// the first title line, in points.
pub fn flag_top_inset_pt() -> f64 {
    let title_line = f64::from(MOVIE_TITLE_STYLE.size) * LINE_HEIGHT_EM;
    ((title_line - FLAG_BOX_PT.1) / 2.0).max(0.0)
}

/// Space after the rating line, in points.
pub const RATING_SPACING_PT: f64 = 4.0;

/// Space after the movie title, in points.
pub const TITLE_SPACING_PT: f64 = 8.0;

/// Space after the document heading, in points.
pub const HEADING_SPACING_PT: f64 = 25.0;

/// Thin rule drawn between consecutive records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separator {
    pub width_in: f64,
    /// Height reserved for the rule. The stroke itself uses the PDF
    /// engine's line width.
    pub thickness_pt: f64,
    pub color: (u8, u8, u8),
    pub padding_pt: f64,
}

pub const SEPARATOR: Separator = Separator {
    width_in: 6.5,
    thickness_pt: 0.5,
    color: (0xCC, 0xCC, 0xCC),
    padding_pt: 15.0,
};

// ── Block model ──────────────────────────────────────────────────────────────

/// Personal rating (emphasised) followed by the community rating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingLine {
    pub personal: String,
    pub community: String,
}

impl RatingLine {
    /// The line as plain text, e.g. `8 (7,9)`.
    pub fn text(&self) -> String {
        format!("{} ({})", self.personal, self.community)
    }
}

/// A `Label: value` line under the ratings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataLine {
    pub label: &'static str,
    pub value: String,
}

/// Everything needed to draw one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBlock {
    pub poster: Option<Asset>,
    pub title: String,
    pub flag: Option<Asset>,
    pub rating: RatingLine,
    /// Year, director, cast, in that order, non-empty ones only.
    pub metadata: Vec<MetadataLine>,
}

/// Collapse whitespace runs (the listing indents cast lists across lines).
pub fn normalize_text(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").into_owned()
}

/// Lay out one record with already-fetched images.
pub fn compose(record: &Record, poster: Option<Asset>, flag: Option<Asset>) -> RecordBlock {
    let metadata = [
        ("Year", &record.year),
        ("Director", &record.director),
        ("Cast", &record.cast),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| MetadataLine {
        label,
        value: normalize_text(value),
    })
    .collect();

    RecordBlock {
        poster,
        title: normalize_text(&record.title),
        flag,
        rating: RatingLine {
            personal: normalize_text(&record.own_rating),
            community: normalize_text(&record.rating),
        },
        metadata,
    }
}

/// Fetch the record's poster and flag, then lay it out.
///
/// Returns the block and how many of its images failed. A failed image is
/// reported and left out; it never affects the rest of the block.
pub async fn compose_with_assets(
    record: &Record,
    fetcher: &mut AssetFetcher<'_>,
    progress: Option<&ProgressCallback>,
) -> (RecordBlock, usize) {
    let mut failures = 0;
    let poster = fetch_for(
        record,
        &record.poster_url,
        AssetKind::Poster,
        fetcher,
        progress,
        &mut failures,
    )
    .await;
    let flag = fetch_for(
        record,
        &record.flag_url,
        AssetKind::Flag,
        fetcher,
        progress,
        &mut failures,
    )
    .await;
    (compose(record, poster, flag), failures)
}

async fn fetch_for(
    record: &Record,
    url: &str,
    kind: AssetKind,
    fetcher: &mut AssetFetcher<'_>,
    progress: Option<&ProgressCallback>,
    failures: &mut usize,
) -> Option<Asset> {
    if url.is_empty() {
        return None;
    }
    match fetcher.fetch(url).await {
        Ok(asset) => Some(asset),
        Err(e) => {
            warn!("Error loading {} for {}: {}", kind.as_str(), record.title, e);
            if let Some(cb) = progress {
                cb.on_asset_error(&record.title, kind, &e.to_string());
            }
            *failures += 1;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heat() -> Record {
        Record {
            title: "Heat".into(),
            year: "1995".into(),
            rating: "7,9".into(),
            own_rating: "9".into(),
            director: "Michael Mann".into(),
            cast: "Al Pacino,\n        Robert De Niro".into(),
            poster_url: String::new(),
            flag_url: String::new(),
        }
    }

    #[test]
    fn metadata_lines_follow_fixed_order() {
        let block = compose(&heat(), None, None);
        let labels: Vec<&str> = block.metadata.iter().map(|m| m.label).collect();
        assert_eq!(labels, vec!["Year", "Director", "Cast"]);
        assert_eq!(block.metadata[2].value, "Al Pacino, Robert De Niro");
    }

    #[test]
    fn empty_metadata_fields_are_skipped() {
        let record = Record {
            year: String::new(),
            cast: String::new(),
            ..heat()
        };
        let block = compose(&record, None, None);
        assert_eq!(
            block.metadata,
            vec![MetadataLine {
                label: "Director",
                value: "Michael Mann".into()
            }]
        );
    }

    #[test]
    fn rating_line_emphasises_personal_rating() {
        let block = compose(&heat(), None, None);
        assert_eq!(block.rating.personal, "9");
        assert_eq!(block.rating.text(), "9 (7,9)");

        let unrated = compose(&Record::default(), None, None);
        assert_eq!(unrated.rating.text(), " ()");
        assert_eq!(unrated.title, "Unknown");
        assert!(unrated.metadata.is_empty());
    }

    #[test]
    fn images_are_placed_when_given() {
        let poster = Asset {
            url: "p".into(),
            png: vec![1, 2, 3],
            width: 80,
            height: 120,
        };
        let block = compose(&heat(), Some(poster.clone()), None);
        assert_eq!(block.poster, Some(poster));
        assert!(block.flag.is_none());
    }

    #[test]
    fn column_widths_span_the_separator() {
        let total: f64 = RECORD_COLUMNS_IN.iter().sum();
        assert!((total - SEPARATOR.width_in).abs() < f64::EPSILON);
        let title_total: f64 = TITLE_COLUMNS_IN.iter().sum();
        assert!((title_total - RECORD_COLUMNS_IN[1]).abs() < 1e-9);
    }

    #[test]
    fn flag_sits_mid_title_line() {
        let inset = flag_top_inset_pt();
        assert!(inset > 0.0);
        let title_line = f64::from(MOVIE_TITLE_STYLE.size) * LINE_HEIGHT_EM;
        let above = inset;
        let below = title_line - inset - FLAG_BOX_PT.1;
        assert!((above - below).abs() < 1e-9);
    }

    #[tokio::test]
    async fn records_without_image_urls_issue_no_requests() {
        let client = reqwest::Client::new();
        let mut fetcher = AssetFetcher::new(&client);
        let (block, failures) = compose_with_assets(&heat(), &mut fetcher, None).await;
        assert_eq!(failures, 0);
        assert_eq!(fetcher.requests(), 0);
        assert!(block.poster.is_none());
    }
}
