//! Field extraction: one listing entry's markup → [`Record`].
//!
//! Each field lives at a fixed structural position inside the entry. A
//! missing node is never an error; the field falls back to empty text, or to
//! [`UNKNOWN_TITLE`] for the title.
//!
//! The personal rating is the exception to "look inside the entry": the
//! listing renders it in a sibling column, so it is searched for in the
//! entry's parent (the *context* node).

use crate::record::{Record, UNKNOWN_TITLE};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

// ── Lazy static selectors ────────────────────────────────────────────────────

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e}"))
}

/// A single listing entry.
pub static RECORD_SEL: Lazy<Selector> = Lazy::new(|| selector("div.user-ratings-movie-item"));

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| selector("div.mc-title a.d-md-inline-block"));
static YEAR_SEL: Lazy<Selector> = Lazy::new(|| selector("span.mc-year"));
static AVG_RATING_SEL: Lazy<Selector> = Lazy::new(|| selector("div.fa-avg-rat-box div.avg"));
static OWN_RATING_SEL: Lazy<Selector> = Lazy::new(|| selector("div.fa-user-rat-box"));
static DIRECTOR_SEL: Lazy<Selector> = Lazy::new(|| selector("div.mc-director"));
static CAST_SEL: Lazy<Selector> = Lazy::new(|| selector("div.mc-cast"));
static POSTER_SEL: Lazy<Selector> = Lazy::new(|| selector("img.lazyload"));
static FLAG_SEL: Lazy<Selector> = Lazy::new(|| selector("img.nflag"));

/// The structural parent of a record node, or the node itself at the root.
pub fn context_of<'a>(record: ElementRef<'a>) -> ElementRef<'a> {
    record
        .parent()
        .and_then(ElementRef::wrap)
        .unwrap_or(record)
}

/// Extract every field of one rated movie.
///
/// `site_root` is prefixed verbatim to the flag image `src`.
pub fn extract(record: ElementRef<'_>, context: ElementRef<'_>, site_root: &str) -> Record {
    Record {
        title: first_text(record, &TITLE_SEL).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        year: first_text(record, &YEAR_SEL).unwrap_or_default(),
        rating: first_text(record, &AVG_RATING_SEL).unwrap_or_default(),
        own_rating: first_text(context, &OWN_RATING_SEL).unwrap_or_default(),
        director: first_text(record, &DIRECTOR_SEL).unwrap_or_default(),
        cast: first_text(record, &CAST_SEL).unwrap_or_default(),
        poster_url: poster_url(record),
        flag_url: flag_url(record, site_root),
    }
}

/// Trimmed text of the first match, if any.
fn first_text(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope
        .select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// First candidate of the poster's `data-srcset`.
fn poster_url(record: ElementRef<'_>) -> String {
    record
        .select(&POSTER_SEL)
        .next()
        .and_then(|img| img.value().attr("data-srcset"))
        .and_then(|srcset| srcset.split_whitespace().next())
        .unwrap_or_default()
        .to_string()
}

/// Site root + flag `src`, concatenated without normalisation.
fn flag_url(record: ElementRef<'_>, site_root: &str) -> String {
    match record.select(&FLAG_SEL).next() {
        Some(img) => format!("{}{}", site_root, img.value().attr("src").unwrap_or_default()),
        None => String::new(),
    }
}
