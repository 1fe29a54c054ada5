//! Export entry points: profile id → records → PDF.
//!
//! Everything runs in order on the calling task: listing pages one by one,
//! then each record with its poster and flag. No request overlaps another.

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::pipeline::assets::AssetFetcher;
use crate::pipeline::document::Document;
use crate::pipeline::http;
use crate::pipeline::layout;
use crate::pipeline::paginate::Paginator;
use crate::record::{ExportSummary, Record};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `fa_ratings_<id>.pdf`.
pub fn output_filename(profile_id: &str) -> String {
    format!("fa_ratings_{}.pdf", profile_id.trim())
}

/// Trim and reject an id that is empty or could not be a single file name
/// component.
fn validate_profile_id(profile_id: &str) -> Result<&str, ExportError> {
    let id = profile_id.trim();
    let reason = if id.is_empty() {
        "the ID must not be empty"
    } else if id.contains(['/', '\\']) || id.contains("..") {
        "the ID must not contain path separators or '..'"
    } else if id.chars().any(char::is_control) {
        "the ID must not contain control characters"
    } else {
        return Ok(id);
    };
    Err(ExportError::InvalidProfileId {
        input: profile_id.to_string(),
        reason: reason.to_string(),
    })
}

/// Every rated movie of a profile, in listing order.
pub async fn fetch_ratings(
    profile_id: &str,
    config: &ExportConfig,
) -> Result<Vec<Record>, ExportError> {
    let client = http::build_client(config)?;
    fetch_ratings_with(&client, profile_id, config)
        .await
        .map(|(records, _)| records)
}

/// Returns the records and the number of listing pages that had entries.
async fn fetch_ratings_with(
    client: &reqwest::Client,
    profile_id: &str,
    config: &ExportConfig,
) -> Result<(Vec<Record>, usize), ExportError> {
    let id = validate_profile_id(profile_id)?;
    info!("Getting rated movies for profile {}", id);
    if let Some(ref cb) = config.progress_callback {
        cb.on_fetch_start(id);
    }

    let mut paginator = Paginator::new(client, config, id);
    let mut records = Vec::new();
    let mut pages = 0;

    while let Some(page) = paginator.next_page().await? {
        let extracted = page.extract_records(&config.site_root);
        debug!("Page {}: extracted {} records", page.number(), extracted.len());
        if let Some(ref cb) = config.progress_callback {
            cb.on_listing_page(page.number(), extracted.len());
        }
        records.extend(extracted);
        pages += 1;
    }

    info!("Collected {} records from {} pages", records.len(), pages);
    if let Some(ref cb) = config.progress_callback {
        cb.on_fetch_complete(records.len());
    }
    Ok((records, pages))
}

/// Lay out `records` (fetching their images) into a document.
///
/// Returns the document and the number of images that could not be fetched.
pub async fn compose_document(
    records: &[Record],
    title: &str,
    config: &ExportConfig,
) -> Result<(Document, usize), ExportError> {
    let client = http::build_client(config)?;
    Ok(compose_document_with(&client, records, title, config).await)
}

async fn compose_document_with(
    client: &reqwest::Client,
    records: &[Record],
    title: &str,
    config: &ExportConfig,
) -> (Document, usize) {
    let mut fetcher = AssetFetcher::new(client);
    let mut document = Document::new(title, config.include_heading);
    let mut asset_failures = 0;
    let total = records.len();

    for (i, record) in records.iter().enumerate() {
        let (block, failures) =
            layout::compose_with_assets(record, &mut fetcher, config.progress_callback.as_ref())
                .await;
        asset_failures += failures;
        document.push_record(block);
        if let Some(ref cb) = config.progress_callback {
            cb.on_record_composed(i + 1, total, &record.title);
        }
    }

    debug!(
        "Composed {} records with {} image requests",
        document.record_count(),
        fetcher.requests()
    );
    (document, asset_failures)
}

fn document_title(profile_id: &str) -> String {
    format!("FilmAffinity ratings: {profile_id}")
}

/// Render already-fetched records to `output_path`.
pub async fn render_records(
    records: &[Record],
    profile_id: &str,
    output_path: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<ExportSummary, ExportError> {
    let client = http::build_client(config)?;
    let id = validate_profile_id(profile_id)?;
    render_records_with(&client, records, id, output_path.as_ref(), 0, config).await
}

async fn render_records_with(
    client: &reqwest::Client,
    records: &[Record],
    profile_id: &str,
    output_path: &Path,
    listing_pages: usize,
    config: &ExportConfig,
) -> Result<ExportSummary, ExportError> {
    info!("Exporting to PDF: {}", output_path.display());
    if let Some(ref cb) = config.progress_callback {
        cb.on_export_start(records.len(), output_path);
    }

    let title = document_title(profile_id);
    let (document, asset_failures) =
        compose_document_with(client, records, &title, config).await;
    let written = document.finalize(output_path, &config.font_dir, &config.font_family)?;

    info!(
        "Export complete: {} records, {} image failures",
        document.record_count(),
        asset_failures
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_export_complete(document.record_count(), &written);
    }

    Ok(ExportSummary {
        records: document.record_count(),
        listing_pages,
        asset_failures,
        output_path: written,
    })
}

/// Fetch a profile's ratings and write them to `output_path`.
pub async fn export_to_file(
    profile_id: &str,
    output_path: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<ExportSummary, ExportError> {
    let client = http::build_client(config)?;
    let id = validate_profile_id(profile_id)?;
    let (records, pages) = fetch_ratings_with(&client, id, config).await?;
    render_records_with(&client, &records, id, output_path.as_ref(), pages, config).await
}

/// Fetch a profile's ratings and write `fa_ratings_<id>.pdf` into
/// [`ExportConfig::output_dir`].
pub async fn export(
    profile_id: &str,
    config: &ExportConfig,
) -> Result<ExportSummary, ExportError> {
    let path = default_output_path(profile_id, config)?;
    export_to_file(profile_id, path, config).await
}

/// Where [`export`] would write for this profile.
pub fn default_output_path(
    profile_id: &str,
    config: &ExportConfig,
) -> Result<PathBuf, ExportError> {
    let id = validate_profile_id(profile_id)?;
    Ok(config.output_dir.join(output_filename(id)))
}

/// Synchronous wrapper around [`export`].
///
/// Creates a temporary tokio runtime internally.
pub fn export_sync(profile_id: &str, config: &ExportConfig) -> Result<ExportSummary, ExportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(export(profile_id, config))
}
