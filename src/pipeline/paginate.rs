//! Listing pagination: walk `p=1, 2, 3, …` until the listing runs dry.
//!
//! There is no page count in the markup, so the end of data is detected
//! rather than computed. Any of these stops the walk and keeps what was
//! already collected:
//!
//! * a non-2xx response,
//! * a page with no rating entries,
//! * a transport failure on the listing request.
//!
//! None of them is an error. Only an unbuildable URL is fatal.

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::pipeline::extract::{self, RECORD_SEL};
use crate::record::Record;
use reqwest::Url;
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

/// One retrieved listing page.
///
/// Owns the parsed document; record nodes borrow from it.
pub struct ListingPage {
    number: u32,
    document: Html,
}

/// A rating entry together with its structural parent.
#[derive(Clone, Copy)]
pub struct RecordNode<'a> {
    pub element: ElementRef<'a>,
    pub context: ElementRef<'a>,
}

impl ListingPage {
    /// Parse a listing body.
    pub fn parse(number: u32, body: &str) -> Self {
        Self {
            number,
            document: Html::parse_document(body),
        }
    }

    /// 1-based page number this listing was requested with.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Rating entries in listing order.
    pub fn record_nodes(&self) -> impl Iterator<Item = RecordNode<'_>> {
        self.document.select(&RECORD_SEL).map(|element| RecordNode {
            element,
            context: extract::context_of(element),
        })
    }

    pub fn record_count(&self) -> usize {
        self.record_nodes().count()
    }

    /// Run the field extractor over every entry on the page.
    pub fn extract_records(&self, site_root: &str) -> Vec<Record> {
        self.record_nodes()
            .map(|node| extract::extract(node.element, node.context, site_root))
            .collect()
    }
}

/// Build the listing URL for one page of a profile.
///
/// The profile id is URL-encoded by the query serializer.
pub fn listing_url(base: &str, profile_id: &str, page: u32) -> Result<Url, ExportError> {
    let mut url = Url::parse(base).map_err(|e| ExportError::InvalidListingUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("user_id", profile_id)
        .append_pair("chv", "list")
        .append_pair("orderby", "rating")
        .append_pair("p", &page.to_string());
    Ok(url)
}

/// Fetches listing pages one at a time, strictly in order.
pub struct Paginator<'a> {
    client: &'a reqwest::Client,
    base_url: &'a str,
    profile_id: String,
    next: u32,
    finished: bool,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a reqwest::Client, config: &'a ExportConfig, profile_id: &str) -> Self {
        Self {
            client,
            base_url: &config.listing_url,
            profile_id: profile_id.to_string(),
            next: 1,
            finished: false,
        }
    }

    /// Fetch the next page, or `None` once the listing is exhausted.
    ///
    /// After the first `None` every later call returns `None` without
    /// touching the network.
    pub async fn next_page(&mut self) -> Result<Option<ListingPage>, ExportError> {
        if self.finished {
            return Ok(None);
        }

        let page = self.next;
        let url = listing_url(self.base_url, &self.profile_id, page)?;
        debug!("Fetching listing page {}: {}", page, url);

        let body = match self.fetch_body(url).await {
            Some(body) => body,
            None => {
                self.finished = true;
                return Ok(None);
            }
        };

        let listing = ListingPage::parse(page, &body);
        let count = listing.record_count();
        if count == 0 {
            info!("Listing page {} has no entries; end of data", page);
            self.finished = true;
            return Ok(None);
        }

        debug!("Listing page {}: {} entries", page, count);
        self.next += 1;
        Ok(Some(listing))
    }

    /// Fetch every remaining page.
    pub async fn fetch_all(&mut self) -> Result<Vec<ListingPage>, ExportError> {
        let mut pages = Vec::new();
        while let Some(page) = self.next_page().await? {
            pages.push(page);
        }
        Ok(pages)
    }

    /// GET a listing body; `None` means "stop paginating".
    async fn fetch_body(&self, url: Url) -> Option<String> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Listing request {} failed, stopping: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            info!(
                "Listing page {} answered HTTP {}; end of data",
                self.next,
                response.status()
            );
            return None;
        }

        match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Reading listing body {} failed, stopping: {}", url, e);
                None
            }
        }
    }
}
