//! Integration tests against a local mock of the ratings listing.
//!
//! Every test spins up a wiremock server that serves listing pages, posters
//! and flags, so nothing here touches the real site.
//!
//! The PDF-writing tests use `FA_EXPORT_FONT_DIR` + `FA_EXPORT_FONT_FAMILY`
//! when set, otherwise the first common system family found, and skip
//! themselves when there is none.

use filmaffinity_export::config::DEFAULT_USER_AGENT;
use filmaffinity_export::pipeline::document::{find_system_font_family, has_font_family};
use filmaffinity_export::{
    compose_document, export_to_file, fetch_ratings, AssetKind, DocumentElement, ExportConfig,
    ExportProgressCallback,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

// ── Fixtures ─────────────────────────────────────────────────────────────────

const LISTING_PATH: &str = "/es/userratings.php";
const PROFILE: &str = "42";

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([90, 40, 20])))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode fixture image");
    buf
}

/// One rating entry wrapped in its own row, the way the listing nests them.
fn entry(server: &str, i: usize, poster: &str) -> String {
    format!(
        r#"<div class="row">
          <div class="user-ratings-movie-item">
            <img class="lazyload" data-srcset="{server}/posters/{poster} 1x, {server}/posters/{poster}-big 2x">
            <div class="mc-title"><a class="d-md-inline-block" href="/film{i}.html">Movie {i}</a>
              <span class="mc-year">{year}</span>
              <img class="nflag" src="flags/es.png">
            </div>
            <div class="mc-director">Director {i}</div>
            <div class="mc-cast">Actor A,
                Actor B</div>
            <div class="fa-avg-rat-box"><div class="avg">7,{d}</div></div>
          </div>
          <div class="fa-user-rat-box">{own}</div>
        </div>"#,
        year = 1990 + i,
        d = i % 10,
        own = 1 + i % 10,
    )
}

fn listing(entries: &[String]) -> String {
    format!(
        "<html><body><div class=\"user-ratings-list\">{}</div></body></html>",
        entries.concat()
    )
}

fn config_for(server: &MockServer) -> ExportConfig {
    ExportConfig::builder()
        .listing_url(format!("{}{}", server.uri(), LISTING_PATH))
        .site_root(format!("{}/", server.uri()))
        .include_heading(false)
        .build()
        .expect("valid test config")
}

async fn mount_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("user_id", PROFILE))
        .and(query_param("p", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, image_path: &str) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(16, 24)))
        .mount(server)
        .await;
}

/// Page 1 with `n` entries, page 2 empty. Entry 3 points at a poster that
/// the server does not know.
async fn twenty_movie_listing(server: &MockServer, n: usize) {
    let entries: Vec<String> = (0..n)
        .map(|i| {
            let poster = if i == 3 { "missing.png" } else { "ok.png" };
            entry(&server.uri(), i, poster)
        })
        .collect();
    mount_page(server, "1", listing(&entries)).await;
    mount_page(server, "2", listing(&[])).await;
    mount_image(server, "/posters/ok.png").await;
    mount_image(server, "/flags/es.png").await;
}

/// Exact header match on the raw value (values containing commas included).
fn has_header(
    name: &'static str,
    expected: &'static str,
) -> impl Fn(&Request) -> bool + Send + Sync {
    move |req: &Request| {
        req.headers
            .get(name)
            .is_some_and(|v| v.as_bytes() == expected.as_bytes())
    }
}

fn test_fonts() -> Option<(PathBuf, String)> {
    if let (Ok(dir), Ok(family)) = (
        std::env::var("FA_EXPORT_FONT_DIR"),
        std::env::var("FA_EXPORT_FONT_FAMILY"),
    ) {
        let dir = PathBuf::from(dir);
        if has_font_family(&dir, &family) {
            return Some((dir, family));
        }
    }
    find_system_font_family().map(|(dir, family)| (dir, family.to_string()))
}

/// `config_for` with a usable font family, or `None` to skip.
fn pdf_config_for(server: &MockServer) -> Option<ExportConfig> {
    let Some((dir, family)) = test_fonts() else {
        println!("SKIP: no usable TrueType family found");
        return None;
    };
    Some(
        ExportConfig::builder()
            .listing_url(format!("{}{}", server.uri(), LISTING_PATH))
            .site_root(format!("{}/", server.uri()))
            .font_dir(dir)
            .font_family(family)
            .build()
            .expect("valid test config"),
    )
}

#[derive(Default)]
struct Recorder {
    pages: Mutex<Vec<(u32, usize)>>,
    asset_errors: Mutex<Vec<(String, AssetKind)>>,
}

impl ExportProgressCallback for Recorder {
    fn on_listing_page(&self, page: u32, records_on_page: usize) {
        self.pages.lock().unwrap().push((page, records_on_page));
    }

    fn on_asset_error(&self, title: &str, kind: AssetKind, _error: &str) {
        self.asset_errors
            .lock()
            .unwrap()
            .push((title.to_string(), kind));
    }
}

// ── Fetch ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stops_at_the_first_empty_page() {
    let server = MockServer::start().await;
    twenty_movie_listing(&server, 20).await;

    let records = fetch_ratings(PROFILE, &config_for(&server)).await.unwrap();
    assert_eq!(records.len(), 20);

    let first = &records[0];
    assert_eq!(first.title, "Movie 0");
    assert_eq!(first.year, "1990");
    assert_eq!(first.rating, "7,0");
    assert_eq!(first.own_rating, "1");
    assert_eq!(first.director, "Director 0");
    assert_eq!(first.poster_url, format!("{}/posters/ok.png", server.uri()));
    assert_eq!(first.flag_url, format!("{}/flags/es.png", server.uri()));

    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles[19], "Movie 19");
    assert_eq!(records[12].own_rating, "3");
}

#[tokio::test]
async fn records_keep_page_order_across_pages() {
    let server = MockServer::start().await;
    let uri = server.uri();
    mount_page(&server, "1", listing(&[entry(&uri, 0, "a.png"), entry(&uri, 1, "b.png")])).await;
    mount_page(&server, "2", listing(&[entry(&uri, 2, "c.png")])).await;
    mount_page(&server, "3", listing(&[])).await;

    let recorder = Arc::new(Recorder::default());
    let config = ExportConfig::builder()
        .listing_url(format!("{uri}{LISTING_PATH}"))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let records = fetch_ratings(PROFILE, &config).await.unwrap();
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Movie 0", "Movie 1", "Movie 2"]);
    assert_eq!(*recorder.pages.lock().unwrap(), vec![(1, 2), (2, 1)]);
}

#[tokio::test]
async fn error_status_on_first_page_yields_no_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let records = fetch_ratings(PROFILE, &config_for(&server)).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn listing_requests_carry_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("p", "1"))
        .and(has_header("user-agent", DEFAULT_USER_AGENT))
        .and(has_header("accept-language", "en-US,en;q=0.9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing(&[entry(&server.uri(), 0, "ok.png")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let records = fetch_ratings(PROFILE, &config_for(&server)).await.unwrap();
    assert_eq!(records.len(), 1);
}

// ── Compose ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_record_becomes_a_block_and_a_separator() {
    let server = MockServer::start().await;
    twenty_movie_listing(&server, 20).await;
    let config = config_for(&server);

    let records = fetch_ratings(PROFILE, &config).await.unwrap();
    let (doc, _) = compose_document(&records, "ratings", &config).await.unwrap();

    let elements = doc.elements();
    assert_eq!(elements.len(), 40);
    for pair in elements.chunks(2) {
        assert!(matches!(pair[0], DocumentElement::Record(_)));
        assert!(matches!(pair[1], DocumentElement::Separator(_)));
    }
}

#[tokio::test]
async fn a_missing_poster_only_affects_its_own_record() {
    let server = MockServer::start().await;
    twenty_movie_listing(&server, 20).await;

    let recorder = Arc::new(Recorder::default());
    let config = ExportConfig::builder()
        .listing_url(format!("{}{}", server.uri(), LISTING_PATH))
        .site_root(format!("{}/", server.uri()))
        .include_heading(false)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let records = fetch_ratings(PROFILE, &config).await.unwrap();
    let (doc, failures) = compose_document(&records, "ratings", &config).await.unwrap();
    assert_eq!(failures, 1);
    assert_eq!(doc.record_count(), 20);

    let blocks: Vec<_> = doc
        .elements()
        .iter()
        .filter_map(|e| match e {
            DocumentElement::Record(block) => Some(block),
            _ => None,
        })
        .collect();

    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(block.poster.is_none(), i == 3, "poster of record {i}");
        assert!(block.flag.is_some(), "flag of record {i}");
    }
    assert_eq!(blocks[3].title, "Movie 3");
    assert_eq!(blocks[3].rating.text(), "4 (7,3)");

    assert_eq!(
        *recorder.asset_errors.lock().unwrap(),
        vec![("Movie 3".to_string(), AssetKind::Poster)]
    );
}

#[tokio::test]
async fn shared_images_are_requested_once() {
    let server = MockServer::start().await;
    let entries: Vec<String> = (0..5).map(|i| entry(&server.uri(), i, "ok.png")).collect();
    mount_page(&server, "1", listing(&entries)).await;
    Mock::given(method("GET"))
        .and(path("/flags/es.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(16, 12)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posters/ok.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(16, 24)))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let records = fetch_ratings(PROFILE, &config).await.unwrap();
    let (doc, failures) = compose_document(&records, "ratings", &config).await.unwrap();
    assert_eq!(doc.record_count(), 5);
    assert_eq!(failures, 0);
}

// ── Full export ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_writes_a_pdf() {
    let server = MockServer::start().await;
    let Some(config) = pdf_config_for(&server) else {
        return;
    };
    twenty_movie_listing(&server, 20).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("fa_ratings_42.pdf");
    let summary = export_to_file(PROFILE, &out, &config)
        .await
        .unwrap();

    assert_eq!(summary.records, 20);
    assert_eq!(summary.listing_pages, 1);
    assert_eq!(summary.asset_failures, 1);
    assert_eq!(summary.output_path, out);

    let bytes = std::fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn export_of_an_empty_profile_still_writes_a_pdf() {
    let server = MockServer::start().await;
    let Some(config) = pdf_config_for(&server) else {
        return;
    };
    mount_page(&server, "1", listing(&[])).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("empty.pdf");
    let summary = export_to_file(PROFILE, &out, &config)
        .await
        .unwrap();

    assert_eq!(summary.records, 0);
    assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn export_handles_names_outside_latin1() {
    let server = MockServer::start().await;
    let Some(config) = pdf_config_for(&server) else {
        return;
    };
    let body = entry(&server.uri(), 0, "ok.png")
        .replace("Movie 0", "Trzy kolory: Niebieski")
        .replace("Director 0", "Krzysztof Kieślowski")
        .replace("Actor A", "Juliette Binoche, Zbigniew Zamachowski");
    mount_page(&server, "1", listing(&[body])).await;
    mount_page(&server, "2", listing(&[])).await;
    mount_image(&server, "/posters/ok.png").await;
    mount_image(&server, "/flags/es.png").await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("fa_ratings_42.pdf");
    let summary = export_to_file(PROFILE, &out, &config).await.unwrap();

    assert_eq!(summary.records, 1);
    assert_eq!(summary.asset_failures, 0);
    assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn path_like_profile_id_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig::builder()
        .output_dir(dir.path().join("out"))
        .build()
        .unwrap();

    let err = filmaffinity_export::export("../escape", &config)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        filmaffinity_export::ExportError::InvalidProfileId { .. }
    ));
    assert!(!dir.path().join("out").exists());
    assert!(!dir.path().join("fa_ratings_..").exists());
}
