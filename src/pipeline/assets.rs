//! Image assets: URL → normalised PNG ready for embedding.
//!
//! Posters are JPEG, flags are (often transparent) GIF/PNG. The PDF engine
//! refuses images with an alpha channel, so every asset is decoded,
//! composited onto white, and re-encoded as RGB8 PNG before it reaches the
//! layout stage. The result is also checked against the PDF engine's own
//! decoder, so an image that could not be embedded fails here, as an
//! [`AssetError`], rather than at render time.
//!
//! Failures are per asset and never fatal. Each URL is requested at most once
//! per [`AssetFetcher`]; the outcome, success or failure, is remembered for the
//! lifetime of the fetcher. Nothing is persisted across runs.

use crate::error::AssetError;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

/// A decoded image, re-encoded as an opaque PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub url: String,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode raw image bytes and flatten them onto a white background.
pub fn normalize(url: &str, bytes: &[u8]) -> Result<Asset, AssetError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| AssetError::Decode {
        url: url.to_string(),
        detail: e.to_string(),
    })?;

    let flattened = flatten_onto_white(&decoded);
    let (width, height) = flattened.dimensions();

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(flattened)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AssetError::Decode {
            url: url.to_string(),
            detail: format!("re-encoding failed: {e}"),
        })?;

    embeddable(url, &png)?;

    debug!("Normalised {} → {}x{} px, {} bytes", url, width, height, png.len());
    Ok(Asset {
        url: url.to_string(),
        png,
        width,
        height,
    })
}

/// Check that the PDF engine accepts `png` as an image.
pub fn embeddable(url: &str, png: &[u8]) -> Result<(), AssetError> {
    genpdf::elements::Image::from_reader(Cursor::new(png.to_vec()))
        .map(|_| ())
        .map_err(|e| AssetError::Decode {
            url: url.to_string(),
            detail: format!("not embeddable: {e}"),
        })
}

fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, p) in rgba.enumerate_pixels() {
        let alpha = u16::from(p[3]);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(p[0]), blend(p[1]), blend(p[2])]));
    }
    rgb
}

/// Retrieves poster and flag images for one export.
pub struct AssetFetcher<'a> {
    client: &'a reqwest::Client,
    seen: HashMap<String, Result<Asset, AssetError>>,
    requests: usize,
}

impl<'a> AssetFetcher<'a> {
    pub fn new(client: &'a reqwest::Client) -> Self {
        Self {
            client,
            seen: HashMap::new(),
            requests: 0,
        }
    }

    /// Fetch and normalise the image at `url`.
    pub async fn fetch(&mut self, url: &str) -> Result<Asset, AssetError> {
        if let Some(outcome) = self.seen.get(url) {
            debug!("Asset already fetched this run: {}", url);
            return outcome.clone();
        }

        self.requests += 1;
        let outcome = self.download(url).await;
        self.seen.insert(url.to_string(), outcome.clone());
        outcome
    }

    /// Network requests issued so far (memo hits excluded).
    pub fn requests(&self) -> usize {
        self.requests
    }

    async fn download(&self, url: &str) -> Result<Asset, AssetError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AssetError::Transport {
                url: url.to_string(),
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| AssetError::Body {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

        normalize(url, &bytes)
    }
}
