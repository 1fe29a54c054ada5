//! Configuration types for a ratings export.
//!
//! All export behaviour is controlled through [`ExportConfig`], built via its
//! [`ExportConfigBuilder`]. The defaults point at the live FilmAffinity site
//! and the Liberation font family; tests and the CLI override individual
//! fields.

use crate::error::ExportError;
use crate::progress::{ExportProgressCallback, ProgressCallback};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Ratings listing endpoint. Query parameters are appended per page.
pub const DEFAULT_LISTING_URL: &str = "https://www.filmaffinity.com/es/userratings.php";

/// Prefix glued in front of every flag image `src`.
pub const DEFAULT_SITE_ROOT: &str = "https://www.filmaffinity.com/";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

pub const DEFAULT_FONT_DIR: &str = "/usr/share/fonts/truetype/liberation";

pub const DEFAULT_FONT_FAMILY: &str = "LiberationSans";

/// Configuration for a ratings export.
///
/// Built via [`ExportConfig::builder()`] or using [`ExportConfig::default()`].
///
/// # Example
/// ```rust
/// use filmaffinity_export::ExportConfig;
///
/// let config = ExportConfig::builder()
///     .font_dir("/usr/share/fonts/truetype/liberation")
///     .output_dir("exports")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Listing endpoint without query string. Default: [`DEFAULT_LISTING_URL`].
    pub listing_url: String,

    /// Prefix for flag image sources. Default: [`DEFAULT_SITE_ROOT`].
    ///
    /// The prefix is concatenated, not URL-joined, so a root-relative `src`
    /// yields a double slash.
    pub site_root: String,

    /// `User-Agent` sent with every request.
    pub user_agent: String,

    /// `Accept` sent with every request.
    pub accept: String,

    /// `Accept-Language` sent with every request.
    pub accept_language: String,

    /// Directory holding the TrueType files used for text metrics.
    pub font_dir: PathBuf,

    /// Font family file prefix, e.g. `LiberationSans` for
    /// `LiberationSans-Regular.ttf`.
    pub font_family: String,

    /// Directory that [`crate::export::export`] writes `fa_ratings_<id>.pdf`
    /// into. Default: the current directory.
    pub output_dir: PathBuf,

    /// Put a centred heading above the first record. Default: true.
    pub include_heading: bool,

    /// Progress events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            site_root: DEFAULT_SITE_ROOT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            font_dir: PathBuf::from(DEFAULT_FONT_DIR),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            output_dir: PathBuf::from("."),
            include_heading: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("listing_url", &self.listing_url)
            .field("site_root", &self.site_root)
            .field("user_agent", &self.user_agent)
            .field("accept", &self.accept)
            .field("accept_language", &self.accept_language)
            .field("font_dir", &self.font_dir)
            .field("font_family", &self.font_family)
            .field("output_dir", &self.output_dir)
            .field("include_heading", &self.include_heading)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExportProgressCallback>"),
            )
            .finish()
    }
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn listing_url(mut self, url: impl Into<String>) -> Self {
        self.config.listing_url = url.into();
        self
    }

    pub fn site_root(mut self, root: impl Into<String>) -> Self {
        self.config.site_root = root.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.config.accept = accept.into();
        self
    }

    pub fn accept_language(mut self, lang: impl Into<String>) -> Self {
        self.config.accept_language = lang.into();
        self
    }

    pub fn font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.font_dir = dir.into();
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.config.font_family = family.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn include_heading(mut self, v: bool) -> Self {
        self.config.include_heading = v;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ExportProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExportConfig, ExportError> {
        let c = &self.config;
        let url = reqwest::Url::parse(&c.listing_url).map_err(|e| {
            ExportError::InvalidConfig(format!("listing URL '{}': {}", c.listing_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ExportError::InvalidConfig(format!(
                "listing URL must be http or https, got '{}'",
                c.listing_url
            )));
        }
        if c.site_root.is_empty() {
            return Err(ExportError::InvalidConfig("site root must not be empty".into()));
        }
        if c.font_family.trim().is_empty() {
            return Err(ExportError::InvalidConfig(
                "font family must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
