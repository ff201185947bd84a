//! Page rendering and extraction.
//!
//! A [`Renderer`] turns a URL into markup; [`PageFetcher`] waits out the
//! settle delay, strips non-content elements, and decides whether the page is
//! worth indexing. Rendering failures never escape `fetch`: they are logged
//! and reported as `None`.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::Html;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::controls::FetchConfig;
use crate::html::{truncate_chars, HtmlExtractor};

/// Indexed page content. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// URL the page was requested under.
    pub url: String,
    /// Document title.
    pub title: String,
    /// Cleaned, whitespace-collapsed body text.
    pub content: String,
}

/// Markup returned by a renderer.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Final URL after redirects; links resolve against it.
    pub url: String,
    /// Serialized DOM.
    pub html: String,
}

/// Errors surfaced by a renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The underlying HTTP request failed or timed out.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("server returned status {0}")]
    Status(u16),
    /// The response is not an HTML document.
    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),
    /// Any other renderer-specific failure.
    #[error("render failed: {0}")]
    Unavailable(String),
}

/// Blocking "render this URL" capability.
pub trait Renderer: Send + Sync {
    /// Renders `url` and returns its markup.
    fn render(&self, url: &str) -> Result<RenderedPage, RenderError>;
}

/// Renderer backed by a blocking HTTP client.
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Builds the HTTP client with the configured timeout and redirect limits.
    pub fn new(config: &FetchConfig) -> Result<Self, RenderError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(config.render_timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Renderer for HttpRenderer {
    fn render(&self, url: &str) -> Result<RenderedPage, RenderError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }
        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            let lowered = content_type.to_ascii_lowercase();
            if !lowered.contains("html") && !lowered.starts_with("text/") {
                return Err(RenderError::UnsupportedContent(content_type.to_string()));
            }
        }
        let final_url = response.url().to_string();
        let html = response.text()?;
        Ok(RenderedPage {
            url: final_url,
            html,
        })
    }
}

/// A page worth indexing plus the links found on it.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Extracted page record.
    pub page: Page,
    /// Absolute outbound link targets, in document order.
    pub links: Vec<String>,
}

/// Renders pages and turns them into [`Page`] records.
pub struct PageFetcher {
    renderer: Box<dyn Renderer>,
    config: FetchConfig,
    extractor: HtmlExtractor,
}

impl PageFetcher {
    /// Wraps `renderer` with the given limits.
    pub fn new(renderer: Box<dyn Renderer>, config: FetchConfig) -> Self {
        Self {
            renderer,
            config,
            extractor: HtmlExtractor::new(),
        }
    }

    /// Renders `url` and extracts its content.
    ///
    /// Returns `None` when rendering fails or when the cleaned text is too
    /// short to be worth indexing.
    pub fn fetch(&self, url: &str) -> Option<FetchedPage> {
        let rendered = match self.renderer.render(url) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!(url, error = %err, "render failed; page skipped");
                return None;
            }
        };
        settle(self.config.settle_delay);

        let document = Html::parse_document(&rendered.html);
        let extracted = self.extractor.extract_text(&document);
        let length = extracted.text.chars().count();
        if length <= self.config.min_content_chars {
            debug!(url, chars = length, "page too short to index");
            return None;
        }

        let links = match Url::parse(&rendered.url).or_else(|_| Url::parse(url)) {
            Ok(base) => self.extractor.outbound_links(&document, &base),
            Err(err) => {
                warn!(url, error = %err, "cannot resolve links against page url");
                Vec::new()
            }
        };

        let content = truncate_chars(&extracted.text, self.config.max_content_chars).to_string();
        Some(FetchedPage {
            page: Page {
                url: url.to_string(),
                title: extracted.title,
                content,
            },
            links,
        })
    }
}

fn settle(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
