//! Process-wide site session: one live index, replaced atomically.
//!
//! [`SiteChat`] is the boundary both front-ends call. `scrape` builds a new
//! index off to the side and publishes it with a single pointer swap; `ask`
//! searches whatever snapshot was live when it started.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::chunker::chunk_pages;
use crate::composer::AnswerComposer;
use crate::controls::{ChunkerConfig, PipelineControls, SearchConfig};
use crate::crawler::Crawler;
use crate::embeddings::Encoder;
use crate::fetcher::{Page, PageFetcher, Renderer};
use crate::html::truncate_chars;
use crate::normalizer::normalize;
use crate::vector_store::{IndexError, SearchHit, VectorIndex};

/// Answer returned when no passage clears the relevance floor.
pub const NO_RELEVANT_CONTENT: &str =
    "I couldn't find any relevant content on the website to answer your question.";
/// Answer returned when no site has been scraped yet.
pub const NOT_SCRAPED: &str = "Please scrape a website first";

/// Reasons a scrape was refused or produced nothing.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// No URL supplied.
    #[error("URL is required")]
    MissingUrl,
    /// No credential supplied.
    #[error("API key is required")]
    MissingCredential,
    /// The URL is not an absolute http(s) URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// `max_pages` must be at least one.
    #[error("max pages must be at least 1")]
    InvalidMaxPages,
    /// The crawl produced no pages.
    #[error("No content scraped. Please check the URL.")]
    NoContent,
    /// Pages were found but none yielded an indexable chunk.
    #[error("no indexable text found on {pages} scraped pages")]
    NoChunks {
        /// Pages that were collected.
        pages: usize,
    },
    /// The index could not be built.
    #[error("failed to create embeddings from content: {0}")]
    Index(#[from] IndexError),
}

impl ScrapeError {
    /// Whether the caller can fix this by changing the request.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, ScrapeError::Index(_))
    }
}

/// Reasons a question was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AskError {
    /// The question was empty.
    #[error("No query provided")]
    MissingQuery,
}

/// Outcome of a successful scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeSummary {
    /// Normalized seed URL of the live site.
    pub site_url: String,
    /// Pages that contributed content.
    pub pages_scraped: usize,
    /// Chunks in the live index.
    pub chunks_indexed: usize,
    /// True when the site was already live and nothing was crawled.
    pub cached: bool,
}

impl ScrapeSummary {
    /// Human-readable status line.
    pub fn message(&self) -> String {
        if self.cached {
            format!("Content from {} is already loaded", self.site_url)
        } else {
            format!("Successfully scraped {} pages", self.pages_scraped)
        }
    }
}

/// How an answer was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AskOutcome {
    /// Relevant passages were found and handed to the completion service.
    Answered,
    /// Nothing scored above the relevance floor.
    NoRelevantContent,
    /// No index has been published yet.
    NotScraped,
}

/// Citation attached to an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceCitation {
    /// Title of the source page.
    pub title: String,
    /// URL of the source page.
    pub url: String,
    /// Similarity of the passage to the question.
    pub score: f32,
    /// Leading characters of the passage.
    pub snippet: String,
}

/// Answer envelope; always well formed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskResponse {
    /// Answer text, or a descriptive message for degenerate outcomes.
    pub answer: String,
    /// Passages the answer was grounded on, best first.
    pub sources: Vec<SourceCitation>,
    /// Which path produced the answer.
    pub outcome: AskOutcome,
}

/// One page of the live site, as listed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageListing {
    /// Document title.
    pub title: String,
    /// URL the page was scraped from.
    pub url: String,
    /// Leading characters of the page text.
    pub preview: String,
}

struct LiveSite {
    index: Arc<VectorIndex>,
    pages: Arc<[PageListing]>,
    credential: String,
}

/// Crawl, index, and answer questions about one site at a time.
pub struct SiteChat {
    crawler: Crawler,
    chunker: ChunkerConfig,
    search: SearchConfig,
    encoder: Box<dyn Encoder>,
    composer: AnswerComposer,
    live: RwLock<Option<Arc<LiveSite>>>,
    build_lock: Mutex<()>,
}

impl SiteChat {
    /// Assembles the pipeline from its collaborators.
    pub fn new(
        renderer: Box<dyn Renderer>,
        encoder: Box<dyn Encoder>,
        composer: AnswerComposer,
        controls: PipelineControls,
    ) -> Self {
        let fetcher = PageFetcher::new(renderer, controls.fetch);
        Self {
            crawler: Crawler::new(fetcher, controls.crawl),
            chunker: controls.chunker,
            search: controls.search,
            encoder,
            composer,
            live: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    /// Normalized seed URL of the live site, if any.
    pub fn live_site_url(&self) -> Option<String> {
        self.live
            .read()
            .as_ref()
            .map(|live| live.index.site_url().to_string())
    }

    /// Pages behind the live index, in crawl order. Empty before the first scrape.
    pub fn pages(&self) -> Vec<PageListing> {
        self.live
            .read()
            .as_ref()
            .map(|live| live.pages.to_vec())
            .unwrap_or_default()
    }

    /// Crawls `url`, indexes it, and makes it the live site.
    ///
    /// Re-scraping the live site only refreshes its credential. Any failure
    /// leaves the previously live site untouched.
    pub fn scrape(
        &self,
        url: &str,
        max_pages: usize,
        credential: &str,
    ) -> Result<ScrapeSummary, ScrapeError> {
        let url = url.trim();
        let credential = credential.trim();
        if url.is_empty() {
            return Err(ScrapeError::MissingUrl);
        }
        if credential.is_empty() {
            return Err(ScrapeError::MissingCredential);
        }
        validate_seed(url)?;
        if max_pages == 0 {
            return Err(ScrapeError::InvalidMaxPages);
        }

        let _build = self.build_lock.lock();
        let site_url = normalize(url);
        if let Some(summary) = self.reuse_live(&site_url, credential) {
            info!(site = %site_url, "site already loaded; credential refreshed");
            return Ok(summary);
        }

        let pages = self.crawler.crawl(url, max_pages);
        if pages.is_empty() {
            warn!(site = %site_url, "crawl produced no pages");
            return Err(ScrapeError::NoContent);
        }
        let pages_scraped = pages.len();
        let chunks = chunk_pages(&pages, &self.chunker);
        if chunks.is_empty() {
            return Err(ScrapeError::NoChunks {
                pages: pages_scraped,
            });
        }
        let index = VectorIndex::build(site_url.clone(), pages_scraped, chunks, &*self.encoder)?;
        let chunks_indexed = index.len();
        let listings: Arc<[PageListing]> = pages.iter().map(|page| self.listing(page)).collect();

        let fresh = Arc::new(LiveSite {
            index: Arc::new(index),
            pages: listings,
            credential: credential.to_string(),
        });
        *self.live.write() = Some(fresh);
        info!(site = %site_url, pages = pages_scraped, chunks = chunks_indexed, "site published");

        Ok(ScrapeSummary {
            site_url,
            pages_scraped,
            chunks_indexed,
            cached: false,
        })
    }

    /// Answers `query` from the live site.
    pub fn ask(&self, query: &str) -> Result<AskResponse, AskError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AskError::MissingQuery);
        }
        let snapshot = self.live.read().clone();
        let Some(live) = snapshot else {
            return Ok(AskResponse {
                answer: NOT_SCRAPED.to_string(),
                sources: Vec::new(),
                outcome: AskOutcome::NotScraped,
            });
        };

        let hits = live.index.search(
            query,
            &*self.encoder,
            self.search.top_k,
            self.search.relevance_floor,
        );
        if hits.is_empty() {
            return Ok(AskResponse {
                answer: NO_RELEVANT_CONTENT.to_string(),
                sources: Vec::new(),
                outcome: AskOutcome::NoRelevantContent,
            });
        }

        let answer = self.composer.compose(query, &hits, &live.credential);
        let sources = hits.iter().map(|hit| self.citation(hit)).collect();
        Ok(AskResponse {
            answer,
            sources,
            outcome: AskOutcome::Answered,
        })
    }

    fn reuse_live(&self, site_url: &str, credential: &str) -> Option<ScrapeSummary> {
        let mut live = self.live.write();
        let current = live.as_ref()?;
        if current.index.site_url() != site_url {
            return None;
        }
        let index = Arc::clone(&current.index);
        let summary = ScrapeSummary {
            site_url: index.site_url().to_string(),
            pages_scraped: index.pages_indexed(),
            chunks_indexed: index.len(),
            cached: true,
        };
        *live = Some(Arc::new(LiveSite {
            index,
            pages: Arc::clone(&current.pages),
            credential: credential.to_string(),
        }));
        Some(summary)
    }

    fn citation(&self, hit: &SearchHit) -> SourceCitation {
        SourceCitation {
            title: hit.chunk.source_title.clone(),
            url: hit.chunk.source_url.clone(),
            score: hit.score,
            snippet: excerpt(&hit.chunk.text, self.search.snippet_chars),
        }
    }

    fn listing(&self, page: &Page) -> PageListing {
        PageListing {
            title: page.title.clone(),
            url: page.url.clone(),
            preview: excerpt(&page.content, self.search.snippet_chars),
        }
    }
}

/// First `max_chars` characters of `text`, with "..." when anything was cut.
fn excerpt(text: &str, max_chars: usize) -> String {
    let head = truncate_chars(text, max_chars);
    if head.len() < text.len() {
        format!("{head}...")
    } else {
        head.to_string()
    }
}

fn validate_seed(url: &str) -> Result<(), ScrapeError> {
    let parsed = Url::parse(url).map_err(|err| ScrapeError::InvalidUrl(format!("{url}: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ScrapeError::InvalidUrl(url.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{RenderError, RenderedPage};
    use crate::providers::{CompletionRequest, CompletionService};
    use anyhow::Result;

    struct NoSite;

    impl Renderer for NoSite {
        fn render(&self, _url: &str) -> Result<RenderedPage, RenderError> {
            Err(RenderError::Unavailable("offline".into()))
        }
    }

    struct Flat;

    impl Encoder for Flat {
        fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    struct Echo;

    impl CompletionService for Echo {
        fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
            Ok(request.api_key.to_string())
        }
    }

    fn session() -> SiteChat {
        SiteChat::new(
            Box::new(NoSite),
            Box::new(Flat),
            AnswerComposer::new(Box::new(Echo)),
            PipelineControls::default(),
        )
    }

    #[test]
    fn scrape_validates_inputs_before_crawling() {
        let chat = session();
        assert!(matches!(chat.scrape("", 5, "k"), Err(ScrapeError::MissingUrl)));
        assert!(matches!(
            chat.scrape("https://a.test", 5, "  "),
            Err(ScrapeError::MissingCredential)
        ));
        assert!(matches!(
            chat.scrape("not a url", 5, "k"),
            Err(ScrapeError::InvalidUrl(_))
        ));
        assert!(matches!(
            chat.scrape("ftp://a.test/file", 5, "k"),
            Err(ScrapeError::InvalidUrl(_))
        ));
        assert!(matches!(
            chat.scrape("https://a.test", 0, "k"),
            Err(ScrapeError::InvalidMaxPages)
        ));
    }

    #[test]
    fn unreachable_site_reports_no_content() {
        let err = session()
            .scrape("https://down.test", 3, "k")
            .expect_err("nothing rendered");
        assert!(matches!(err, ScrapeError::NoContent));
        assert!(err.is_input_error());
        assert_eq!(err.to_string(), "No content scraped. Please check the URL.");
    }

    #[test]
    fn ask_before_scrape_is_a_normal_answer() {
        let chat = session();
        assert_eq!(chat.ask("   "), Err(AskError::MissingQuery));
        let response = chat.ask("anything?").expect("response");
        assert_eq!(response.outcome, AskOutcome::NotScraped);
        assert_eq!(response.answer, NOT_SCRAPED);
        assert!(response.sources.is_empty());
        assert!(chat.live_site_url().is_none());
        assert!(chat.pages().is_empty());
    }

    #[test]
    fn excerpt_marks_truncation_only() {
        assert_eq!(excerpt("short text", 200), "short text");
        assert_eq!(excerpt("abcdef", 3), "abc...");
        assert_eq!(excerpt("héllo wörld", 5), "héllo...");
        assert_eq!(excerpt("", 5), "");
    }

    #[test]
    fn summary_messages() {
        let mut summary = ScrapeSummary {
            site_url: "https://a.test".into(),
            pages_scraped: 3,
            chunks_indexed: 4,
            cached: false,
        };
        assert_eq!(summary.message(), "Successfully scraped 3 pages");
        summary.cached = true;
        assert_eq!(summary.message(), "Content from https://a.test is already loaded");
    }
}
