#![warn(missing_docs)]
//! Core library for sitechat: crawl one website, index its text, and answer
//! questions grounded in the retrieved passages.

pub mod chunker;
pub mod composer;
pub mod controls;
pub mod crawler;
pub mod embedder;
pub mod embeddings;
pub mod fetcher;
pub mod frontier;
pub mod html;
pub mod normalizer;
pub mod providers;
pub mod session;
pub mod telemetry;
pub mod vector_store;

pub use chunker::{chunk_pages, Chunk};
pub use composer::{build_prompt, AnswerComposer};
pub use controls::{
    ChunkerConfig, CrawlConfig, EncoderArgs, FetchConfig, PipelineArgs, PipelineControls,
    ProviderArgs, SearchConfig,
};
pub use crawler::{CrawlReport, CrawlStats, Crawler};
pub use embeddings::{cosine_similarity, Encoder};
pub use fetcher::{FetchedPage, HttpRenderer, Page, PageFetcher, RenderError, RenderedPage, Renderer};
pub use frontier::{Frontier, FrontierError, DEFAULT_FRONTIER_CAP};
pub use normalizer::{is_crawlable, normalize, same_domain};
pub use providers::{CompletionRequest, CompletionService, ProviderKind};
pub use session::{
    AskError, AskOutcome, AskResponse, PageListing, ScrapeError, ScrapeSummary, SiteChat,
    SourceCitation,
};
pub use vector_store::{IndexError, SearchHit, VectorIndex};
