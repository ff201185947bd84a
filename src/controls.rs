//! Pipeline tuning knobs and the clap argument groups shared by the binaries.

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};

use crate::composer::AnswerComposer;
use crate::embedder::hashing::HashingEncoder;
use crate::embedder::openai::OpenAiEmbedder;
use crate::embeddings::Encoder;
use crate::frontier::DEFAULT_FRONTIER_CAP;
use crate::providers::{self, ProviderKind};

/// Default user agent sent by the HTTP renderer.
pub const USER_AGENT: &str = "sitechat/0.1 (+https://github.com/sitechat/sitechat)";

/// Rendering and extraction limits applied to every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Unconditional pause after each render before the DOM is read.
    pub settle_delay: Duration,
    /// Hard timeout for a single render.
    pub render_timeout: Duration,
    /// Maximum redirects followed per render.
    pub max_redirects: usize,
    /// Pages whose cleaned text is this long or shorter are discarded.
    pub min_content_chars: usize,
    /// Cleaned text beyond this many characters is cut off.
    pub max_content_chars: usize,
    /// User agent presented to servers.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(3),
            render_timeout: Duration::from_secs(10),
            max_redirects: 5,
            min_content_chars: 100,
            max_content_chars: 10_000,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Frontier limits for a single crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Maximum queued URLs; overflow is dropped.
    pub frontier_cap: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            frontier_cap: DEFAULT_FRONTIER_CAP,
        }
    }
}

/// Word-chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Words per chunk; the last chunk of a page may be shorter.
    pub words_per_chunk: usize,
    /// Chunks whose trimmed text is this long or shorter are dropped.
    pub min_chunk_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            words_per_chunk: 500,
            min_chunk_chars: 50,
        }
    }
}

/// Retrieval parameters for the query phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Maximum hits returned per query.
    pub top_k: usize,
    /// Hits must score strictly above this similarity.
    pub relevance_floor: f32,
    /// Characters of chunk text quoted in each source citation.
    pub snippet_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            relevance_floor: 0.3,
            snippet_chars: 200,
        }
    }
}

/// Every knob the scrape/ask pipeline reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineControls {
    /// Renderer and extraction limits.
    pub fetch: FetchConfig,
    /// Frontier limits.
    pub crawl: CrawlConfig,
    /// Chunking parameters.
    pub chunker: ChunkerConfig,
    /// Retrieval parameters.
    pub search: SearchConfig,
}

/// Crawl and retrieval flags shared by the binaries.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Maximum pages collected per scrape
    #[arg(long, env = "SITECHAT_MAX_PAGES", default_value_t = 10)]
    pub max_pages: usize,

    /// Milliseconds to wait after each render before reading the page
    #[arg(long, env = "SITECHAT_SETTLE_MS", default_value_t = 3000)]
    pub settle_ms: u64,

    /// Seconds before a single page render times out
    #[arg(long, env = "SITECHAT_RENDER_TIMEOUT_SECS", default_value_t = 10)]
    pub render_timeout_secs: u64,

    /// Number of passages retrieved per question
    #[arg(long, env = "SITECHAT_TOP_K", default_value_t = 5)]
    pub top_k: usize,

    /// Minimum similarity a passage must exceed to be used
    #[arg(long, env = "SITECHAT_RELEVANCE_FLOOR", default_value_t = 0.3)]
    pub relevance_floor: f32,
}

impl PipelineArgs {
    /// Converts the parsed flags into `PipelineControls`.
    pub fn build_controls(&self) -> PipelineControls {
        let defaults = PipelineControls::default();
        PipelineControls {
            fetch: FetchConfig {
                settle_delay: Duration::from_millis(self.settle_ms),
                render_timeout: Duration::from_secs(self.render_timeout_secs.max(1)),
                ..defaults.fetch
            },
            search: SearchConfig {
                top_k: self.top_k.max(1),
                relevance_floor: self.relevance_floor,
                ..defaults.search
            },
            ..defaults
        }
    }
}

/// Embedding backends selectable from the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum EncoderKind {
    /// OpenAI-compatible `/embeddings` endpoint.
    Openai,
    /// Local feature-hashing encoder; no network, lower quality.
    Hashing,
}

/// Flags selecting and configuring the embedding backend.
#[derive(Args, Debug, Clone)]
pub struct EncoderArgs {
    /// Embedding backend
    #[arg(long, env = "SITECHAT_ENCODER", value_enum, default_value = "openai")]
    pub encoder: EncoderKind,

    /// OpenAI API key used for embedding calls
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Embedding model identifier
    #[arg(
        long,
        env = "SITECHAT_EMBED_MODEL",
        default_value = "text-embedding-3-small"
    )]
    pub embed_model: String,

    /// Optional embedding dimension override
    #[arg(long, env = "SITECHAT_EMBED_DIMENSIONS")]
    pub embed_dimensions: Option<usize>,

    /// Base URL for OpenAI-compatible endpoints
    #[arg(
        long,
        env = "SITECHAT_OPENAI_BASE",
        default_value = "https://api.openai.com/v1"
    )]
    pub openai_base_url: String,

    /// Max inputs per embedding request
    #[arg(long, env = "SITECHAT_EMBED_BATCH", default_value_t = 64)]
    pub embed_batch: usize,

    /// Seconds before embedding requests time out
    #[arg(long, env = "SITECHAT_EMBED_TIMEOUT_SECS", default_value_t = 30)]
    pub embed_timeout_secs: u64,

    /// Vector width for the hashing encoder
    #[arg(long, default_value_t = 384)]
    pub hashing_dimensions: usize,
}

impl EncoderArgs {
    /// Builds the selected encoder.
    pub fn build_encoder(&self) -> Result<Box<dyn Encoder>> {
        match self.encoder {
            EncoderKind::Openai => {
                let key = self
                    .openai_api_key
                    .clone()
                    .ok_or_else(|| anyhow!("OPENAI_API_KEY must be set for the OpenAI encoder"))?;
                let embedder = OpenAiEmbedder::new(
                    key,
                    self.openai_base_url.clone(),
                    self.embed_model.clone(),
                    self.embed_dimensions,
                    Duration::from_secs(self.embed_timeout_secs.max(1)),
                    self.embed_batch.max(1),
                )?;
                Ok(Box::new(embedder))
            }
            EncoderKind::Hashing => Ok(Box::new(HashingEncoder::new(self.hashing_dimensions)?)),
        }
    }
}

/// Flags selecting the answering model.
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// Target LLM provider
    #[arg(long, env = "SITECHAT_LLM_PROVIDER", value_enum, default_value = "gemini")]
    pub llm_provider: ProviderKind,

    /// Model identifier (defaults per provider)
    #[arg(long, env = "SITECHAT_LLM_MODEL")]
    pub llm_model: Option<String>,

    /// Sampling temperature for the answer model
    #[arg(long, default_value_t = 0.2)]
    pub temperature: f32,

    /// Maximum tokens to request from the completion model
    #[arg(long, default_value_t = 2048)]
    pub max_completion_tokens: usize,
}

impl ProviderArgs {
    /// Builds the answer composer around the selected provider.
    pub fn build_composer(&self) -> Result<AnswerComposer> {
        let service = providers::build(self.llm_provider, self.llm_model.clone())?;
        Ok(AnswerComposer::new(service)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_completion_tokens))
    }
}
