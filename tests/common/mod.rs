//! In-memory collaborators for pipeline tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use sitechat::{
    normalize, AnswerComposer, CompletionRequest, CompletionService, Encoder, FetchConfig,
    PipelineControls, RenderError, RenderedPage, Renderer, SiteChat,
};

/// Serves canned pages keyed by normalized URL and counts renders.
#[derive(Clone, Default)]
pub struct FakeSite {
    pages: Arc<Mutex<HashMap<String, String>>>,
    renders: Arc<Mutex<Vec<String>>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, title: &str, body: &str, links: &[&str]) -> Self {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{href}">more</a>"#))
            .collect();
        let html = format!(
            "<html><head><title>{title}</title></head><body><nav>Menu</nav><main><p>{body}</p>{anchors}</main></body></html>"
        );
        self.pages.lock().insert(normalize(url), html);
        self
    }

    pub fn render_count(&self) -> usize {
        self.renders.lock().len()
    }
}

impl Renderer for FakeSite {
    fn render(&self, url: &str) -> Result<RenderedPage, RenderError> {
        self.renders.lock().push(url.to_string());
        self.pages
            .lock()
            .get(&normalize(url))
            .map(|html| RenderedPage {
                url: url.to_string(),
                html: html.clone(),
            })
            .ok_or(RenderError::Status(404))
    }
}

pub const VOCABULARY: &[&str] = &["hello", "world", "pricing", "refund", "rust", "crawler"];

/// Counts vocabulary words; anything else encodes to the zero vector.
pub struct KeywordEncoder;

impl Encoder for KeywordEncoder {
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lowered = text.to_lowercase();
                let words: Vec<&str> = lowered
                    .split(|ch: char| !ch.is_alphanumeric())
                    .filter(|word| !word.is_empty())
                    .collect();
                VOCABULARY
                    .iter()
                    .map(|term| words.iter().filter(|word| **word == *term).count() as f32)
                    .collect()
            })
            .collect())
    }
}

/// Records prompts and credentials; replies with a fixed answer or error.
#[derive(Clone)]
pub struct FakeCompletion {
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
    reply: Result<String, String>,
}

impl FakeCompletion {
    pub fn answering(text: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            reply: Ok(text.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            reply: Err(message.to_string()),
        }
    }
}

impl CompletionService for FakeCompletion {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        self.calls
            .lock()
            .push((request.prompt.to_string(), request.api_key.to_string()));
        self.reply.clone().map_err(|message| anyhow!(message))
    }
}

pub fn controls() -> PipelineControls {
    PipelineControls {
        fetch: FetchConfig {
            settle_delay: std::time::Duration::ZERO,
            ..FetchConfig::default()
        },
        ..PipelineControls::default()
    }
}

pub fn session(site: &FakeSite, completion: &FakeCompletion) -> SiteChat {
    SiteChat::new(
        Box::new(site.clone()),
        Box::new(KeywordEncoder),
        AnswerComposer::new(Box::new(completion.clone())),
        controls(),
    )
}

/// Body text long enough to pass the page and chunk length floors.
pub fn prose(topic: &str) -> String {
    format!("{topic} details for curious readers. ").repeat(8)
}
