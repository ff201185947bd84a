//! Generative completion backends used by the answer composer.

use anyhow::Result;
use clap::ValueEnum;

mod anthropic;
mod gemini;
mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
/// Default OpenAI chat model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
/// Default Anthropic model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";

/// Trait implemented by concrete LLM providers.
pub trait CompletionService: Send + Sync {
    /// Returns the model's text for `request.prompt`.
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String>;
}

/// Request envelope shared by the various providers.
///
/// The credential travels with each request since it belongs to the scraped
/// site rather than to the provider.
pub struct CompletionRequest<'a> {
    /// Fully rendered grounding prompt.
    pub prompt: &'a str,
    /// Credential for the provider API.
    pub api_key: &'a str,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token ceiling.
    pub max_tokens: usize,
}

/// Providers selectable from the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ProviderKind {
    /// Google Gemini `generateContent`.
    Gemini,
    /// OpenAI chat completions.
    Openai,
    /// Anthropic messages.
    Anthropic,
}

impl ProviderKind {
    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => DEFAULT_GEMINI_MODEL,
            ProviderKind::Openai => DEFAULT_OPENAI_MODEL,
            ProviderKind::Anthropic => DEFAULT_ANTHROPIC_MODEL,
        }
    }
}

/// Builds the provider for `kind`, falling back to its default model.
pub fn build(kind: ProviderKind, model: Option<String>) -> Result<Box<dyn CompletionService>> {
    let model = model
        .filter(|model| !model.trim().is_empty())
        .unwrap_or_else(|| kind.default_model().to_string());
    Ok(match kind {
        ProviderKind::Gemini => Box::new(GeminiProvider::new(model)?),
        ProviderKind::Openai => Box::new(OpenAiProvider::new(model)?),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(model)?),
    })
}
