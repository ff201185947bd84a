//! Grounding prompt assembly and answer generation.

use tracing::warn;

use crate::providers::{CompletionRequest, CompletionService};
use crate::vector_store::SearchHit;

const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: usize = 2048;

/// Renders the prompt sent to the completion service.
///
/// Hits are labelled by 1-based rank and source title, in the order given.
pub fn build_prompt(query: &str, hits: &[SearchHit]) -> String {
    let mut context = String::new();
    for (rank, hit) in hits.iter().enumerate() {
        context.push_str(&format!(
            "\n\nSource {} (from {}):\n{}",
            rank + 1,
            hit.chunk.source_title,
            hit.chunk.text
        ));
    }

    let mut prompt = String::new();
    prompt.push_str("Based on the following website content, please answer the user's question accurately and helpfully.\n\n");
    prompt.push_str("Website Content:\n");
    prompt.push_str(&context);
    prompt.push_str("\n\nUser Question: ");
    prompt.push_str(query);
    prompt.push_str("\n\nInstructions:\n");
    prompt.push_str("1. Answer based only on the provided website content\n");
    prompt.push_str("2. If the information isn't available in the content, say so\n");
    prompt.push_str("3. Include relevant source references when possible\n");
    prompt.push_str("4. Be concise but comprehensive\n");
    prompt.push_str("5. If you reference specific information, mention which source it came from\n");
    prompt.push_str("\nAnswer:");
    prompt
}

/// Turns retrieved hits into an answer through a completion service.
pub struct AnswerComposer {
    service: Box<dyn CompletionService>,
    temperature: f32,
    max_tokens: usize,
}

impl AnswerComposer {
    /// Wraps `service` with default sampling settings.
    pub fn new(service: Box<dyn CompletionService>) -> Self {
        Self {
            service,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Overrides the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Overrides the completion token ceiling.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    /// Answers `query` from `hits`.
    ///
    /// Always yields text: service failures become a readable error message.
    pub fn compose(&self, query: &str, hits: &[SearchHit], credential: &str) -> String {
        let prompt = build_prompt(query, hits);
        let request = CompletionRequest {
            prompt: &prompt,
            api_key: credential,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        match self.service.complete(&request) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "completion failed");
                format!("Error generating response: {err}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunk;
    use anyhow::{anyhow, Result};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Recording {
        prompts: Arc<Mutex<Vec<(String, String)>>>,
        reply: Result<String, String>,
    }

    impl CompletionService for Recording {
        fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
            self.prompts
                .lock()
                .push((request.prompt.to_string(), request.api_key.to_string()));
            self.reply.clone().map_err(|message| anyhow!(message))
        }
    }

    fn hit(title: &str, text: &str, score: f32) -> SearchHit {
        SearchHit {
            chunk: Chunk {
                text: text.to_string(),
                source_url: "https://site.test/".to_string(),
                source_title: title.to_string(),
                chunk_index: 0,
            },
            score,
        }
    }

    #[test]
    fn prompt_labels_sources_by_rank() {
        let hits = vec![
            hit("Pricing", "Plans start at $10.", 0.9),
            hit("FAQ", "Refunds within 30 days.", 0.5),
        ];
        let prompt = build_prompt("How much is it?", &hits);

        assert!(prompt.contains("Source 1 (from Pricing):\nPlans start at $10."));
        assert!(prompt.contains("Source 2 (from FAQ):\nRefunds within 30 days."));
        assert!(prompt.contains("User Question: How much is it?"));
        assert!(prompt.contains("Answer based only on the provided website content"));
        let first = prompt.find("Source 1").expect("first source");
        let second = prompt.find("Source 2").expect("second source");
        assert!(first < second);
    }

    #[test]
    fn compose_returns_service_text_verbatim() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let composer = AnswerComposer::new(Box::new(Recording {
            prompts: Arc::clone(&prompts),
            reply: Ok("  It costs $10 (Source 1).\n".to_string()),
        }));

        let answer = composer.compose("price?", &[hit("Pricing", "Plans", 0.9)], "key-123");

        assert_eq!(answer, "  It costs $10 (Source 1).\n");
        let recorded = prompts.lock();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].1, "key-123");
        assert!(recorded[0].0.contains("User Question: price?"));
    }

    #[test]
    fn compose_turns_failures_into_text() {
        let composer = AnswerComposer::new(Box::new(Recording {
            prompts: Arc::new(Mutex::new(Vec::new())),
            reply: Err("quota exceeded".to_string()),
        }));

        let answer = composer.compose("q", &[hit("T", "body", 0.9)], "key");
        assert_eq!(answer, "Error generating response: quota exceeded");
    }
}
