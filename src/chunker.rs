//! Splits page text into fixed-size word chunks for embedding.

use serde::{Deserialize, Serialize};

use crate::controls::ChunkerConfig;
use crate::fetcher::Page;

/// Atomic unit of retrieval, carrying its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Words of the group joined by single spaces.
    pub text: String,
    /// URL of the page the chunk came from.
    pub source_url: String,
    /// Title of the page the chunk came from.
    pub source_title: String,
    /// Zero-based ordinal of the word group within its page.
    pub chunk_index: usize,
}

/// Chunks every page in input order.
///
/// Each page's content is split on whitespace into consecutive groups of
/// `words_per_chunk` words. Groups whose trimmed text is not longer than
/// `min_chunk_chars` are dropped but still consume their ordinal.
pub fn chunk_pages(pages: &[Page], config: &ChunkerConfig) -> Vec<Chunk> {
    let group = config.words_per_chunk.max(1);
    let mut chunks = Vec::new();
    for page in pages {
        let words: Vec<&str> = page.content.split_whitespace().collect();
        for (chunk_index, window) in words.chunks(group).enumerate() {
            let text = window.join(" ");
            if text.trim().chars().count() <= config.min_chunk_chars {
                continue;
            }
            chunks.push(Chunk {
                text,
                source_url: page.url.clone(),
                source_title: page.title.clone(),
                chunk_index,
            });
        }
    }
    chunks
}
