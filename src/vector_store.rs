//! In-memory embedding index over one site's chunks.

use std::cmp::Ordering;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::chunker::Chunk;
use crate::embeddings::{cosine_similarity, Encoder};

/// Failures while building an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// There was nothing to encode.
    #[error("no chunks to index")]
    NoChunks,
    /// The encoder failed.
    #[error("encoding failed: {0}")]
    Encode(String),
    /// The encoder returned the wrong number of vectors.
    #[error("encoder returned {vectors} vectors for {chunks} chunks")]
    Misaligned {
        /// Chunks submitted.
        chunks: usize,
        /// Vectors received.
        vectors: usize,
    },
    /// The encoder returned vectors of differing widths.
    #[error("vector {position} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        /// Offending vector position.
        position: usize,
        /// Width of the first vector.
        expected: usize,
        /// Width of the offending vector.
        found: usize,
    },
}

/// A retrieved chunk with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Matching chunk.
    pub chunk: Chunk,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

/// Chunks and their vectors, aligned by position.
#[derive(Debug)]
pub struct VectorIndex {
    site_url: String,
    pages_indexed: usize,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl VectorIndex {
    /// Encodes every chunk in one batch and assembles the index.
    ///
    /// The encoder is never called when `chunks` is empty.
    pub fn build(
        site_url: impl Into<String>,
        pages_indexed: usize,
        chunks: Vec<Chunk>,
        encoder: &dyn Encoder,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::NoChunks);
        }
        let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        let vectors = encoder
            .encode_batch(&texts)
            .map_err(|err| IndexError::Encode(format!("{err:#}")))?;
        if vectors.len() != chunks.len() {
            return Err(IndexError::Misaligned {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }
        let dimensions = vectors[0].len();
        if let Some((position, vector)) = vectors
            .iter()
            .enumerate()
            .find(|(_, vector)| vector.len() != dimensions)
        {
            return Err(IndexError::DimensionMismatch {
                position,
                expected: dimensions,
                found: vector.len(),
            });
        }

        let site_url = site_url.into();
        info!(
            site = %site_url,
            pages = pages_indexed,
            chunks = chunks.len(),
            dimensions,
            "index built"
        );
        Ok(Self {
            site_url,
            pages_indexed,
            chunks,
            vectors,
            dimensions,
        })
    }

    /// Normalized seed URL the index was built from.
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Pages that contributed content.
    pub fn pages_indexed(&self) -> usize {
        self.pages_indexed
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Vector width.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Returns up to `top_k` hits scoring strictly above `floor`, best first.
    ///
    /// Ties keep chunk order. Encoding failures and width mismatches yield an
    /// empty result.
    pub fn search(
        &self,
        query: &str,
        encoder: &dyn Encoder,
        top_k: usize,
        floor: f32,
    ) -> Vec<SearchHit> {
        if self.chunks.is_empty() || top_k == 0 {
            return Vec::new();
        }
        let query_vector = match encoder.encode(query) {
            Ok(vector) => vector,
            Err(err) => {
                warn!(error = %err, "query encoding failed");
                return Vec::new();
            }
        };
        if query_vector.len() != self.dimensions {
            warn!(
                expected = self.dimensions,
                found = query_vector.len(),
                "query vector width mismatch"
            );
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .map(|vector| cosine_similarity(&query_vector, vector))
            .enumerate()
            .collect();
        scored.sort_by(|a, b| descending_score(a.1, b.1));

        scored
            .into_iter()
            .take(top_k)
            .filter(|(_, score)| *score > floor)
            .map(|(idx, score)| SearchHit {
                chunk: self.chunks[idx].clone(),
                score,
            })
            .collect()
    }
}

/// Best score first; NaN sorts after every real score.
fn descending_score(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.total_cmp(&a),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}
