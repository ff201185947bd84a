//! Offline feature-hashing encoder.
//!
//! Each lowercase alphanumeric token is hashed into one of `dimensions`
//! buckets with a signed weight, then the vector is scaled to unit length.
//! No network, no model files; texts sharing vocabulary land close together.

use anyhow::{ensure, Result};

use crate::embeddings::{normalize_in_place, Encoder};

const BUCKET_SEED: u64 = 0x9e37_79b9_7f4a_7c15;
const SIGN_SEED: u64 = 0xc2b2_ae3d_27d4_eb4f;

/// Deterministic bag-of-words encoder backed by feature hashing.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dimensions: usize,
}

impl HashingEncoder {
    /// Builds an encoder producing `dimensions`-length vectors.
    pub fn new(dimensions: usize) -> Result<Self> {
        ensure!(dimensions > 0, "hashing encoder needs at least one dimension");
        Ok(Self { dimensions })
    }

    /// Output vector length.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokens(text) {
            let bytes = token.as_bytes();
            let bucket = (mix_hash(bytes, BUCKET_SEED) % self.dimensions as u64) as usize;
            let sign = if mix_hash(bytes, SIGN_SEED) & 1 == 0 {
                1.0
            } else {
                -1.0
            };
            vector[bucket] += sign;
        }
        normalize_in_place(&mut vector);
        vector
    }
}

impl Encoder for HashingEncoder {
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn mix_hash(data: &[u8], seed: u64) -> u64 {
    let mut hash = seed ^ data.len() as u64;
    for &byte in data {
        hash ^= (byte as u64).wrapping_mul(0x1000_0000_01b3);
        hash = hash.rotate_left(13).wrapping_mul(0xff51_afd7_ed55_8ccd);
    }
    hash ^ (hash >> 33)
}
