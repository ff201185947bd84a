//! Concrete [`Encoder`](crate::embeddings::Encoder) implementations.

pub mod hashing;
pub mod openai;
