//! Deterministic, offline bag-of-words embedder.
//!
//! Each lowercase alphanumeric token is hashed with BLAKE3 into one of `dim`
//! buckets. Texts sharing words get a positive cosine similarity. Stands in
//! for the embedding service in tests across the workspace.

use std::{future::Future, pin::Pin};

use crate::{EmbeddingsProvider, RagError};

#[derive(Clone, Debug)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    /// # Errors
    /// [`RagError::Config`] if `dim` is zero.
    pub fn new(dim: usize) -> Result<Self, RagError> {
        if dim == 0 {
            return Err(RagError::Config("hashing embedder dim must be > 0".into()));
        }
        Ok(Self { dim })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Synchronous core of [`EmbeddingsProvider::embed`].
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        let lower = text.to_lowercase();
        for token in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let h = blake3::hash(token.as_bytes());
            let mut head = [0u8; 8];
            head.copy_from_slice(&h.as_bytes()[..8]);
            let bucket = (u64::from_le_bytes(head) % self.dim as u64) as usize;
            v[bucket] += 1.0;
        }
        v
    }
}

impl EmbeddingsProvider for HashingEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.embed_sync(text)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_same_vector() {
        let e = HashingEmbedder::new(64).unwrap();
        assert_eq!(e.embed_sync("Hạn nộp hồ sơ"), e.embed_sync("hạn NỘP hồ sơ!"));
        assert_eq!(e.embed_sync("a b").len(), 64);
    }

    #[test]
    fn zero_dim_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }

    #[tokio::test]
    async fn async_matches_sync() {
        let e = HashingEmbedder::new(32).unwrap();
        let v = e.embed("deadline").await.unwrap();
        assert_eq!(v, e.embed_sync("deadline"));
        assert_eq!(v.iter().sum::<f32>(), 1.0);
    }
}
