//! Runtime configuration for indexing and retrieval.

use std::path::PathBuf;

use crate::errors::RagError;

/// File name of the persisted index inside the index directory.
pub const INDEX_FILE_NAME: &str = "faq_index.json";

/// Configuration for FAQ indexing and retrieval.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Directory holding the persisted index artifact.
    pub index_dir: PathBuf,
    /// Embedding model name, recorded in the artifact and checked on load.
    pub embedding_model: String,
    /// Expected embedding size; `None` accepts whatever the provider returns.
    pub embedding_dim: Option<usize>,
    /// Maximum number of concurrent embedding calls while indexing.
    pub embedding_concurrency: usize,
}

impl RagConfig {
    /// Creates a default config for a given index directory and model.
    pub fn new_default(index_dir: impl Into<PathBuf>, embedding_model: impl Into<String>) -> Self {
        Self {
            index_dir: index_dir.into(),
            embedding_model: embedding_model.into(),
            embedding_dim: None,
            embedding_concurrency: 4,
        }
    }

    /// Reads `INDEX_DIR`, `EMBEDDING_MODEL`, `EMBEDDING_DIM` and
    /// `EMBEDDING_CONCURRENCY`.
    pub fn from_env() -> Result<Self, RagError> {
        let mut cfg = Self::new_default(
            env_or("INDEX_DIR", "faiss_index"),
            env_or("EMBEDDING_MODEL", "all-minilm"),
        );
        cfg.embedding_dim = env_parse("EMBEDDING_DIM")?;
        if let Some(n) = env_parse("EMBEDDING_CONCURRENCY")? {
            cfg.embedding_concurrency = n;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Full path of the index artifact.
    pub fn index_path(&self) -> PathBuf {
        self.index_dir.join(INDEX_FILE_NAME)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.index_dir.as_os_str().is_empty() {
            return Err(RagError::Config("index_dir is empty".into()));
        }
        if self.embedding_concurrency == 0 {
            return Err(RagError::Config("embedding_concurrency must be > 0".into()));
        }
        if self.embedding_dim == Some(0) {
            return Err(RagError::Config("embedding_dim must be > 0".into()));
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse(key: &str) -> Result<Option<usize>, RagError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| RagError::Config(format!("{key}: {e}"))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_four_workers() {
        let cfg = RagConfig::new_default("faiss_index", "all-minilm");
        assert_eq!(cfg.embedding_concurrency, 4);
        assert!(cfg.validate().is_ok());
        assert!(cfg.index_path().ends_with("faq_index.json"));
    }

    #[test]
    fn rejects_zero_values() {
        let mut cfg = RagConfig::new_default("dir", "m");
        cfg.embedding_concurrency = 0;
        assert!(matches!(cfg.validate(), Err(RagError::Config(_))));

        let mut cfg = RagConfig::new_default("dir", "m");
        cfg.embedding_dim = Some(0);
        assert!(cfg.validate().is_err());
    }
}
