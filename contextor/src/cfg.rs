//! Runtime configuration loaded from environment variables.

/// Retrieval knobs of the ask pipeline. All fields have defaults via `from_env`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextorConfig {
    /// Candidates fetched from the index (`RAG_TOP_K`, default 2).
    pub initial_top_k: usize,
    /// Candidates actually placed in the prompt (`CTX_K`, default 1).
    pub context_k: usize,
}

impl Default for ContextorConfig {
    fn default() -> Self {
        Self {
            initial_top_k: 2,
            context_k: 1,
        }
    }
}

impl ContextorConfig {
    /// Build from environment variables; unparsable or zero values fall back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            initial_top_k: parse("RAG_TOP_K", d.initial_top_k),
            context_k: parse("CTX_K", d.context_k),
        }
    }
}

fn parse(k: &str, dflt: usize) -> usize {
    std::env::var(k)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(dflt)
}
