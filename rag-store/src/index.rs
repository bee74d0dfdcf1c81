//! Persisted flat vector index with exhaustive cosine search.
//!
//! The artifact is a single JSON document, `faq_index.json`, inside the index
//! directory. Writes go to a temp file in the same directory followed by a
//! rename, so the final name never holds a truncated artifact.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::INDEX_FILE_NAME;
use crate::errors::RagError;
use crate::record::IndexedEntry;

/// Current artifact format version.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// In-memory FAQ index. Read-only once built or loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaqIndex {
    version: u32,
    dimension: usize,
    embedding_model: String,
    entries: Vec<IndexedEntry>,
}

impl FaqIndex {
    /// Builds an index from entries that all have `dimension` components.
    ///
    /// # Errors
    /// - [`RagError::EmptyCorpus`] when `entries` is empty
    /// - [`RagError::VectorSizeMismatch`] when an entry has another size
    pub fn new(
        embedding_model: impl Into<String>,
        entries: Vec<IndexedEntry>,
    ) -> Result<Self, RagError> {
        let dimension = entries
            .first()
            .map(|e| e.embedding.len())
            .ok_or(RagError::EmptyCorpus)?;
        let idx = Self {
            version: INDEX_FORMAT_VERSION,
            dimension,
            embedding_model: embedding_model.into(),
            entries,
        };
        idx.check_dimensions()?;
        Ok(idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    /// Writes `dir/faq_index.json`, creating `dir` and replacing any prior artifact.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf, RagError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(INDEX_FILE_NAME);
        let tmp = dir.join(format!("{INDEX_FILE_NAME}.tmp"));

        let bytes = serde_json::to_vec(self)?;
        let write = || -> io::Result<()> {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(&bytes)?;
            f.sync_all()?;
            fs::rename(&tmp, &path)
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        info!(
            path = %path.display(),
            entries = self.entries.len(),
            dimension = self.dimension,
            "FAQ index saved"
        );
        Ok(path)
    }

    /// Loads `dir/faq_index.json`.
    ///
    /// # Errors
    /// - [`RagError::IndexNotFound`] if the artifact is missing or holds no entries
    /// - [`RagError::Parse`] if the artifact is not a valid index document
    /// - [`RagError::VectorSizeMismatch`] if an entry disagrees with `dimension`
    /// - [`RagError::Config`] for an unknown format version
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, RagError> {
        let path = dir.as_ref().join(INDEX_FILE_NAME);
        debug!(path = %path.display(), "FaqIndex::load");

        let data = match fs::read(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RagError::IndexNotFound(path));
            }
            Err(e) => return Err(e.into()),
        };

        let idx: FaqIndex = serde_json::from_slice(&data)?;
        if idx.version != INDEX_FORMAT_VERSION {
            return Err(RagError::Config(format!(
                "unsupported index format version {} (expected {INDEX_FORMAT_VERSION})",
                idx.version
            )));
        }
        if idx.entries.is_empty() {
            warn!(path = %path.display(), "index artifact has no entries");
            return Err(RagError::IndexNotFound(path));
        }
        idx.check_dimensions()?;

        info!(
            path = %path.display(),
            entries = idx.entries.len(),
            dimension = idx.dimension,
            model = %idx.embedding_model,
            "FAQ index loaded"
        );
        Ok(idx)
    }

    /// Returns up to `k` entries ranked by cosine similarity, nearest first.
    ///
    /// Ties keep corpus order.
    ///
    /// # Errors
    /// - [`RagError::Config`] when `k == 0`
    /// - [`RagError::VectorSizeMismatch`] when the query has another dimension
    pub fn search(
        &self,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<(f32, &IndexedEntry)>, RagError> {
        if k == 0 {
            return Err(RagError::Config("top_k must be > 0".into()));
        }
        if query_vector.len() != self.dimension {
            return Err(RagError::VectorSizeMismatch {
                got: query_vector.len(),
                want: self.dimension,
            });
        }

        let qn = norm(query_vector);
        let mut scored: Vec<(f32, &IndexedEntry)> = self
            .entries
            .iter()
            .map(|e| (cosine(query_vector, qn, &e.embedding), e))
            .collect();
        // Stable sort: equal scores stay in corpus order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        trace!(k, hits = scored.len(), "FaqIndex::search");
        Ok(scored)
    }

    fn check_dimensions(&self) -> Result<(), RagError> {
        if self.dimension == 0 {
            return Err(RagError::Config("index dimension is zero".into()));
        }
        match self
            .entries
            .iter()
            .find(|e| e.embedding.len() != self.dimension)
        {
            Some(bad) => Err(RagError::VectorSizeMismatch {
                got: bad.embedding.len(),
                want: self.dimension,
            }),
            None => Ok(()),
        }
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity; zero vectors score `0.0`.
fn cosine(q: &[f32], q_norm: f32, e: &[f32]) -> f32 {
    let en = norm(e);
    if q_norm == 0.0 || en == 0.0 {
        return 0.0;
    }
    let dot: f32 = q.iter().zip(e).map(|(a, b)| a * b).sum();
    dot / (q_norm * en)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(v: &[f32], answer: &str) -> IndexedEntry {
        IndexedEntry {
            embedding: v.to_vec(),
            answer: answer.into(),
            source_question: format!("q:{answer}"),
        }
    }

    fn sample() -> FaqIndex {
        FaqIndex::new(
            "test-model",
            vec![
                entry(&[1.0, 0.0, 0.0], "x"),
                entry(&[0.0, 1.0, 0.0], "y"),
                entry(&[0.7, 0.7, 0.0], "xy"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn search_ranks_nearest_first() {
        let idx = sample();
        let hits = idx.search(&[1.0, 0.1, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].1.answer, "x");
        assert_eq!(hits[1].1.answer, "xy");
        assert!(hits[0].0 >= hits[1].0);
    }

    #[test]
    fn ties_keep_corpus_order() {
        let idx = FaqIndex::new(
            "m",
            vec![entry(&[1.0, 0.0], "first"), entry(&[2.0, 0.0], "second")],
        )
        .unwrap();
        let hits = idx.search(&[3.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].1.answer, "first");
        assert_eq!(hits[1].1.answer, "second");
    }

    #[test]
    fn k_larger_than_index_returns_all() {
        assert_eq!(sample().search(&[0.0, 0.0, 1.0], 10).unwrap().len(), 3);
    }

    #[test]
    fn search_rejects_zero_k_and_wrong_dim() {
        let idx = sample();
        assert!(matches!(idx.search(&[1.0, 0.0, 0.0], 0), Err(RagError::Config(_))));
        assert!(matches!(
            idx.search(&[1.0, 0.0], 1),
            Err(RagError::VectorSizeMismatch { got: 2, want: 3 })
        ));
    }

    #[test]
    fn new_rejects_empty_and_ragged() {
        assert!(matches!(FaqIndex::new("m", vec![]), Err(RagError::EmptyCorpus)));
        let ragged = vec![entry(&[1.0, 0.0], "a"), entry(&[1.0], "b")];
        assert!(matches!(
            FaqIndex::new("m", ragged),
            Err(RagError::VectorSizeMismatch { got: 1, want: 2 })
        ));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let idx = sample();
        let path = idx.save(dir.path().join("nested/index")).unwrap();
        assert!(path.ends_with(INDEX_FILE_NAME));

        let loaded = FaqIndex::load(dir.path().join("nested/index")).unwrap();
        assert_eq!(loaded, idx);
        assert!(!dir.path().join("nested/index/faq_index.json.tmp").exists());
    }

    #[test]
    fn save_overwrites_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        sample().save(dir.path()).unwrap();
        let small = FaqIndex::new("m", vec![entry(&[1.0], "only")]).unwrap();
        small.save(dir.path()).unwrap();
        assert_eq!(FaqIndex::load(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn load_missing_is_index_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FaqIndex::load(dir.path()),
            Err(RagError::IndexNotFound(_))
        ));
    }

    #[test]
    fn load_with_zero_entries_is_index_not_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(INDEX_FILE_NAME),
            r#"{"version":1,"dimension":3,"embedding_model":"m","entries":[]}"#,
        )
        .unwrap();
        assert!(matches!(
            FaqIndex::load(dir.path()),
            Err(RagError::IndexNotFound(_))
        ));
    }

    #[test]
    fn load_garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INDEX_FILE_NAME), "not json").unwrap();
        assert!(matches!(FaqIndex::load(dir.path()), Err(RagError::Parse(_))));
    }

    #[test]
    fn load_checks_entry_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(INDEX_FILE_NAME),
            r#"{"version":1,"dimension":2,"embedding_model":"m","entries":[{"embedding":[1.0],"answer":"a","source_question":"q"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            FaqIndex::load(dir.path()),
            Err(RagError::VectorSizeMismatch { got: 1, want: 2 })
        ));
    }
}
