//! Persisted pipeline artifacts.
//!
//! Every stage reads its predecessor's artifact from the output directory
//! and writes its own, so any stage can be re-run from disk. Writes go to a
//! temporary sibling first and are renamed into place, which keeps the
//! previous version intact if a run is aborted mid-write.
//!
//! | Artifact | File |
//! |----------|------|
//! | Review dataset | `1_opinions.json` |
//! | Corpus | `2_corpus.txt` |
//! | Raw tokens | `3_tokenized.txt` |
//! | Lemmatized tokens | `4_lemmatized.txt` |
//! | Stemmed tokens | `5_stemmed.txt` |
//! | Filtered tokens | `6_filtered.txt` |
//! | Frequency table | `7_frequency.json` |
//! | Word cloud | `7_wordcloud.svg` |
//! | Top-token chart | `7_top_tokens.svg` |
//! | Feature matrix | `8_vectorized.json` |

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::HarnessError;
use crate::models::ReviewDataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Dataset,
    Corpus,
    Tokenized,
    Lemmatized,
    Stemmed,
    Filtered,
    Frequency,
    WordCloud,
    TopTokens,
    Vectorized,
}

impl Artifact {
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Dataset => "1_opinions.json",
            Artifact::Corpus => "2_corpus.txt",
            Artifact::Tokenized => "3_tokenized.txt",
            Artifact::Lemmatized => "4_lemmatized.txt",
            Artifact::Stemmed => "5_stemmed.txt",
            Artifact::Filtered => "6_filtered.txt",
            Artifact::Frequency => "7_frequency.json",
            Artifact::WordCloud => "7_wordcloud.svg",
            Artifact::TopTokens => "7_top_tokens.svg",
            Artifact::Vectorized => "8_vectorized.json",
        }
    }
}

/// Directory holding one run's artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.dir.join(artifact.file_name())
    }

    pub fn exists(&self, artifact: Artifact) -> bool {
        self.path(artifact).is_file()
    }

    pub fn write_dataset(&self, dataset: &ReviewDataset) -> Result<PathBuf> {
        self.write_json(Artifact::Dataset, dataset)
    }

    pub fn read_dataset(&self) -> Result<ReviewDataset> {
        self.read_json(Artifact::Dataset)
    }

    pub fn write_text(&self, artifact: Artifact, text: &str) -> Result<PathBuf> {
        self.write_atomic(artifact, text.as_bytes())
    }

    /// Read a text artifact; a missing or zero-length file is `EmptyInput`.
    pub fn read_text(&self, artifact: Artifact) -> Result<String> {
        let text = self.read_raw(artifact)?;
        if text.is_empty() {
            return Err(HarnessError::EmptyInput {
                artifact: self.path(artifact),
            }
            .into());
        }
        Ok(text)
    }

    /// Write one token per line, preserving order.
    pub fn write_tokens(&self, artifact: Artifact, tokens: &[String]) -> Result<PathBuf> {
        self.write_atomic(artifact, tokens.join("\n").as_bytes())
    }

    /// Read a token artifact. An existing but empty file is an empty sequence.
    pub fn read_tokens(&self, artifact: Artifact) -> Result<Vec<String>> {
        let text = self.read_raw(artifact)?;
        Ok(text.lines().map(str::to_string).collect())
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, artifact: Artifact, value: &T) -> Result<PathBuf> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_atomic(artifact, &bytes)
    }

    pub fn read_json<T: DeserializeOwned>(&self, artifact: Artifact) -> Result<T> {
        let text = self.read_text(artifact)?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", self.path(artifact).display()))
    }

    fn read_raw(&self, artifact: Artifact) -> Result<String> {
        let path = self.path(artifact);
        if !path.is_file() {
            return Err(HarnessError::EmptyInput { artifact: path }.into());
        }
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    fn write_atomic(&self, artifact: Artifact, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.path(artifact);
        let tmp = self.dir.join(format!(".{}.tmp", artifact.file_name()));
        std::fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move {} into place", path.display()))?;

        tracing::info!(path = %path.display(), "artifact written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tokens_roundtrip_one_per_line() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path().join("results"));
        let tokens: Vec<String> = ["hotel", "było", "czyste"].iter().map(|s| s.to_string()).collect();

        let path = store.write_tokens(Artifact::Tokenized, &tokens).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hotel\nbyło\nczyste");
        assert_eq!(store.read_tokens(Artifact::Tokenized).unwrap(), tokens);
    }

    #[test]
    fn empty_token_file_is_empty_sequence() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());
        store.write_tokens(Artifact::Filtered, &[]).unwrap();
        assert!(store.read_tokens(Artifact::Filtered).unwrap().is_empty());
    }

    #[test]
    fn missing_artifact_is_empty_input() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let err = store.read_tokens(Artifact::Lemmatized).unwrap_err();
        let harness = err.downcast_ref::<HarnessError>().unwrap();
        assert_eq!(harness.kind(), "empty_input");
    }

    #[test]
    fn zero_length_corpus_is_empty_input() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());
        store.write_text(Artifact::Corpus, "").unwrap();
        assert!(store.read_text(Artifact::Corpus).is_err());
    }

    #[test]
    fn overwrite_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());
        store.write_text(Artifact::Corpus, "first").unwrap();
        store.write_text(Artifact::Corpus, "second").unwrap();
        assert_eq!(store.read_text(Artifact::Corpus).unwrap(), "second");
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
