//! Error taxonomy for collection and pipeline stages.
//!
//! Collection errors are caught per entity/page and turned into
//! [`SkipRecord`](crate::models::SkipRecord)s; pipeline errors abort the
//! current stage only. Both surface at the CLI as `anyhow::Error`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// Network or timeout failure that survived every retry.
    #[error("fetch failed for {url} after {attempts} attempt(s): {message}")]
    TransientFetch {
        url: String,
        attempts: u32,
        message: String,
    },

    /// The page did not contain the markup the reader expects.
    #[error("unexpected markup at {url}: missing {expected}")]
    StructureMismatch { url: String, expected: String },

    /// A stage's input artifact is absent or empty.
    #[error("input artifact is missing or empty: {}", artifact.display())]
    EmptyInput { artifact: PathBuf },

    /// No morphological model is available for the configured language.
    #[error("no morphological model for language '{language}'; set normalize.lemma_dictionary")]
    UnsupportedLanguage { language: String },
}

impl HarnessError {
    /// Short machine-friendly name, stored alongside skip records.
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::TransientFetch { .. } => "transient_fetch",
            HarnessError::StructureMismatch { .. } => "structure_mismatch",
            HarnessError::EmptyInput { .. } => "empty_input",
            HarnessError::UnsupportedLanguage { .. } => "unsupported_language",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = HarnessError::TransientFetch {
            url: "https://example.test/p/3".to_string(),
            attempts: 4,
            message: "connection reset".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("https://example.test/p/3"));
        assert!(msg.contains("4 attempt"));
        assert_eq!(err.kind(), "transient_fetch");
    }

    #[test]
    fn empty_input_names_artifact() {
        let err = HarnessError::EmptyInput {
            artifact: PathBuf::from("results/1_opinions.json"),
        };
        assert!(err.to_string().contains("1_opinions.json"));
        assert_eq!(err.kind(), "empty_input");
    }
}
