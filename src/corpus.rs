//! Corpus construction from a review dataset.
//!
//! Reviews are joined in dataset order, one review per line. Whitespace
//! inside a review (including line breaks) is collapsed to single spaces,
//! so each line of the corpus is exactly one review and the boundary
//! between two reviews is always a token boundary.

use std::path::Path;

use crate::error::HarnessError;
use crate::models::ReviewDataset;

/// Build the corpus text. An empty dataset is [`HarnessError::EmptyInput`].
pub fn build_corpus(dataset: &ReviewDataset, source: &Path) -> Result<String, HarnessError> {
    let lines: Vec<String> = dataset
        .texts()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect();

    if lines.is_empty() {
        return Err(HarnessError::EmptyInput {
            artifact: source.to_path_buf(),
        });
    }

    Ok(lines.join("\n"))
}
