//! Lemmatization through a morphological analyzer.
//!
//! [`lemmatize`] maps every token to its dictionary base form. Tokens the
//! analyzer does not know pass through unchanged, so the output always has
//! the same length and order as the input.
//!
//! [`DictionaryAnalyzer`] is the built-in analyzer: a form → lemma table.
//! Polish ships with an embedded seed table; a PoliMorf-style TSV file
//! (`form<TAB>lemma[<TAB>tags…]`) can extend it or provide a table for any
//! other language.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::HarnessError;

const POLISH_SEED: &str = include_str!("../data/pl_lemmas.tsv");

pub trait MorphologicalAnalyzer: Send + Sync {
    /// Language code this analyzer was built for (e.g. `"pl"`).
    fn language(&self) -> &str;

    /// Dictionary base form of `token`, or `None` if the token is unknown.
    fn lemma(&self, token: &str) -> Option<&str>;
}

/// Lemmatize a token sequence. Total and order-preserving.
pub fn lemmatize(tokens: &[String], analyzer: &dyn MorphologicalAnalyzer) -> Vec<String> {
    tokens
        .iter()
        .map(|t| analyzer.lemma(t).unwrap_or(t).to_string())
        .collect()
}

#[derive(Debug, Clone)]
pub struct DictionaryAnalyzer {
    language: String,
    lemmas: HashMap<String, String>,
}

impl DictionaryAnalyzer {
    /// Build the analyzer for `language`.
    ///
    /// Languages with an embedded table (`pl`) work without a dictionary
    /// file; for anything else `dictionary` is required, otherwise this
    /// fails with [`HarnessError::UnsupportedLanguage`]. Entries from the
    /// file override embedded ones.
    pub fn load(language: &str, dictionary: Option<&Path>) -> Result<Self> {
        let language = language.to_lowercase();
        let mut analyzer = match builtin_table(&language) {
            Some(seed) => Self::from_tsv(&language, seed),
            None if dictionary.is_some() => Self {
                language: language.clone(),
                lemmas: HashMap::new(),
            },
            None => return Err(HarnessError::UnsupportedLanguage { language }.into()),
        };

        if let Some(path) = dictionary {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read lemma dictionary: {}", path.display()))?;
            let extra = Self::from_tsv(&language, &text);
            tracing::info!(path = %path.display(), entries = extra.len(), "lemma dictionary loaded");
            analyzer.lemmas.extend(extra.lemmas);
        }

        Ok(analyzer)
    }

    /// Parse a TSV table. Blank lines, `#` comments and lines without a
    /// tab are ignored; the first lemma listed for a form wins.
    pub fn from_tsv(language: &str, text: &str) -> Self {
        let mut lemmas = HashMap::new();
        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let mut cols = line.split('\t');
            let (Some(form), Some(lemma)) = (cols.next(), cols.next()) else {
                continue;
            };
            let (form, lemma) = (form.trim(), lemma.trim());
            if form.is_empty() || lemma.is_empty() {
                continue;
            }
            lemmas
                .entry(form.to_lowercase())
                .or_insert_with(|| lemma.to_lowercase());
        }
        Self {
            language: language.to_string(),
            lemmas,
        }
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

impl MorphologicalAnalyzer for DictionaryAnalyzer {
    fn language(&self) -> &str {
        &self.language
    }

    fn lemma(&self, token: &str) -> Option<&str> {
        self.lemmas.get(token).map(String::as_str)
    }
}

fn builtin_table(language: &str) -> Option<&'static str> {
    match language {
        "pl" | "polish" => Some(POLISH_SEED),
        _ => None,
    }
}
