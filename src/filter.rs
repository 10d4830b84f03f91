//! Stopword and frequency-threshold filtering.
//!
//! A token is dropped when it is a stopword or when its count in the input
//! sequence falls outside `[min_count, max_count]`. Thresholds are absolute
//! counts over the input, so removing other tokens never changes whether a
//! survivor passes and applying the filter twice gives the same result.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use stop_words::{get, LANGUAGE};

use crate::config::FilterConfig;

/// Lower-cased stopword set.
#[derive(Debug, Clone, Default)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl StopwordSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::empty();
        set.extend(words);
        set
    }

    /// Built-in list for `language`. Unknown codes (and `"none"`) give an
    /// empty set.
    pub fn for_language(language: &str) -> Self {
        let lang = match language.to_lowercase().as_str() {
            "pl" | "polish" => LANGUAGE::Polish,
            "en" | "english" => LANGUAGE::English,
            "de" | "german" => LANGUAGE::German,
            "fr" | "french" => LANGUAGE::French,
            "es" | "spanish" => LANGUAGE::Spanish,
            "it" | "italian" => LANGUAGE::Italian,
            "ru" | "russian" => LANGUAGE::Russian,
            "" | "none" => return Self::empty(),
            other => {
                tracing::warn!(language = other, "no built-in stopword list, using none");
                return Self::empty();
            }
        };
        Self::from_words(get(lang).iter().map(|s| s.to_string()))
    }

    /// Union of the built-in list, `extra_stopwords`, and `stopwords_file`.
    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        let mut set = Self::for_language(&config.stopwords_language);
        set.extend(&config.extra_stopwords);
        if let Some(path) = &config.stopwords_file {
            set.extend_from_file(path)?;
        }
        Ok(set)
    }

    /// One word per line; blank lines and `#` comments are ignored.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stopwords file: {}", path.display()))?;
        self.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        );
        Ok(())
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words
            .extend(words.into_iter().map(|w| w.as_ref().trim().to_lowercase()));
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TokenFilter {
    stopwords: StopwordSet,
    min_count: usize,
    max_count: Option<usize>,
}

impl TokenFilter {
    pub fn new(stopwords: StopwordSet) -> Self {
        Self {
            stopwords,
            min_count: 1,
            max_count: None,
        }
    }

    pub fn with_thresholds(mut self, min_count: usize, max_count: Option<usize>) -> Self {
        self.min_count = min_count;
        self.max_count = max_count;
        self
    }

    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        let stopwords = StopwordSet::from_config(config)?;
        tracing::debug!(stopwords = stopwords.len(), "stopword set ready");
        Ok(Self::new(stopwords).with_thresholds(config.min_count, config.max_count))
    }

    /// Filter `tokens`, keeping survivors in their original order.
    pub fn apply(&self, tokens: &[String]) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for t in tokens {
            *counts.entry(t.as_str()).or_default() += 1;
        }

        tokens
            .iter()
            .filter(|t| {
                let count = counts[t.as_str()];
                !self.stopwords.contains(t)
                    && count >= self.min_count
                    && self.max_count.map_or(true, |max| count <= max)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::tokenize;

    const SENTENCE: &str = "Hotel było bardzo czyste i miłe. Obsługa była miła.";

    #[test]
    fn stoplist_removes_listed_tokens() {
        let tokens = tokenize(SENTENCE);
        assert_eq!(tokens.len(), 9);

        let filter = TokenFilter::new(StopwordSet::from_words(["było", "i", "była"]));
        let kept = filter.apply(&tokens);
        assert_eq!(kept, vec!["hotel", "bardzo", "czyste", "miłe", "obsługa", "miła"]);
    }

    #[test]
    fn filter_is_idempotent() {
        let tokens: Vec<String> = "a b a c c c d b a e"
            .split(' ')
            .map(String::from)
            .collect();
        let filter = TokenFilter::new(StopwordSet::from_words(["d"])).with_thresholds(2, Some(3));
        let once = filter.apply(&tokens);
        assert_eq!(once, vec!["a", "b", "a", "c", "c", "c", "b", "a"]);
        assert_eq!(filter.apply(&once), once);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let tokens: Vec<String> = ["x", "x", "y"].iter().map(|s| s.to_string()).collect();
        let filter = TokenFilter::new(StopwordSet::empty()).with_thresholds(2, Some(2));
        assert_eq!(filter.apply(&tokens), vec!["x", "x"]);
    }

    #[test]
    fn stopwords_are_case_folded() {
        let set = StopwordSet::from_words(["  Oraz ", "NIE"]);
        assert!(set.contains("oraz"));
        assert!(set.contains("nie"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn builtin_polish_list_is_loaded() {
        let set = StopwordSet::for_language("pl");
        assert!(!set.is_empty());
        assert!(StopwordSet::for_language("none").is_empty());
    }

    #[test]
    fn config_merges_extra_words_and_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("stop.txt");
        std::fs::write(&path, "# hotel words\nhotel\n\nPokój\n").unwrap();

        let config = FilterConfig {
            stopwords_language: "none".into(),
            extra_stopwords: vec!["bardzo".into()],
            stopwords_file: Some(path),
            ..FilterConfig::default()
        };
        let set = StopwordSet::from_config(&config).unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains("pokój"));
        assert!(!set.contains("# hotel words"));
    }

    #[test]
    fn missing_stopwords_file_is_an_error() {
        let config = FilterConfig {
            stopwords_file: Some("/nonexistent/stop.txt".into()),
            ..FilterConfig::default()
        };
        assert!(TokenFilter::from_config(&config).is_err());
    }
}
