use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Path consulted when `--config` is not given. A missing file there
/// means "use built-in defaults".
pub const DEFAULT_CONFIG_PATH: &str = "./config/rvh.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub vectorize: VectorizeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectorConfig {
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    /// Prefix the discovered entity path is re-rooted under.
    #[serde(default = "default_reviews_base")]
    pub reviews_base: String,
    /// Leading path segments of an entity href dropped before re-rooting.
    #[serde(default = "default_skip_segments")]
    pub skip_segments: usize,
    /// Inserted after the last `-` of the rewritten URL (`slug-123` → `slug-h123`).
    #[serde(default = "default_id_marker")]
    pub id_marker: String,
    #[serde(default = "default_entity_limit")]
    pub entity_limit: usize,
    #[serde(default = "default_page_capacity")]
    pub page_capacity: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            reviews_base: default_reviews_base(),
            skip_segments: default_skip_segments(),
            id_marker: default_id_marker(),
            entity_limit: default_entity_limit(),
            page_capacity: default_page_capacity(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            backoff_ms: default_backoff_ms(),
            user_agent: default_user_agent(),
            selectors: SelectorConfig::default(),
        }
    }
}

fn default_listing_url() -> String {
    "https://www.wakacje.pl/hotele/".to_string()
}
fn default_reviews_base() -> String {
    "https://www.wakacje.pl/opinie/hotele/".to_string()
}
fn default_skip_segments() -> usize {
    2
}
fn default_id_marker() -> String {
    "h".to_string()
}
fn default_entity_limit() -> usize {
    10
}
fn default_page_capacity() -> usize {
    20
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_backoff_ms() -> u64 {
    500
}
fn default_user_agent() -> String {
    concat!("review-harness/", env!("CARGO_PKG_VERSION")).to_string()
}

/// CSS selectors handed to the HTML reader.
#[derive(Debug, Deserialize, Clone)]
pub struct SelectorConfig {
    #[serde(default = "default_entity_container")]
    pub entity_container: String,
    #[serde(default = "default_entity_link")]
    pub entity_link: String,
    #[serde(default = "default_review_container")]
    pub review_container: String,
    #[serde(default = "default_review_text")]
    pub review_text: String,
    #[serde(default = "default_next_page")]
    pub next_page: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            entity_container: default_entity_container(),
            entity_link: default_entity_link(),
            review_container: default_review_container(),
            review_text: default_review_text(),
            next_page: default_next_page(),
        }
    }
}

fn default_entity_container() -> String {
    "div.swiper-wrapper".to_string()
}
fn default_entity_link() -> String {
    "a".to_string()
}
fn default_review_container() -> String {
    "div.opinions__list".to_string()
}
fn default_review_text() -> String {
    "p.opinion__attributes-content".to_string()
}
fn default_next_page() -> String {
    "li.pagination__item--next a".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            language: default_language(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}
fn default_language() -> String {
    "pl".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct NormalizeConfig {
    #[serde(default = "default_stemmer")]
    pub stemmer: String,
    /// `form<TAB>lemma` file merged over the built-in table.
    #[serde(default)]
    pub lemma_dictionary: Option<PathBuf>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            stemmer: default_stemmer(),
            lemma_dictionary: None,
        }
    }
}

fn default_stemmer() -> String {
    "polish".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default = "default_filter_source")]
    pub source: String,
    #[serde(default = "default_language")]
    pub stopwords_language: String,
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
    #[serde(default)]
    pub stopwords_file: Option<PathBuf>,
    #[serde(default = "default_min_count")]
    pub min_count: usize,
    #[serde(default)]
    pub max_count: Option<usize>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            source: default_filter_source(),
            stopwords_language: default_language(),
            extra_stopwords: Vec::new(),
            stopwords_file: None,
            min_count: default_min_count(),
            max_count: None,
        }
    }
}

fn default_filter_source() -> String {
    "lemmatized".to_string()
}
fn default_min_count() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_top_percent")]
    pub top_percent: f64,
    #[serde(default = "default_wordcloud_words")]
    pub wordcloud_words: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            top_percent: default_top_percent(),
            wordcloud_words: default_wordcloud_words(),
        }
    }
}

fn default_top_k() -> usize {
    20
}
fn default_top_percent() -> f64 {
    0.3
}
fn default_wordcloud_words() -> usize {
    150
}

#[derive(Debug, Deserialize, Clone)]
pub struct VectorizeConfig {
    #[serde(default = "default_vectorize_source")]
    pub source: String,
    #[serde(default = "default_weighting")]
    pub weighting: String,
    #[serde(default)]
    pub binary: bool,
    #[serde(default = "default_min_df")]
    pub min_df: usize,
}

impl Default for VectorizeConfig {
    fn default() -> Self {
        Self {
            source: default_vectorize_source(),
            weighting: default_weighting(),
            binary: false,
            min_df: default_min_df(),
        }
    }
}

fn default_vectorize_source() -> String {
    "documents".to_string()
}
fn default_weighting() -> String {
    "count".to_string()
}
fn default_min_df() -> usize {
    1
}

impl Config {
    /// Reject settings no stage can run with.
    pub fn validate(&self) -> Result<()> {
        let c = &self.collector;
        if c.entity_limit == 0 {
            anyhow::bail!("collector.entity_limit must be >= 1");
        }
        if c.page_capacity == 0 {
            anyhow::bail!("collector.page_capacity must be >= 1");
        }
        if c.timeout_secs == 0 {
            anyhow::bail!("collector.timeout_secs must be > 0");
        }

        match self.normalize.stemmer.as_str() {
            "polish" | "porter" => {}
            other => anyhow::bail!(
                "Unknown stemmer: '{}'. Must be polish or porter.",
                other
            ),
        }

        match self.filter.source.as_str() {
            "lemmatized" | "stemmed" => {}
            other => anyhow::bail!(
                "Unknown filter.source: '{}'. Must be lemmatized or stemmed.",
                other
            ),
        }
        if self.filter.min_count == 0 {
            anyhow::bail!("filter.min_count must be >= 1");
        }
        if let Some(max) = self.filter.max_count {
            if max < self.filter.min_count {
                anyhow::bail!("filter.max_count must be >= filter.min_count");
            }
        }

        if !(self.analysis.top_percent > 0.0 && self.analysis.top_percent <= 100.0) {
            anyhow::bail!("analysis.top_percent must be in (0, 100]");
        }

        match self.vectorize.source.as_str() {
            "documents" | "filtered" => {}
            other => anyhow::bail!(
                "Unknown vectorize.source: '{}'. Must be documents or filtered.",
                other
            ),
        }
        match self.vectorize.weighting.as_str() {
            "count" | "tfidf" => {}
            other => anyhow::bail!(
                "Unknown vectorize.weighting: '{}'. Must be count or tfidf.",
                other
            ),
        }
        if self.vectorize.min_df == 0 {
            anyhow::bail!("vectorize.min_df must be >= 1");
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

/// Load an explicit config, or fall back to defaults when none was given
/// and [`DEFAULT_CONFIG_PATH`] does not exist.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                load_config(path)
            } else {
                let config = Config::default();
                config.validate()?;
                Ok(config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.collector.page_capacity, 20);
        assert_eq!(config.collector.entity_limit, 10);
        assert_eq!(config.pipeline.language, "pl");
        assert_eq!(config.filter.min_count, 1);
        assert!(config.filter.max_count.is_none());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [collector]
            entity_limit = 3

            [collector.selectors]
            next_page = "a.next"
            "#,
        )
        .unwrap();
        assert_eq!(config.collector.entity_limit, 3);
        assert_eq!(config.collector.selectors.next_page, "a.next");
        assert_eq!(
            config.collector.selectors.review_container,
            "div.opinions__list"
        );
    }

    #[test]
    fn rejects_zero_entity_limit() {
        let config: Config = toml::from_str("[collector]\nentity_limit = 0").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("entity_limit"));
    }

    #[test]
    fn rejects_inverted_count_thresholds() {
        let config: Config =
            toml::from_str("[filter]\nmin_count = 5\nmax_count = 2").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_weighting() {
        let config: Config = toml::from_str("[vectorize]\nweighting = \"bm25\"").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bm25"));
    }

    #[test]
    fn example_config_is_valid() {
        let config: Config = toml::from_str(include_str!("../config/rvh.example.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.normalize.stemmer, "polish");
        assert_eq!(config.vectorize.source, "documents");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = resolve_config(Some(Path::new("/nonexistent/rvh.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
