//! Staged text-processing pipeline.
//!
//! ```text
//! 1_opinions.json ─▶ corpus ─▶ tokenize ─▶ normalize ─▶ filter ─▶ analyze ─▶ vectorize
//!                      │          │        ├ 4_lemmatized  │         ├ 7_frequency.json
//!                 2_corpus.txt    │        └ 5_stemmed     │         ├ 7_wordcloud.svg
//!                           3_tokenized.txt          6_filtered.txt  └ 7_top_tokens.svg
//! ```
//!
//! Each stage reads only its predecessor's persisted artifact and writes its
//! own through [`ArtifactStore`], so `rvh process --from filter` re-runs the
//! tail of the chain against whatever is already on disk. Everything that
//! can fail on configuration (analyzer language, stopword file, stemmer and
//! weighting names) is resolved in [`Pipeline::new`], before any stage runs.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::artifacts::{Artifact, ArtifactStore};
use crate::config::Config;
use crate::corpus::build_corpus;
use crate::filter::TokenFilter;
use crate::frequency::FrequencyTable;
use crate::lemmatize::{lemmatize, DictionaryAnalyzer, MorphologicalAnalyzer};
use crate::stem::{stem_tokens, stemmer_for, Stemmer};
use crate::tokenize::{tokenize, tokenize_documents};
use crate::vectorize::CountVectorizer;
use crate::visualize::{Plotter, SvgPlotter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Corpus,
    Tokenize,
    Normalize,
    Filter,
    Analyze,
    Vectorize,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Corpus,
        Stage::Tokenize,
        Stage::Normalize,
        Stage::Filter,
        Stage::Analyze,
        Stage::Vectorize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Corpus => "corpus",
            Stage::Tokenize => "tokenize",
            Stage::Normalize => "normalize",
            Stage::Filter => "filter",
            Stage::Analyze => "analyze",
            Stage::Vectorize => "vectorize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown stage: '{}'. Must be one of corpus, tokenize, normalize, filter, analyze, vectorize.",
                    s
                )
            })
    }
}

/// Which normalized sequence the filter stage reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    Lemmatized,
    Stemmed,
}

impl FilterSource {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "lemmatized" => Ok(FilterSource::Lemmatized),
            "stemmed" => Ok(FilterSource::Stemmed),
            other => anyhow::bail!(
                "Unknown filter.source: '{}'. Must be lemmatized or stemmed.",
                other
            ),
        }
    }

    fn artifact(self) -> Artifact {
        match self {
            FilterSource::Lemmatized => Artifact::Lemmatized,
            FilterSource::Stemmed => Artifact::Stemmed,
        }
    }
}

/// What the vectorizer treats as documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorizeSource {
    /// One document per corpus line, raw tokens.
    Documents,
    /// The filtered sequence as a single document.
    Filtered,
}

impl VectorizeSource {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "documents" => Ok(VectorizeSource::Documents),
            "filtered" => Ok(VectorizeSource::Filtered),
            other => anyhow::bail!(
                "Unknown vectorize.source: '{}'. Must be documents or filtered.",
                other
            ),
        }
    }
}

/// What a `process` run did, for the console summary.
#[derive(Debug, Clone, Default)]
pub struct ProcessSummary {
    pub stages: Vec<Stage>,
    pub documents: Option<usize>,
    pub tokens: Option<usize>,
    pub total_words: Option<usize>,
    pub unique_words: Option<usize>,
    pub top: Vec<(String, usize)>,
    pub matrix_shape: Option<[usize; 2]>,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    store: ArtifactStore,
    analyzer: Box<dyn MorphologicalAnalyzer>,
    stemmer: Box<dyn Stemmer>,
    filter: TokenFilter,
    filter_source: FilterSource,
    vectorize_source: VectorizeSource,
    plotter: SvgPlotter,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        config.validate()?;
        let analyzer = DictionaryAnalyzer::load(
            &config.pipeline.language,
            config.normalize.lemma_dictionary.as_deref(),
        )?;
        let stemmer = stemmer_for(&config.normalize.stemmer)?;
        let filter = TokenFilter::from_config(&config.filter)?;
        // surfaces a bad weighting before any stage writes
        CountVectorizer::from_config(&config.vectorize)?;
        let filter_source = FilterSource::parse(&config.filter.source)?;
        let vectorize_source = VectorizeSource::parse(&config.vectorize.source)?;

        Ok(Self {
            config,
            store: ArtifactStore::new(&config.pipeline.output_dir),
            analyzer: Box::new(analyzer),
            stemmer,
            filter,
            filter_source,
            vectorize_source,
            plotter: SvgPlotter::default(),
        })
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run stages `from..=to` in order. Defaults to the whole chain.
    pub fn run(&self, from: Option<Stage>, to: Option<Stage>) -> Result<ProcessSummary> {
        let from = from.unwrap_or(Stage::Corpus);
        let to = to.unwrap_or(Stage::Vectorize);
        if from > to {
            anyhow::bail!("--from {} comes after --to {}", from, to);
        }

        let mut summary = ProcessSummary::default();
        for stage in Stage::ALL.into_iter().filter(|s| (from..=to).contains(s)) {
            tracing::info!(stage = %stage, "stage started");
            self.run_stage(stage, &mut summary)
                .with_context(|| format!("stage '{}' failed", stage))?;
            summary.stages.push(stage);
        }
        Ok(summary)
    }

    fn run_stage(&self, stage: Stage, summary: &mut ProcessSummary) -> Result<()> {
        match stage {
            Stage::Corpus => {
                let dataset = self.store.read_dataset()?;
                let corpus = build_corpus(&dataset, &self.store.path(Artifact::Dataset))?;
                summary.documents = Some(corpus.lines().count());
                self.store.write_text(Artifact::Corpus, &corpus)?;
            }
            Stage::Tokenize => {
                let corpus = self.store.read_text(Artifact::Corpus)?;
                let tokens = tokenize(&corpus);
                summary.tokens = Some(tokens.len());
                self.store.write_tokens(Artifact::Tokenized, &tokens)?;
            }
            Stage::Normalize => {
                let tokens = self.store.read_tokens(Artifact::Tokenized)?;
                let lemmas = lemmatize(&tokens, self.analyzer.as_ref());
                self.store.write_tokens(Artifact::Lemmatized, &lemmas)?;
                let stems = stem_tokens(&tokens, self.stemmer.as_ref());
                self.store.write_tokens(Artifact::Stemmed, &stems)?;
            }
            Stage::Filter => {
                let source = self.filter_source.artifact();
                let tokens = self.store.read_tokens(source)?;
                let kept = self.filter.apply(&tokens);
                let table = FrequencyTable::from_tokens(&kept);
                summary.total_words = Some(table.total);
                summary.unique_words = Some(table.distinct);
                tracing::info!(
                    before = tokens.len(),
                    after = kept.len(),
                    "filtered {}",
                    source.file_name()
                );
                self.store.write_tokens(Artifact::Filtered, &kept)?;
            }
            Stage::Analyze => {
                let tokens = self.store.read_tokens(Artifact::Filtered)?;
                let table = FrequencyTable::from_tokens(&tokens);
                let analysis = &self.config.analysis;

                self.store.write_json(Artifact::Frequency, &table)?;
                let cloud = self.plotter.word_cloud(&table.top_k(analysis.wordcloud_words));
                self.store.write_text(Artifact::WordCloud, &cloud)?;
                let title = format!("Top {}% tokens", analysis.top_percent);
                let chart = self
                    .plotter
                    .bar_chart(&title, &table.top_percent(analysis.top_percent));
                self.store.write_text(Artifact::TopTokens, &chart)?;

                summary.total_words = Some(table.total);
                summary.unique_words = Some(table.distinct);
                summary.top = table
                    .top_k(analysis.top_k)
                    .into_iter()
                    .map(|t| (t.token.clone(), t.count))
                    .collect();
            }
            Stage::Vectorize => {
                let documents = match self.vectorize_source {
                    VectorizeSource::Filtered => vec![self.store.read_tokens(Artifact::Filtered)?],
                    VectorizeSource::Documents => {
                        tokenize_documents(&self.store.read_text(Artifact::Corpus)?)
                    }
                };
                let matrix =
                    CountVectorizer::from_config(&self.config.vectorize)?.fit_transform(&documents);
                summary.matrix_shape = Some(matrix.shape);
                self.store.write_json(Artifact::Vectorized, &matrix)?;
            }
        }
        Ok(())
    }
}

/// `rvh process`: run the stage range and print a summary.
pub fn run_process(config: &Config, from: Option<Stage>, to: Option<Stage>) -> Result<()> {
    let pipeline = Pipeline::new(config)?;
    let summary = pipeline.run(from, to)?;

    let names: Vec<&str> = summary.stages.iter().map(Stage::name).collect();
    println!("process {}", names.join(" → "));
    if let Some(n) = summary.documents {
        println!("  documents: {}", n);
    }
    if let Some(n) = summary.tokens {
        println!("  tokens: {}", n);
    }
    if let (Some(total), Some(unique)) = (summary.total_words, summary.unique_words) {
        println!("  Total Words: {}", total);
        println!("  Unique Words: {}", unique);
    }
    if !summary.top.is_empty() {
        println!("  top tokens:");
        for (token, count) in &summary.top {
            println!("    {:>6}  {}", count, token);
        }
    }
    if let Some([rows, cols]) = summary.matrix_shape {
        println!("  feature matrix: {} × {}", rows, cols);
    }
    println!("  output: {}", pipeline.store().dir().display());
    println!("ok");
    Ok(())
}

/// `rvh stats`: print the persisted frequency table.
pub fn run_stats(config: &Config) -> Result<()> {
    let store = ArtifactStore::new(&config.pipeline.output_dir);
    let table: FrequencyTable = store.read_json(Artifact::Frequency)?;

    println!("Review Harness — Frequency Stats");
    println!("================================");
    println!();
    println!("  Artifact:      {}", store.path(Artifact::Frequency).display());
    println!("  Total Words:   {}", table.total);
    println!("  Unique Words:  {}", table.distinct);
    println!();

    let top = table.top_k(config.analysis.top_k);
    if !top.is_empty() {
        println!("  {:<24} {:>8} {:>8}", "TOKEN", "COUNT", "SHARE");
        for term in top {
            let share = if table.total > 0 {
                term.count as f64 * 100.0 / table.total as f64
            } else {
                0.0
            };
            println!("  {:<24} {:>8} {:>7.2}%", term.token, term.count, share);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(stage.name().parse::<Stage>().unwrap(), stage);
        }
        assert!("collect".parse::<Stage>().is_err());
    }

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::Corpus < Stage::Tokenize);
        assert!(Stage::Analyze < Stage::Vectorize);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.pipeline.output_dir = tmp.path().to_path_buf();
        let pipeline = Pipeline::new(&config).unwrap();
        assert!(pipeline.run(Some(Stage::Filter), Some(Stage::Tokenize)).is_err());
    }

    #[test]
    fn unsupported_language_fails_before_any_stage() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.pipeline.output_dir = tmp.path().to_path_buf();
        config.pipeline.language = "xx".into();
        let err = Pipeline::new(&config).err().unwrap();
        assert!(err.to_string().contains("xx"));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn unknown_source_names_are_rejected_up_front() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.pipeline.output_dir = tmp.path().to_path_buf();
        config.filter.source = "stemed".into();
        let err = Pipeline::new(&config).err().unwrap();
        assert!(err.to_string().contains("stemed"));

        config.filter.source = "stemmed".into();
        config.vectorize.source = "corpus".into();
        let err = Pipeline::new(&config).err().unwrap();
        assert!(err.to_string().contains("corpus"));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn source_names_parse() {
        assert_eq!(FilterSource::parse("stemmed").unwrap(), FilterSource::Stemmed);
        assert_eq!(
            VectorizeSource::parse("documents").unwrap(),
            VectorizeSource::Documents
        );
        assert!(FilterSource::parse("Lemmatized").is_err());
    }
}
