//! Bag-of-words encoding.
//!
//! [`CountVectorizer`] learns a vocabulary once with [`fit`](CountVectorizer::fit)
//! and maps documents onto it. The vocabulary is sorted lexicographically,
//! so column `j` always refers to the same term for a fitted encoder.
//! Terms outside the vocabulary contribute nothing.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::VectorizeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    /// Raw term counts.
    Count,
    /// Count × smooth IDF, rows L2-normalized.
    Tfidf,
}

impl Weighting {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "count" => Ok(Self::Count),
            "tfidf" => Ok(Self::Tfidf),
            other => anyhow::bail!(
                "Unknown vectorize.weighting: '{}'. Must be count or tfidf.",
                other
            ),
        }
    }
}

/// Sparse document × term matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub weighting: Weighting,
    pub vocabulary: Vec<String>,
    /// `[rows, cols]`
    pub shape: [usize; 2],
    /// Non-zero `(row, col, value)` triplets, row-major.
    pub entries: Vec<(usize, usize, f64)>,
}

impl FeatureMatrix {
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    /// Dense copy of row `i`.
    pub fn row(&self, i: usize) -> Vec<f64> {
        let mut dense = vec![0.0; self.cols()];
        for &(r, c, v) in &self.entries {
            if r == i {
                dense[c] = v;
            }
        }
        dense
    }
}

#[derive(Debug, Clone)]
pub struct CountVectorizer {
    weighting: Weighting,
    binary: bool,
    min_df: usize,
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl Default for CountVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountVectorizer {
    pub fn new() -> Self {
        Self {
            weighting: Weighting::Count,
            binary: false,
            min_df: 1,
            vocabulary: Vec::new(),
            index: HashMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn from_config(config: &VectorizeConfig) -> Result<Self> {
        Ok(Self::new()
            .weighting(Weighting::parse(&config.weighting)?)
            .binary(config.binary)
            .min_df(config.min_df))
    }

    pub fn weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Record presence (1) instead of counts.
    pub fn binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    /// Drop terms appearing in fewer than `min_df` documents.
    pub fn min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df.max(1);
        self
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn fit(&mut self, documents: &[Vec<String>]) -> &mut Self {
        let mut df: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in documents {
            let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_default() += 1;
            }
        }

        // BTreeMap iteration is already lexicographic
        let kept: Vec<(&str, usize)> = df.into_iter().filter(|&(_, n)| n >= self.min_df).collect();

        let n = documents.len() as f64;
        self.vocabulary = kept.iter().map(|(t, _)| t.to_string()).collect();
        self.idf = kept
            .iter()
            .map(|&(_, d)| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();
        self.index = self
            .vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        tracing::debug!(documents = documents.len(), terms = self.vocabulary.len(), "vocabulary fitted");
        self
    }

    /// Sparse `(col, value)` pairs for one document, sorted by column.
    fn encode(&self, document: &[String]) -> Vec<(usize, f64)> {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in document {
            if let Some(&col) = self.index.get(token) {
                *counts.entry(col).or_default() += 1.0;
            }
        }

        let mut row: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(col, c)| (col, if self.binary { 1.0 } else { c }))
            .collect();

        if self.weighting == Weighting::Tfidf {
            for (col, v) in row.iter_mut() {
                *v *= self.idf[*col];
            }
            let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, v) in row.iter_mut() {
                    *v /= norm;
                }
            }
        }
        row
    }

    /// Dense row for `document`; entry `j` is the weight of vocabulary term `j`.
    pub fn transform(&self, document: &[String]) -> Vec<f64> {
        let mut dense = vec![0.0; self.vocabulary.len()];
        for (col, v) in self.encode(document) {
            dense[col] = v;
        }
        dense
    }

    pub fn transform_all(&self, documents: &[Vec<String>]) -> FeatureMatrix {
        let entries = documents
            .iter()
            .enumerate()
            .flat_map(|(r, doc)| self.encode(doc).into_iter().map(move |(c, v)| (r, c, v)))
            .collect();
        FeatureMatrix {
            weighting: self.weighting,
            vocabulary: self.vocabulary.clone(),
            shape: [documents.len(), self.vocabulary.len()],
            entries,
        }
    }

    pub fn fit_transform(&mut self, documents: &[Vec<String>]) -> FeatureMatrix {
        self.fit(documents);
        self.transform_all(documents)
    }
}
