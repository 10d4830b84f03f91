//! # Review Harness
//!
//! Collects hotel reviews from a travel portal and runs them through a
//! staged text-processing pipeline: corpus, tokens, lemmas and stems,
//! stopword filtering, frequency analysis with SVG plots, and a
//! bag-of-words feature matrix.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────────────────────┐
//! │  Collector   │──▶│ 1_opinions   │──▶│ Pipeline                    │
//! │ fetch+parse  │   │   .json      │   │ corpus → tokens → lemmas/   │
//! │ paginate     │   └──────────────┘   │ stems → filter → analyze →  │
//! └──────────────┘                      │ vectorize                   │
//!                                       └──────────────┬──────────────┘
//!                                                      ▼
//!                                          results/2_… … 8_vectorized.json
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rvh collect --limit 10        # crawl reviews into results/1_opinions.json
//! rvh process                   # run every pipeline stage
//! rvh process --from filter     # re-run the tail after changing stopwords
//! rvh stats                     # print the frequency summary
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Review dataset types |
//! | [`document`] | HTML reader (CSS selectors) |
//! | [`fetch`] | HTTP page fetching with retry |
//! | [`collector`] | Entity discovery and review pagination |
//! | [`progress`] | Collection progress on stderr |
//! | [`artifacts`] | Persisted stage artifacts |
//! | [`corpus`] | Corpus builder |
//! | [`tokenize`] | Word tokenizer |
//! | [`lemmatize`] | Morphological analyzer and lemmatizer |
//! | [`stem`] | Polish and Porter stemmers |
//! | [`filter`] | Stopword and count-threshold filter |
//! | [`frequency`] | Frequency table |
//! | [`visualize`] | Word cloud and bar chart SVGs |
//! | [`vectorize`] | Count / TF-IDF vectorizer |
//! | [`pipeline`] | Stage runner |

pub mod artifacts;
pub mod collector;
pub mod config;
pub mod corpus;
pub mod document;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod frequency;
pub mod lemmatize;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod stem;
pub mod tokenize;
pub mod vectorize;
pub mod visualize;
