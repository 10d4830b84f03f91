//! Review collection: entity discovery and review pagination.
//!
//! A run fetches the listing page once, derives up to N entity review
//! URLs from it, and then walks each entity's review pages in order:
//!
//! ```text
//! listing ──▶ entities[0..N] ──▶ page 1 ──▶ page 2 ──▶ … ──▶ (no next / empty page)
//! ```
//!
//! Failures are isolated. A fetch that fails after retries stops the
//! current entity but keeps every page already parsed; markup that does
//! not match on an entity's first page skips the entity. Each of these
//! becomes a [`SkipRecord`] in the dataset. Only a failure to read the
//! listing page itself aborts the run, since nothing can be enumerated
//! without it.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::artifacts::ArtifactStore;
use crate::config::{CollectorConfig, Config};
use crate::document::{HtmlReader, ReviewPageReader};
use crate::error::HarnessError;
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::models::{Entity, ReviewDataset, ReviewRecord, SkipRecord};
use crate::progress::{CollectProgressEvent, CollectProgressReporter, NoProgress};

/// Shared flag checked between page fetches.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One parsed review page.
#[derive(Debug, Clone)]
pub struct ReviewPage {
    pub number: u32,
    pub url: String,
    pub texts: Vec<String>,
}

/// Lazy, finite sequence of an entity's review pages.
///
/// Each call to [`next_page`](ReviewPages::next_page) fetches exactly one
/// page. The sequence ends (returns `None`) when a page has no reviews or
/// no "next page" control was found on the previous page. An error is
/// yielded at most once, after which the sequence is exhausted.
pub struct ReviewPages<'a> {
    fetcher: &'a dyn PageFetcher,
    reader: &'a dyn ReviewPageReader,
    next_url: Option<String>,
    visited: HashSet<String>,
    page: u32,
}

impl<'a> ReviewPages<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, reader: &'a dyn ReviewPageReader, first_url: &str) -> Self {
        Self {
            fetcher,
            reader,
            next_url: Some(first_url.to_string()),
            visited: HashSet::new(),
            page: 0,
        }
    }

    /// Number of the page most recently requested (0 before the first call).
    pub fn page_number(&self) -> u32 {
        self.page
    }

    pub async fn next_page(&mut self) -> Option<std::result::Result<ReviewPage, HarnessError>> {
        let url = self.next_url.take()?;
        self.visited.insert(url.clone());
        self.page += 1;

        let html = match self.fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(e) => return Some(Err(e)),
        };

        let texts = match self.reader.review_texts(&html) {
            Some(texts) => texts,
            None => {
                return Some(Err(HarnessError::StructureMismatch {
                    url,
                    expected: "review container".to_string(),
                }))
            }
        };

        if texts.is_empty() {
            return None;
        }

        // Pagination controls that point back at a visited page end the walk.
        self.next_url = self
            .reader
            .next_page_href(&html)
            .and_then(|href| resolve_href(&url, &href))
            .filter(|next| !self.visited.contains(next));

        Some(Ok(ReviewPage {
            number: self.page,
            url,
            texts,
        }))
    }
}

pub struct Collector<'a> {
    config: &'a CollectorConfig,
    fetcher: &'a dyn PageFetcher,
    reader: &'a dyn ReviewPageReader,
    progress: &'a dyn CollectProgressReporter,
    cancel: CancelFlag,
}

impl<'a> Collector<'a> {
    pub fn new(
        config: &'a CollectorConfig,
        fetcher: &'a dyn PageFetcher,
        reader: &'a dyn ReviewPageReader,
    ) -> Self {
        Self {
            config,
            fetcher,
            reader,
            progress: &NoProgress,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn CollectProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch the listing page and derive up to `limit` distinct entities,
    /// in the order the portal lists them.
    pub async fn discover(&self, limit: usize) -> Result<Vec<Entity>> {
        let listing_url = &self.config.listing_url;
        self.progress.report(CollectProgressEvent::Discovering {
            listing_url: listing_url.clone(),
        });

        let html = self.fetcher.fetch(listing_url).await?;
        let links = self
            .reader
            .entity_links(&html)
            .ok_or_else(|| HarnessError::StructureMismatch {
                url: listing_url.clone(),
                expected: "entity section".to_string(),
            })?;

        let mut seen = HashSet::new();
        let mut entities = Vec::new();
        for link in links {
            if entities.len() >= limit {
                break;
            }
            let Some(url) = review_listing_url(self.config, listing_url, &link.href) else {
                tracing::warn!(href = %link.href, "cannot derive review URL, ignoring link");
                continue;
            };
            if !seen.insert(url.clone()) {
                continue;
            }
            let id = entity_id_from_url(&self.config.reviews_base, &url);
            let name = if link.text.is_empty() {
                id.clone()
            } else {
                link.text
            };
            entities.push(Entity { id, name, url });
        }

        tracing::info!(count = entities.len(), "entities discovered");
        Ok(entities)
    }

    /// Run discovery and paginate every entity into a dataset.
    pub async fn collect(&self, limit: usize) -> Result<ReviewDataset> {
        let mut dataset = ReviewDataset::new(&self.config.listing_url);
        let entities = self.discover(limit).await?;
        let mut seen_reviews = HashSet::new();
        let total = entities.len() as u64;

        for (i, entity) in entities.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }
            self.progress.report(CollectProgressEvent::Entity {
                n: i as u64 + 1,
                total,
                name: entity.name.clone(),
            });
            self.collect_entity(entity, &mut dataset, &mut seen_reviews)
                .await;
        }

        let interrupted = self.cancel.is_cancelled();
        if interrupted {
            tracing::warn!("collection interrupted, keeping pages parsed so far");
        }
        dataset.finish(interrupted);
        Ok(dataset)
    }

    async fn collect_entity(
        &self,
        entity: &Entity,
        dataset: &mut ReviewDataset,
        seen_reviews: &mut HashSet<String>,
    ) {
        let mut pages = ReviewPages::new(self.fetcher, self.reader, &entity.url);
        let mut listed = false;
        let mut skipped = false;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match pages.next_page().await {
                None => break,
                Some(Ok(page)) => {
                    if !listed {
                        dataset.entities.push(entity.clone());
                        listed = true;
                    }
                    let added = self.push_page(entity, page, dataset, seen_reviews);
                    self.progress.report(CollectProgressEvent::Page {
                        entity: entity.name.clone(),
                        page: pages.page_number(),
                        reviews: added,
                    });
                }
                Some(Err(err)) => {
                    let page = pages.page_number();
                    if page == 1 {
                        tracing::warn!(entity = %entity.id, error = %err, "skipping entity");
                        skipped = true;
                    } else {
                        tracing::warn!(entity = %entity.id, page, error = %err, "stopping pagination early");
                    }
                    dataset.skips.push(SkipRecord {
                        entity_id: Some(entity.id.clone()),
                        url: error_url(&err).unwrap_or(&entity.url).to_string(),
                        page: Some(page),
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }

        // First page parsed but held no reviews: the entity was processed, just empty.
        if !listed && !skipped && pages.page_number() > 0 {
            dataset.entities.push(entity.clone());
        }
    }

    /// Append a page's reviews, dropping texts already seen for this entity.
    /// Returns the number of records added.
    fn push_page(
        &self,
        entity: &Entity,
        page: ReviewPage,
        dataset: &mut ReviewDataset,
        seen_reviews: &mut HashSet<String>,
    ) -> u64 {
        let mut texts = page.texts;
        if texts.len() > self.config.page_capacity {
            tracing::warn!(
                url = %page.url,
                found = texts.len(),
                capacity = self.config.page_capacity,
                "page exceeds capacity, truncating"
            );
            texts.truncate(self.config.page_capacity);
        }

        dataset.pages_parsed += 1;
        let mut added = 0;
        for text in texts {
            if !seen_reviews.insert(review_key(&entity.id, &text)) {
                dataset.duplicates_suppressed += 1;
                continue;
            }
            dataset.records.push(ReviewRecord {
                entity_id: entity.id.clone(),
                text,
                page: page.number,
            });
            added += 1;
        }
        added
    }
}

/// Deduplication key for a review: SHA-256 over entity id and raw text.
fn review_key(entity_id: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entity_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn error_url(err: &HarnessError) -> Option<&str> {
    match err {
        HarnessError::TransientFetch { url, .. } | HarnessError::StructureMismatch { url, .. } => {
            Some(url)
        }
        _ => None,
    }
}

/// Resolve a possibly relative href against the page it was found on.
pub fn resolve_href(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Derive an entity's review-listing URL from its listing-page href.
///
/// The href path loses its first `skip_segments` segments, is re-rooted
/// under `reviews_base`, and gets `id_marker` inserted after the last `-`
/// of its final segment: with the defaults,
/// `/wczasy/egipt/hotel-sunrise-123/` becomes
/// `https://www.wakacje.pl/opinie/hotele/hotel-sunrise-h123/`.
pub fn review_listing_url(config: &CollectorConfig, listing_url: &str, href: &str) -> Option<String> {
    let absolute = Url::parse(&resolve_href(listing_url, href)?).ok()?;
    let path = absolute.path();
    let trailing_slash = path.ends_with('/');

    let mut segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .skip(config.skip_segments)
        .map(str::to_string)
        .collect();

    let last = segments.last_mut()?;
    if let Some(pos) = last.rfind('-') {
        last.insert_str(pos + 1, &config.id_marker);
    }

    let mut url = config.reviews_base.trim_end_matches('/').to_string();
    url.push('/');
    url.push_str(&segments.join("/"));
    if trailing_slash {
        url.push('/');
    }
    Some(url)
}

/// Path of a review URL relative to `reviews_base`, without surrounding
/// slashes. Distinct review URLs always give distinct ids.
fn entity_id_from_url(reviews_base: &str, url: &str) -> String {
    let relative = url
        .strip_prefix(reviews_base.trim_end_matches('/'))
        .unwrap_or(url);
    let relative = relative.trim_matches('/');
    if relative.is_empty() {
        url.to_string()
    } else {
        relative.to_string()
    }
}

/// Run `rvh collect`: paginate every entity and persist the dataset.
///
/// Ctrl-C stops the walk between pages; whatever was parsed is still
/// written, with `run.interrupted` set. A second Ctrl-C exits at once.
pub async fn run_collect(
    config: &Config,
    limit: Option<usize>,
    progress: &dyn CollectProgressReporter,
) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.collector)?;
    let cancel = CancelFlag::new();
    let signal_task = tokio::spawn(watch_ctrl_c(cancel.clone()));

    let result = collect_to_store(config, limit, &fetcher, progress, cancel).await;
    signal_task.abort();
    let (dataset, path) = result?;

    print_summary(&dataset);
    println!("  written: {}", path.display());
    println!("ok");
    Ok(())
}

/// Collect through `fetcher` and write `1_opinions.json` under
/// `pipeline.output_dir`. Returns the dataset and the written path.
pub async fn collect_to_store(
    config: &Config,
    limit: Option<usize>,
    fetcher: &dyn PageFetcher,
    progress: &dyn CollectProgressReporter,
    cancel: CancelFlag,
) -> Result<(ReviewDataset, PathBuf)> {
    let limit = limit.unwrap_or(config.collector.entity_limit);
    if limit == 0 {
        anyhow::bail!("--limit must be >= 1");
    }

    let reader = HtmlReader::new(&config.collector.selectors)?;
    let dataset = Collector::new(&config.collector, fetcher, &reader)
        .with_progress(progress)
        .with_cancel(cancel)
        .collect(limit)
        .await?;

    let store = ArtifactStore::new(&config.pipeline.output_dir);
    let path = store.write_dataset(&dataset)?;
    Ok((dataset, path))
}

/// First Ctrl-C cancels between pages; the second exits with status 130.
async fn watch_ctrl_c(cancel: CancelFlag) {
    while tokio::signal::ctrl_c().await.is_ok() {
        if interrupt(&cancel) {
            eprintln!("interrupted again, exiting without writing");
            std::process::exit(130);
        }
        eprintln!("interrupt received, finishing current page (Ctrl-C again to abort)");
    }
}

/// Record one interrupt. Returns `true` when the run was already cancelled.
fn interrupt(cancel: &CancelFlag) -> bool {
    if cancel.is_cancelled() {
        return true;
    }
    cancel.cancel();
    false
}

fn print_summary(dataset: &ReviewDataset) {
    println!(
        "collect{}",
        if dataset.run.interrupted {
            " (interrupted)"
        } else {
            ""
        }
    );
    println!("  entities: {}", dataset.entities.len());
    println!("  pages parsed: {}", dataset.pages_parsed);
    println!("  reviews: {}", dataset.records.len());
    println!("  duplicates suppressed: {}", dataset.duplicates_suppressed);
    if dataset.skips.is_empty() {
        println!("  skipped: 0");
    } else {
        println!("  skipped: {}", dataset.skips.len());
        for skip in &dataset.skips {
            let page = skip
                .page
                .map(|p| format!(" page {}", p))
                .unwrap_or_default();
            println!("    [{}] {}{}: {}", skip.kind, skip.url, page, skip.message);
        }
    }
}
