//! Core data models produced by the review collector.
//!
//! These types make up the review dataset, the first artifact of the
//! pipeline, and are persisted as `1_opinions.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reviewed subject (a hotel) discovered on the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Review-listing path under `reviews_base`, e.g. `hotel-sunrise-h123`.
    pub id: String,
    pub name: String,
    /// First page of the entity's review listing.
    pub url: String,
}

/// One review extracted from a review page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub entity_id: String,
    pub text: String,
    /// 1-based page the review was found on.
    pub page: u32,
}

/// An entity or page that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipRecord {
    pub entity_id: Option<String>,
    pub url: String,
    pub page: Option<u32>,
    pub kind: String,
    pub message: String,
}

/// Header describing the collection run that produced a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    pub listing_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub interrupted: bool,
}

/// Ordered reviews across all entities plus everything that was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDataset {
    pub run: RunInfo,
    pub entities: Vec<Entity>,
    pub records: Vec<ReviewRecord>,
    #[serde(default)]
    pub skips: Vec<SkipRecord>,
    #[serde(default)]
    pub pages_parsed: u64,
    #[serde(default)]
    pub duplicates_suppressed: u64,
}

impl ReviewDataset {
    pub fn new(listing_url: &str) -> Self {
        Self {
            run: RunInfo {
                run_id: uuid::Uuid::new_v4().to_string(),
                listing_url: listing_url.to_string(),
                started_at: Utc::now(),
                finished_at: None,
                interrupted: false,
            },
            entities: Vec::new(),
            records: Vec::new(),
            skips: Vec::new(),
            pages_parsed: 0,
            duplicates_suppressed: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Review texts in dataset order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.text.as_str())
    }

    /// Records belonging to one entity, in collection order.
    pub fn records_for<'a>(&'a self, entity_id: &'a str) -> impl Iterator<Item = &'a ReviewRecord> {
        self.records.iter().filter(move |r| r.entity_id == entity_id)
    }

    pub fn finish(&mut self, interrupted: bool) {
        self.run.finished_at = Some(Utc::now());
        self.run.interrupted = interrupted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_serde_roundtrip_keeps_order() {
        let mut ds = ReviewDataset::new("https://example.test/hotele/");
        ds.entities.push(Entity {
            id: "a-h1".into(),
            name: "A".into(),
            url: "https://example.test/opinie/a-h1/".into(),
        });
        for (i, t) in ["pierwsza", "druga", "trzecia"].iter().enumerate() {
            ds.records.push(ReviewRecord {
                entity_id: "a-h1".into(),
                text: t.to_string(),
                page: i as u32 + 1,
            });
        }
        ds.finish(false);

        let json = serde_json::to_string(&ds).unwrap();
        let back: ReviewDataset = serde_json::from_str(&json).unwrap();
        let texts: Vec<&str> = back.texts().collect();
        assert_eq!(texts, vec!["pierwsza", "druga", "trzecia"]);
        assert_eq!(back.records_for("a-h1").count(), 3);
        assert!(back.run.finished_at.is_some());
    }
}
