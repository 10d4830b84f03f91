//! Structured-document reader for listing and review pages.
//!
//! The collector only needs three things from a page: the entity links on
//! the listing page, the review text blocks on a review page, and the
//! "next page" control. [`ReviewPageReader`] exposes exactly those;
//! [`HtmlReader`] implements them with CSS selectors from
//! `[collector.selectors]`.
//!
//! Readers take raw markup and return owned values so that parsed trees
//! never live across an `.await` in the collector.

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};

use crate::config::SelectorConfig;

/// An `<a>` found in the entity section of the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityLink {
    pub href: String,
    pub text: String,
}

pub trait ReviewPageReader: Send + Sync {
    /// Entity links, or `None` if the entity section is absent.
    fn entity_links(&self, html: &str) -> Option<Vec<EntityLink>>;

    /// Non-empty review texts, or `None` if the review container is absent.
    fn review_texts(&self, html: &str) -> Option<Vec<String>>;

    /// Href of the "next page" control, if the page has one.
    fn next_page_href(&self, html: &str) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct HtmlReader {
    entity_container: Selector,
    entity_link: Selector,
    review_container: Selector,
    review_text: Selector,
    next_page: Selector,
}

impl HtmlReader {
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            entity_container: parse_selector(&selectors.entity_container)?,
            entity_link: parse_selector(&selectors.entity_link)?,
            review_container: parse_selector(&selectors.review_container)?,
            review_text: parse_selector(&selectors.review_text)?,
            next_page: parse_selector(&selectors.next_page)?,
        })
    }
}

impl ReviewPageReader for HtmlReader {
    fn entity_links(&self, html: &str) -> Option<Vec<EntityLink>> {
        let doc = Html::parse_document(html);
        let container = doc.select(&self.entity_container).next()?;

        let links = container
            .select(&self.entity_link)
            .filter_map(|a| {
                let href = a.value().attr("href")?.trim();
                if href.is_empty() {
                    return None;
                }
                Some(EntityLink {
                    href: href.to_string(),
                    text: element_text(&a),
                })
            })
            .collect();
        Some(links)
    }

    fn review_texts(&self, html: &str) -> Option<Vec<String>> {
        let doc = Html::parse_document(html);
        let container = doc.select(&self.review_container).next()?;

        let texts = container
            .select(&self.review_text)
            .map(|p| element_text(&p))
            .filter(|t| !t.is_empty())
            .collect();
        Some(texts)
    }

    fn next_page_href(&self, html: &str) -> Option<String> {
        let doc = Html::parse_document(html);
        let href = doc
            .select(&self.next_page)
            .find_map(|a| a.value().attr("href").map(str::trim))?;
        (!href.is_empty()).then(|| href.to_string())
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid CSS selector '{}': {}", css, e))
}

/// Text content with every run of whitespace collapsed to one space.
fn element_text(el: &ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
