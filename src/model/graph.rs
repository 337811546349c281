//! The normalized page graph produced by a single crawl.
//!
//! Grounded on `market_research_agent/crawlers/page_graph.py`
//! (`NormalizedPageGraph`, `CrawlMetadata`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::page::{CrawlError, PageArtifact, PageType};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlMetadata {
    pub crawl_time_ms: u64,
    pub pages_discovered: usize,
    pub pages_fetched: usize,
    pub pages_skipped: usize,
    pub sitemap_found: bool,
    pub sitemap_urls_count: usize,
    pub robots_checked: bool,
    pub early_exit: bool,
    pub early_exit_reason: Option<String>,
    pub timed_out: bool,
    pub errors: Vec<(String, CrawlError)>,
}

impl CrawlMetadata {
    pub fn add_error(&mut self, url: impl Into<String>, error: CrawlError) {
        self.errors.push((url.into(), error));
    }
}

/// Required page types for the crawl's early-exit policy.
pub const REQUIRED_PAGES: &[PageType] = &[PageType::PrivacyPolicy, PageType::TermsConditions];

/// High-value page types; at least one alongside the required set triggers
/// early exit.
pub const HIGH_VALUE_PAGES: &[PageType] = &[PageType::About, PageType::Contact, PageType::Pricing, PageType::Product];

/// Minimum classification confidence for a page to count toward the
/// early-exit required-page check.
pub const EARLY_EXIT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Ordered, deduplicated collection of [`PageArtifact`]s keyed by page type
/// when known, else by normalized URL. Owns every artifact exclusively —
/// downstream analyzers only ever see `&PageArtifact` references.
#[derive(Debug, Clone, Default)]
pub struct NormalizedPageGraph {
    pub root_url: String,
    by_page_type: HashMap<PageType, PageArtifact>,
    by_url: HashMap<String, PageArtifact>,
    pub metadata: CrawlMetadata,
}

impl NormalizedPageGraph {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            by_page_type: HashMap::new(),
            by_url: HashMap::new(),
            metadata: CrawlMetadata::default(),
        }
    }

    /// Inserts a fetched page, honoring the ordering guarantees: a
    /// higher-confidence classification replaces a lower one for the same
    /// page type, and a status-200 artifact always wins over an error
    /// artifact for that type. Pages whose type is `Other` or `Skip` are
    /// keyed and deduped by URL instead, since many distinct URLs can share
    /// that type.
    pub fn add_page(&mut self, page: PageArtifact) {
        if matches!(page.page_type, PageType::Other | PageType::Skip) {
            self.by_url.entry(page.url.clone()).or_insert(page);
            return;
        }

        match self.by_page_type.get(&page.page_type) {
            Some(existing) => {
                let existing_ok = existing.status == 200;
                let incoming_ok = page.status == 200;
                let replace = match (existing_ok, incoming_ok) {
                    (false, true) => true,
                    (true, false) => false,
                    _ => page.classification_confidence > existing.classification_confidence,
                };
                if replace {
                    self.by_page_type.insert(page.page_type, page);
                }
            }
            None => {
                self.by_page_type.insert(page.page_type, page);
            }
        }
    }

    pub fn get_page_by_type(&self, page_type: PageType) -> Option<&PageArtifact> {
        self.by_page_type.get(&page_type)
    }

    pub fn get_found_page_types(&self) -> Vec<PageType> {
        self.by_page_type.keys().copied().collect()
    }

    /// All pages, both type-keyed and URL-keyed, in no particular order.
    pub fn all_pages(&self) -> impl Iterator<Item = &PageArtifact> {
        self.by_page_type.values().chain(self.by_url.values())
    }

    pub fn page_count(&self) -> usize {
        self.by_page_type.len() + self.by_url.len()
    }

    /// True once every [`REQUIRED_PAGES`] type is present with confidence
    /// at or above [`EARLY_EXIT_CONFIDENCE_THRESHOLD`].
    pub fn has_required_pages(&self) -> bool {
        REQUIRED_PAGES.iter().all(|pt| {
            self.by_page_type
                .get(pt)
                .map(|page| page.classification_confidence >= EARLY_EXIT_CONFIDENCE_THRESHOLD)
                .unwrap_or(false)
        })
    }

    pub fn has_high_value_page(&self) -> bool {
        HIGH_VALUE_PAGES.iter().any(|pt| self.by_page_type.contains_key(pt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RenderType, SourceTag};

    fn page(page_type: PageType, status: u16, confidence: f64) -> PageArtifact {
        PageArtifact {
            url: format!("https://example.com/{:?}", page_type).to_lowercase(),
            final_url: "https://example.com".into(),
            status,
            content_type: "text/html".into(),
            html: "<html></html>".into(),
            visible_text: String::new(),
            canonical_url: None,
            title: None,
            page_type,
            classification_confidence: confidence,
            depth: 1,
            source: SourceTag::NavPrimary,
            content_hash: PageArtifact::compute_content_hash(""),
            extracted_links: Vec::new(),
            render_type: RenderType::Http,
            error: None,
        }
    }

    #[test]
    fn higher_confidence_replaces_lower() {
        let mut graph = NormalizedPageGraph::new("https://example.com");
        graph.add_page(page(PageType::About, 200, 0.5));
        graph.add_page(page(PageType::About, 200, 0.9));
        assert_eq!(graph.get_page_by_type(PageType::About).unwrap().classification_confidence, 0.9);
    }

    #[test]
    fn status_200_wins_over_error_artifact() {
        let mut graph = NormalizedPageGraph::new("https://example.com");
        graph.add_page(page(PageType::About, 0, 0.95));
        graph.add_page(page(PageType::About, 200, 0.4));
        assert_eq!(graph.get_page_by_type(PageType::About).unwrap().status, 200);
    }

    #[test]
    fn early_exit_requires_confidence_threshold() {
        let mut graph = NormalizedPageGraph::new("https://example.com");
        graph.add_page(page(PageType::PrivacyPolicy, 200, 0.5));
        graph.add_page(page(PageType::TermsConditions, 200, 0.9));
        assert!(!graph.has_required_pages());

        graph.add_page(page(PageType::PrivacyPolicy, 200, 0.75));
        assert!(graph.has_required_pages());
    }
}
