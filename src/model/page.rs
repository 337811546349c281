//! Page artifact types.
//!
//! Grounded on `market_research_agent/crawlers/page_graph.py`
//! (`PageData`, `CrawlError`).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Home,
    About,
    Contact,
    PrivacyPolicy,
    TermsConditions,
    RefundPolicy,
    ShippingDelivery,
    Faq,
    Product,
    Pricing,
    Solutions,
    Docs,
    Blog,
    Other,
    Skip,
}

impl PageType {
    /// Queueing priority, matching `PageClassifier.get_priority_score` in
    /// the original: higher fetches first.
    pub fn priority_score(self) -> i32 {
        match self {
            PageType::Home => 100,
            PageType::PrivacyPolicy | PageType::TermsConditions => 95,
            PageType::RefundPolicy => 90,
            PageType::About => 85,
            PageType::Contact => 80,
            PageType::Pricing => 75,
            PageType::Product | PageType::Solutions => 70,
            PageType::ShippingDelivery => 65,
            PageType::Faq => 50,
            PageType::Docs => 40,
            PageType::Blog => 20,
            PageType::Other => 10,
            PageType::Skip => i32::MIN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Root,
    Sitemap,
    NavPrimary,
    NavSecondary,
    Cache,
    Menu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderType {
    Http,
    Js,
    Cache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlErrorKind {
    Timeout,
    Ssl,
    Dns,
    Blocked,
    HttpError,
    ParseError,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlError {
    pub kind: CrawlErrorKind,
    pub message: String,
    pub status_code: Option<u16>,
}

impl CrawlError {
    /// Classifies a crawl-time failure. Ported from
    /// `CrawlError.from_exception` in the original: inspects the error
    /// message for known substrings, then falls back to the HTTP status
    /// code when present.
    pub fn classify(message: &str, status_code: Option<u16>) -> Self {
        let lower = message.to_lowercase();
        let kind = if lower.contains("timeout") || lower.contains("timed out") {
            CrawlErrorKind::Timeout
        } else if lower.contains("ssl") || lower.contains("certificate") {
            CrawlErrorKind::Ssl
        } else if lower.contains("dns") || lower.contains("name resolution") || lower.contains("lookup") {
            CrawlErrorKind::Dns
        } else if matches!(status_code, Some(403) | Some(401) | Some(429)) {
            CrawlErrorKind::Blocked
        } else if status_code.map(|c| c >= 400).unwrap_or(false) {
            CrawlErrorKind::HttpError
        } else {
            CrawlErrorKind::Unknown
        };
        CrawlError {
            kind,
            message: message.to_string(),
            status_code,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedLink {
    pub url: String,
    pub text: String,
    pub normalized_url: Option<String>,
}

/// One fetched (or cached) page. Created by the crawl orchestrator; never
/// mutated after insertion into the `NormalizedPageGraph`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageArtifact {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: String,
    pub html: String,
    pub visible_text: String,
    pub canonical_url: Option<String>,
    pub title: Option<String>,
    pub page_type: PageType,
    pub classification_confidence: f64,
    pub depth: u32,
    pub source: SourceTag,
    pub content_hash: String,
    pub extracted_links: Vec<ExtractedLink>,
    pub render_type: RenderType,
    pub error: Option<CrawlError>,
}

impl PageArtifact {
    /// Deterministic SHA-256 hash over cleaned visible text, capped at
    /// 10,000 chars before hashing (matches `_clean_for_hash` in the
    /// original). Stable across scans when the cleaned text is unchanged.
    pub fn compute_content_hash(visible_text: &str) -> String {
        let capped: String = visible_text.chars().take(10_000).collect();
        let mut hasher = Sha256::new();
        hasher.update(capped.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn failed(url: String, error: CrawlError, depth: u32, source: SourceTag) -> Self {
        PageArtifact {
            final_url: url.clone(),
            status: error.status_code.unwrap_or(0),
            content_type: String::new(),
            html: String::new(),
            visible_text: String::new(),
            canonical_url: None,
            title: None,
            page_type: PageType::Other,
            classification_confidence: 0.0,
            depth,
            source,
            content_hash: PageArtifact::compute_content_hash(""),
            extracted_links: Vec::new(),
            render_type: RenderType::Http,
            error: Some(error),
            url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable_for_unchanged_text() {
        let a = PageArtifact::compute_content_hash("hello world");
        let b = PageArtifact::compute_content_hash("hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn content_hash_changes_with_text() {
        let a = PageArtifact::compute_content_hash("hello world");
        let b = PageArtifact::compute_content_hash("goodbye world");
        assert_ne!(a, b);
    }

    #[test]
    fn classify_dns_error() {
        let err = CrawlError::classify("Name resolution failed for host", None);
        assert_eq!(err.kind, CrawlErrorKind::Dns);
    }

    #[test]
    fn classify_blocked_status() {
        let err = CrawlError::classify("Forbidden", Some(403));
        assert_eq!(err.kind, CrawlErrorKind::Blocked);
    }

    #[test]
    fn priority_order_matches_spec() {
        assert!(PageType::Home.priority_score() > PageType::PrivacyPolicy.priority_score());
        assert!(PageType::PrivacyPolicy.priority_score() > PageType::About.priority_score());
        assert!(PageType::About.priority_score() > PageType::Contact.priority_score());
        assert!(PageType::Blog.priority_score() > PageType::Other.priority_score());
    }
}
