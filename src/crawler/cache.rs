//! Page cache with per-page-type TTL.
//!
//! Grounded on `market_research_agent/crawlers/crawl_cache.py`
//! (`CrawlCache`), adapted from Postgres to an embedded `rusqlite` store —
//! see DESIGN.md — and from the teacher's `vault::vault_db::VaultDb`
//! connection-pooling idiom.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;
use tracing::warn;

use crate::model::{PageArtifact, PageType, RenderType, SourceTag};

/// Cache freshness window per page type, in seconds. Policy pages change
/// rarely so they're cached longest; everything else defaults to an hour.
fn ttl_seconds(page_type: PageType) -> i64 {
    match page_type {
        PageType::PrivacyPolicy | PageType::TermsConditions => 7 * 86_400,
        PageType::About | PageType::Contact => 86_400,
        PageType::Product | PageType::Pricing => 86_400,
        PageType::Home => 21_600,
        _ => 3_600,
    }
}

#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, url: &str) -> Option<PageArtifact>;
    async fn set(&self, page: &PageArtifact);
}

/// `rusqlite`-backed cache. All failures are logged and treated as a cache
/// miss / no-op write — the crawl must never fail because the cache did.
#[derive(Clone)]
pub struct SqlitePageCache {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePageCache {
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).context("open crawl page cache db")?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS crawl_page_cache (
                url TEXT PRIMARY KEY,
                final_url TEXT NOT NULL,
                canonical_url TEXT,
                page_type TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                html TEXT NOT NULL,
                status INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )",
            [],
        )
        .context("create crawl_page_cache table")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl PageCache for SqlitePageCache {
    async fn get(&self, url: &str) -> Option<PageArtifact> {
        let conn = self.conn.lock().await;
        let now = Utc::now().timestamp();

        let result = conn.query_row(
            "SELECT final_url, canonical_url, page_type, content_hash, html, status
             FROM crawl_page_cache WHERE url = ?1 AND expires_at > ?2",
            params![url, now],
            |row| {
                let final_url: String = row.get(0)?;
                let canonical_url: Option<String> = row.get(1)?;
                let page_type_raw: String = row.get(2)?;
                let content_hash: String = row.get(3)?;
                let html: String = row.get(4)?;
                let status: i64 = row.get(5)?;
                Ok((final_url, canonical_url, page_type_raw, content_hash, html, status))
            },
        );

        match result {
            Ok((final_url, canonical_url, page_type_raw, content_hash, html, status)) => {
                let page_type = parse_page_type(&page_type_raw);
                Some(PageArtifact {
                    url: url.to_string(),
                    final_url,
                    status: status as u16,
                    content_type: "text/html".to_string(),
                    html,
                    visible_text: String::new(),
                    canonical_url,
                    title: None,
                    page_type,
                    classification_confidence: 1.0,
                    depth: 0,
                    source: SourceTag::Cache,
                    content_hash,
                    extracted_links: Vec::new(),
                    render_type: RenderType::Cache,
                    error: None,
                })
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                warn!(url, error = %e, "page cache get failed");
                None
            }
        }
    }

    async fn set(&self, page: &PageArtifact) {
        if page.html.is_empty() || page.status != 200 {
            return;
        }

        let conn = self.conn.lock().await;
        let expires_at = Utc::now().timestamp() + ttl_seconds(page.page_type);

        let result = conn.execute(
            "INSERT INTO crawl_page_cache
             (url, final_url, canonical_url, page_type, content_hash, html, status, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(url) DO UPDATE SET
                final_url = excluded.final_url,
                canonical_url = excluded.canonical_url,
                page_type = excluded.page_type,
                content_hash = excluded.content_hash,
                html = excluded.html,
                status = excluded.status,
                expires_at = excluded.expires_at",
            params![
                page.url,
                page.final_url,
                page.canonical_url,
                page_type_label(page.page_type),
                page.content_hash,
                page.html,
                page.status as i64,
                expires_at,
            ],
        );

        if let Err(e) = result {
            warn!(url = %page.url, error = %e, "page cache set failed");
        }
    }
}

/// Fail-open cache used when no cache path is configured: every lookup
/// misses and every write is a no-op.
#[derive(Debug, Clone, Default)]
pub struct NoopPageCache;

#[async_trait]
impl PageCache for NoopPageCache {
    async fn get(&self, _url: &str) -> Option<PageArtifact> {
        None
    }

    async fn set(&self, _page: &PageArtifact) {}
}

fn page_type_label(page_type: PageType) -> &'static str {
    match page_type {
        PageType::Home => "home",
        PageType::About => "about",
        PageType::Contact => "contact",
        PageType::PrivacyPolicy => "privacy_policy",
        PageType::TermsConditions => "terms_conditions",
        PageType::RefundPolicy => "refund_policy",
        PageType::ShippingDelivery => "shipping_delivery",
        PageType::Faq => "faq",
        PageType::Product => "product",
        PageType::Pricing => "pricing",
        PageType::Solutions => "solutions",
        PageType::Docs => "docs",
        PageType::Blog => "blog",
        PageType::Other => "other",
        PageType::Skip => "skip",
    }
}

fn parse_page_type(label: &str) -> PageType {
    match label {
        "home" => PageType::Home,
        "about" => PageType::About,
        "contact" => PageType::Contact,
        "privacy_policy" => PageType::PrivacyPolicy,
        "terms_conditions" => PageType::TermsConditions,
        "refund_policy" => PageType::RefundPolicy,
        "shipping_delivery" => PageType::ShippingDelivery,
        "faq" => PageType::Faq,
        "product" => PageType::Product,
        "pricing" => PageType::Pricing,
        "solutions" => PageType::Solutions,
        "docs" => PageType::Docs,
        "blog" => PageType::Blog,
        _ => PageType::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page(url: &str, page_type: PageType) -> PageArtifact {
        PageArtifact {
            url: url.to_string(),
            final_url: url.to_string(),
            status: 200,
            content_type: "text/html".to_string(),
            html: "<html>hi</html>".to_string(),
            visible_text: "hi".to_string(),
            canonical_url: None,
            title: Some("Title".to_string()),
            page_type,
            classification_confidence: 0.9,
            depth: 0,
            source: SourceTag::Root,
            content_hash: PageArtifact::compute_content_hash("hi"),
            extracted_links: Vec::new(),
            render_type: RenderType::Http,
            error: None,
        }
    }

    #[tokio::test]
    async fn round_trips_a_cached_page() {
        let cache = SqlitePageCache::open(":memory:").unwrap();
        let page = sample_page("https://example.com/privacy", PageType::PrivacyPolicy);
        cache.set(&page).await;

        let fetched = cache.get("https://example.com/privacy").await.unwrap();
        assert_eq!(fetched.html, page.html);
        assert_eq!(fetched.page_type, PageType::PrivacyPolicy);
        assert_eq!(fetched.source, SourceTag::Cache);
    }

    #[tokio::test]
    async fn does_not_cache_non_200_responses() {
        let cache = SqlitePageCache::open(":memory:").unwrap();
        let mut page = sample_page("https://example.com/error", PageType::Other);
        page.status = 500;
        cache.set(&page).await;

        assert!(cache.get("https://example.com/error").await.is_none());
    }

    #[tokio::test]
    async fn noop_cache_never_hits() {
        let cache = NoopPageCache;
        let page = sample_page("https://example.com/about", PageType::About);
        cache.set(&page).await;
        assert!(cache.get("https://example.com/about").await.is_none());
    }
}
