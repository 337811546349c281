//! Crawl subsystem (C2–C5): robots/sitemap discovery, navigation
//! extraction, the page cache, and the bounded-concurrency orchestrator.

pub mod cache;
pub mod navigation;
pub mod orchestrator;
pub mod robots;
pub mod sitemap;

pub use cache::{NoopPageCache, PageCache, SqlitePageCache};
pub use orchestrator::CrawlOrchestrator;
