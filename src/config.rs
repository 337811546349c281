//! Runtime configuration, loaded from the environment.
//!
//! Grounded on `models.rs::Config::from_env` (the teacher's
//! dotenv-plus-`std::env::var`-with-default pattern).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub crawl_concurrency: usize,
    pub max_pages: usize,
    pub page_timeout: Duration,
    pub total_crawl_timeout: Duration,
    pub cache_db_path: String,
    pub cache_enabled: bool,
    pub chromium_binary_path: Option<String>,
    pub webhook_max_retries: u32,
    pub webhook_initial_backoff_secs: u64,
    pub scan_version: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let host = std::env::var("KYC_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("KYC_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let crawl_concurrency = std::env::var("KYC_CRAWL_CONCURRENCY")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let max_pages = std::env::var("KYC_MAX_PAGES")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .unwrap_or(20);

        let page_timeout = Duration::from_secs(
            std::env::var("KYC_PAGE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
        );

        let total_crawl_timeout = Duration::from_secs(
            std::env::var("KYC_TOTAL_CRAWL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        );

        let cache_db_path = std::env::var("KYC_CACHE_DB_PATH").unwrap_or_else(|_| "./kyc_page_cache.db".to_string());

        let cache_enabled = std::env::var("KYC_CACHE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let chromium_binary_path = std::env::var("KYC_CHROMIUM_BINARY_PATH").ok();

        let webhook_max_retries = std::env::var("KYC_WEBHOOK_MAX_RETRIES")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .unwrap_or(3);

        let webhook_initial_backoff_secs = std::env::var("KYC_WEBHOOK_INITIAL_BACKOFF_SECS")
            .unwrap_or_else(|_| "2".to_string())
            .parse()
            .unwrap_or(2);

        let scan_version = std::env::var("KYC_SCAN_VERSION").unwrap_or_else(|_| "v2.0.0".to_string());

        Ok(Self {
            host,
            port,
            crawl_concurrency,
            max_pages,
            page_timeout,
            total_crawl_timeout,
            cache_db_path,
            cache_enabled,
            chromium_binary_path,
            webhook_max_retries,
            webhook_initial_backoff_secs,
            scan_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_unset() {
        std::env::remove_var("KYC_PORT");
        let config = Config::from_env().unwrap();
        assert_eq!(config.scan_version, "v2.0.0");
        assert!(config.crawl_concurrency > 0);
    }
}
