//! Browser automation abstraction. The checkout validator depends only on
//! this trait, never on `chromiumoxide` directly — spec.md's Design Notes
//! require that "no other subsystem may assume the browser is present".

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tracing::{error, warn};

/// One visible, enabled element whose text matched a CTA pattern.
#[derive(Debug, Clone)]
pub struct ClickableElement {
    pub selector: String,
    pub text: String,
}

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> anyhow::Result<()>;
    async fn current_url(&self) -> anyhow::Result<String>;
    async fn visible_text(&self) -> anyhow::Result<String>;
    async fn find_clickable(&self, patterns: &[&str]) -> anyhow::Result<Vec<ClickableElement>>;
    async fn click(&self, element: &ClickableElement, timeout: Duration) -> anyhow::Result<()>;
    async fn wait_quiet(&self, duration: Duration);
    async fn form_fields_present(&self, selectors: &[&str]) -> anyhow::Result<bool>;
    /// False once a driver has been torn down or never launched — lets the
    /// validator degrade cleanly instead of erroring on every call.
    fn is_available(&self) -> bool;
}

/// Realistic desktop UA + 1080p viewport, matching spec.md section 4.9.
pub const CHECKOUT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// `chromiumoxide`-backed driver. Launches one headless Chromium instance
/// per validator and reuses a single page across navigations.
pub struct ChromiumDriver {
    page: Page,
    _browser: Browser,
}

impl ChromiumDriver {
    pub async fn launch() -> anyhow::Result<Self> {
        let config = BrowserConfig::builder()
            .viewport(chromiumoxide::handler::viewport::Viewport {
                width: 1920,
                height: 1080,
                ..Default::default()
            })
            .user_agent(CHECKOUT_USER_AGENT)
            .build()
            .map_err(|e| anyhow::anyhow!("browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config).await?;
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    error!("chromiumoxide handler event error");
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        Ok(Self { page, _browser: browser })
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&self, url: &str, timeout: Duration) -> anyhow::Result<()> {
        tokio::time::timeout(timeout, self.page.goto(url)).await??;
        Ok(())
    }

    async fn current_url(&self) -> anyhow::Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn visible_text(&self) -> anyhow::Result<String> {
        let body = self.page.find_element("body").await?;
        Ok(body.inner_text().await?.unwrap_or_default())
    }

    async fn find_clickable(&self, patterns: &[&str]) -> anyhow::Result<Vec<ClickableElement>> {
        let mut found = Vec::new();
        let elements = self.page.find_elements("button, a, input[type=submit], [role=button]").await?;
        for (idx, el) in elements.into_iter().enumerate() {
            let text = el
                .inner_text()
                .await
                .ok()
                .flatten()
                .unwrap_or_default()
                .trim()
                .to_lowercase();
            if text.is_empty() {
                continue;
            }
            if patterns.iter().any(|p| text.contains(p)) {
                found.push(ClickableElement {
                    selector: format!(":nth-match(button, a, input[type=submit], [role=button], {})", idx + 1),
                    text,
                });
            }
        }
        Ok(found)
    }

    async fn click(&self, element: &ClickableElement, timeout: Duration) -> anyhow::Result<()> {
        let el = self.page.find_element(&element.selector).await?;
        tokio::time::timeout(timeout, el.click()).await??;
        Ok(())
    }

    async fn wait_quiet(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn form_fields_present(&self, selectors: &[&str]) -> anyhow::Result<bool> {
        for selector in selectors {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Used when no headless browser could be launched. Every call fails or
/// returns an empty result so the validator can build a degraded but valid
/// [`crate::model::CheckoutFlowResult`] from scan data alone.
#[derive(Debug, Default)]
pub struct NullBrowserDriver;

#[async_trait]
impl BrowserDriver for NullBrowserDriver {
    async fn navigate(&self, _url: &str, _timeout: Duration) -> anyhow::Result<()> {
        warn!("checkout validator running without a browser; navigate is a no-op");
        anyhow::bail!("browser_unavailable")
    }

    async fn current_url(&self) -> anyhow::Result<String> {
        anyhow::bail!("browser_unavailable")
    }

    async fn visible_text(&self) -> anyhow::Result<String> {
        Ok(String::new())
    }

    async fn find_clickable(&self, _patterns: &[&str]) -> anyhow::Result<Vec<ClickableElement>> {
        Ok(Vec::new())
    }

    async fn click(&self, _element: &ClickableElement, _timeout: Duration) -> anyhow::Result<()> {
        anyhow::bail!("browser_unavailable")
    }

    async fn wait_quiet(&self, _duration: Duration) {}

    async fn form_fields_present(&self, _selectors: &[&str]) -> anyhow::Result<bool> {
        Ok(false)
    }

    fn is_available(&self) -> bool {
        false
    }
}
