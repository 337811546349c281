//! Checkout flow validator: CTA discovery, click-through, and direct-URL
//! fallback probing (C9).
//!
//! Grounded on `kyc_site_scan/checkout_validator.py`
//! (`CheckoutValidator.validate`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use crate::model::CheckoutFlowResult;

use super::driver::{BrowserDriver, ClickableElement};
use super::scoring::{self, CHECKOUT_FORM_SELECTORS, COMMON_CHECKOUT_PATHS, CTA_PATTERNS};

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const CTA_CLICK_TIMEOUT: Duration = Duration::from_secs(5);
const POST_CLICK_WAIT: Duration = Duration::from_millis(2_000);
const SETTLE_WAIT: Duration = Duration::from_millis(1_500);
const DIRECT_PROBE_TIMEOUT: Duration = Duration::from_secs(8);
const MAX_CTAS_SAMPLED: usize = 5;

pub struct CheckoutValidator {
    driver: Arc<dyn BrowserDriver>,
    http: Client,
}

impl CheckoutValidator {
    pub fn new(driver: Arc<dyn BrowserDriver>, http: Client) -> Self {
        Self { driver, http }
    }

    fn login_redirect(url: &str) -> bool {
        let lower = url.to_lowercase();
        lower.contains("/login") || lower.contains("/signin") || lower.contains("/sign-in")
    }

    /// Runs the full checkout probe. Returns a degraded-but-valid result
    /// (all fields false/empty) when no browser is available, per the
    /// Design Note in spec.md section 9.
    #[tracing::instrument(skip(self), fields(url = %url))]
    pub async fn validate(&self, url: &str) -> CheckoutFlowResult {
        if !self.driver.is_available() {
            warn!("no browser available, returning degraded checkout result");
            return self.direct_probe_only(url).await;
        }

        let mut evidence: HashMap<String, String> = HashMap::new();

        if self.driver.navigate(url, PAGE_LOAD_TIMEOUT).await.is_err() {
            evidence.insert("navigation".to_string(), "failed to load start URL".to_string());
            return CheckoutFlowResult {
                evidence,
                ..Default::default()
            };
        }
        self.driver.wait_quiet(Duration::from_millis(500)).await;

        if let Ok(current) = self.driver.current_url().await {
            if Self::login_redirect(&current) {
                evidence.insert("login_redirect".to_string(), current);
                return CheckoutFlowResult {
                    evidence,
                    ..Default::default()
                };
            }
        }

        let text = self.driver.visible_text().await.unwrap_or_default();
        let pricing_visible = text.to_lowercase().contains("pricing") || text.to_lowercase().contains("price");

        let candidates = self.driver.find_clickable(CTA_PATTERNS).await.unwrap_or_default();
        let has_cta = !candidates.is_empty();

        let mut cta_clickable = false;
        let mut checkout_reachable = false;
        let mut checkout_url = None;
        let mut checkout_confidence = 0.0f64;
        let mut dead_ctas = Vec::new();

        for candidate in candidates.iter().take(MAX_CTAS_SAMPLED) {
            match self.try_cta(candidate, url).await {
                Ok(Some((found_url, confidence))) => {
                    cta_clickable = true;
                    if confidence > checkout_confidence {
                        checkout_confidence = confidence;
                        checkout_url = Some(found_url);
                    }
                    if scoring::is_checkout_reachable(confidence) {
                        checkout_reachable = true;
                    }
                }
                Ok(None) => {
                    cta_clickable = true;
                }
                Err(reason) => {
                    dead_ctas.push(format!("{}: {}", candidate.text, reason));
                }
            }
            if checkout_reachable {
                break;
            }
        }

        let form_fields_present = self.driver.form_fields_present(CHECKOUT_FORM_SELECTORS).await.unwrap_or(false);

        if !checkout_reachable {
            if let Some((found_url, confidence)) = self.fallback_probe(url).await {
                checkout_reachable = scoring::is_checkout_reachable(confidence);
                if confidence > checkout_confidence {
                    checkout_confidence = confidence;
                    checkout_url = Some(found_url);
                }
            }
        }

        evidence.insert("ctas_sampled".to_string(), candidates.len().min(MAX_CTAS_SAMPLED).to_string());
        info!(checkout_reachable, checkout_confidence, "checkout validation complete");

        CheckoutFlowResult {
            has_cta,
            cta_clickable,
            checkout_reachable,
            checkout_url,
            checkout_confidence,
            pricing_visible,
            form_fields_present,
            dead_ctas,
            evidence,
        }
    }

    /// Clicks one CTA and scores the resulting page. Returns `Ok(None)`
    /// when the click succeeded but didn't land on anything checkout-like,
    /// and `Err(reason)` for a dead CTA (detached/timeout/click failure).
    async fn try_cta(&self, candidate: &ClickableElement, base_url: &str) -> Result<Option<(String, f64)>, String> {
        self.driver
            .click(candidate, CTA_CLICK_TIMEOUT)
            .await
            .map_err(|e| format!("click failed ({e})"))?;

        self.driver.wait_quiet(POST_CLICK_WAIT).await;
        self.driver.wait_quiet(SETTLE_WAIT).await;

        let current_url = self.driver.current_url().await.map_err(|e| format!("navigation lost ({e})"))?;
        if Self::login_redirect(&current_url) {
            return Err("redirected to login".to_string());
        }

        let text = self.driver.visible_text().await.unwrap_or_default();
        let form_fields_present = self.driver.form_fields_present(CHECKOUT_FORM_SELECTORS).await.unwrap_or(false);
        let confidence = scoring::score_checkout_page(&current_url, base_url, &text, form_fields_present);
        Ok(Some((current_url, confidence)))
    }

    /// Probes common checkout paths directly when no CTA led to checkout,
    /// scoring each response against the same rules.
    async fn fallback_probe(&self, base_url: &str) -> Option<(String, f64)> {
        let base = Url::parse(base_url).ok()?;
        let mut best: Option<(String, f64)> = None;

        for path in COMMON_CHECKOUT_PATHS {
            let Ok(candidate) = base.join(path) else {
                continue;
            };
            let candidate_str = candidate.to_string();

            let send = tokio::time::timeout(DIRECT_PROBE_TIMEOUT, self.http.get(&candidate_str).send()).await;
            let Ok(Ok(response)) = send else {
                continue;
            };
            if !response.status().is_success() {
                continue;
            }
            let final_url = response.url().to_string();
            if Self::login_redirect(&final_url) {
                continue;
            }
            let Ok(body) = response.text().await else {
                continue;
            };
            let confidence = scoring::score_checkout_page(&final_url, base_url, &body, false);
            if best.as_ref().map(|(_, c)| confidence > *c).unwrap_or(true) {
                best = Some((final_url, confidence));
            }
        }

        best
    }

    /// Degraded path used when no headless browser is available: only the
    /// direct-URL fallback probe runs, over plain HTTP.
    async fn direct_probe_only(&self, url: &str) -> CheckoutFlowResult {
        let mut evidence = HashMap::new();
        evidence.insert("mode".to_string(), "browser_unavailable".to_string());

        match self.fallback_probe(url).await {
            Some((found_url, confidence)) => CheckoutFlowResult {
                has_cta: false,
                cta_clickable: false,
                checkout_reachable: scoring::is_checkout_reachable(confidence),
                checkout_url: Some(found_url),
                checkout_confidence: confidence,
                pricing_visible: false,
                form_fields_present: false,
                dead_ctas: Vec::new(),
                evidence,
            },
            None => CheckoutFlowResult {
                evidence,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::driver::NullBrowserDriver;
    use super::*;

    #[tokio::test]
    async fn degraded_result_when_browser_unavailable() {
        let validator = CheckoutValidator::new(Arc::new(NullBrowserDriver), Client::new());
        let result = validator.validate("https://does-not-exist.invalid").await;
        assert!(!result.checkout_reachable);
        assert_eq!(result.evidence.get("mode").map(String::as_str), Some("browser_unavailable"));
    }
}
