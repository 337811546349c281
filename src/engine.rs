//! `ScanEngine`: the single injected-dependency entry point wiring crawl →
//! analyzers → checkout probe → compliance score → rules → audit into one
//! `MerchantKYCInput -> KYCDecisionOutput` call.
//!
//! Grounded on `kyc_site_scan/scan_engine.py` (`ScanEngine.scan`) and the
//! teacher's `AppState`-free standalone-module composition style.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tracing::{info, warn};

use crate::analyzers::content_risk::{self, PageInput};
use crate::analyzers::{context_classifier, entity_matcher, mcc_classifier, policy_detector};
use crate::audit::AuditBuilder;
use crate::checkout::driver::{BrowserDriver, ChromiumDriver, NullBrowserDriver};
use crate::checkout::CheckoutValidator;
use crate::config::Config;
use crate::crawler::{CrawlOrchestrator, NoopPageCache, PageCache, SqlitePageCache};
use crate::model::{
    BusinessContext, CheckStatus, CheckType, ContextStatus, EvidenceSnippet, KeywordTrigger, KYCDecisionOutput,
    MerchantInputError, MerchantKYCInput, NormalizedPageGraph, PageType, PolicyExpectation, ProductMatchStatus,
};
use crate::rdap;
use crate::rules::{self, DecisionContext};
use crate::scoring::compliance as compliance_scoring;
use crate::url_utils;

/// Minimum fraction of declared products/services that must be mentioned
/// somewhere on the crawled site for a full `MATCH`.
const PRODUCT_MATCH_THRESHOLD: f64 = 0.7;
const PRODUCT_PARTIAL_THRESHOLD: f64 = 0.3;

/// Ceiling on the whole checkout probe, above the validator's own internal
/// per-step budgets, so a misbehaving target can never stall a scan.
const CHECKOUT_OVERALL_TIMEOUT: Duration = Duration::from_secs(45);

pub struct ScanEngine {
    client: Client,
    cache: Arc<dyn PageCache>,
    browser: Arc<dyn BrowserDriver>,
    config: Config,
}

impl ScanEngine {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .user_agent(crate::model::robots::USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        let cache: Arc<dyn PageCache> = if config.cache_enabled {
            match SqlitePageCache::open(&config.cache_db_path) {
                Ok(cache) => Arc::new(cache),
                Err(e) => {
                    warn!(error = %e, "page cache unavailable, running cache-less");
                    Arc::new(NoopPageCache)
                }
            }
        } else {
            Arc::new(NoopPageCache)
        };

        Self {
            client,
            cache,
            browser: Arc::new(NullBrowserDriver),
            config,
        }
    }

    /// Attempts to launch a headless Chromium instance for checkout
    /// validation. Falls back to the degraded direct-probe-only path if
    /// unavailable (spec.md section 9 Design Note).
    pub async fn with_browser(mut self) -> Self {
        match ChromiumDriver::launch().await {
            Ok(driver) => self.browser = Arc::new(driver),
            Err(e) => warn!(error = %e, "headless browser unavailable, checkout validation will be degraded"),
        }
        self
    }

    #[tracing::instrument(skip(self, input), fields(scan_id = tracing::field::Empty))]
    pub async fn scan(&self, input: MerchantKYCInput) -> Result<KYCDecisionOutput, MerchantInputError> {
        let input = input.validate_and_normalize()?;
        let scan_id = uuid::Uuid::new_v4().to_string();
        tracing::Span::current().record("scan_id", &scan_id.as_str());
        let started_at = Utc::now();
        let mut audit = AuditBuilder::new(&scan_id, &input.website_url, started_at);

        info!(url = %input.website_url, "scan started");

        let orchestrator = CrawlOrchestrator::new(self.cache.clone());
        let graph = orchestrator.crawl(&input.website_url, &scan_id).await;
        for page in graph.all_pages() {
            audit.record_url_visited(page.url.as_str());
        }
        let home_reachable = graph.get_page_by_type(PageType::Home).is_some();
        audit.add_check(
            "site_accessible",
            CheckType::Accessibility,
            if home_reachable { CheckStatus::Pass } else { CheckStatus::Fail },
            Some(graph.metadata.crawl_time_ms),
            None,
        );

        let context = context_classifier::classify(&graph);

        let policy_checks = policy_detector::detect(&graph, &self.client, context.primary).await;
        for check in &policy_checks {
            let status = if check.found {
                CheckStatus::Pass
            } else if check.expectation == PolicyExpectation::Required {
                CheckStatus::Fail
            } else {
                CheckStatus::Flag
            };
            audit.add_check(format!("policy:{:?}", check.policy_type), CheckType::Policy, status, None, check.url.clone());
        }

        let page_inputs: Vec<PageInput> = graph
            .all_pages()
            .map(|p| PageInput {
                url: &p.url,
                visible_text: &p.visible_text,
                page_type: p.page_type,
            })
            .collect();
        let risk_analysis = content_risk::analyze(&page_inputs);
        for hit in &risk_analysis.hits {
            audit.add_keyword_trigger(KeywordTrigger {
                keyword: hit.keyword.clone(),
                category: hit.category.clone(),
                source_url: hit.source_url.clone(),
                snippet: hit.snippet.clone(),
                severity: format!("{:?}", hit.severity).to_uppercase(),
                intent: format!("{:?}", hit.intent).to_lowercase(),
                page_type: hit.page_type.clone(),
                intent_context: hit.intent_context.clone(),
                is_corroborated: hit.is_corroborated,
            });
            audit.add_snippet(EvidenceSnippet::rule_based(hit.source_url.clone(), hit.snippet.clone()));
        }
        audit.add_check(
            "content_risk_scan",
            CheckType::ContentRisk,
            if risk_analysis.summary.risk_contributing_count > 0 { CheckStatus::Flag } else { CheckStatus::Pass },
            None,
            None,
        );

        // mcc classification and entity matching are both pure, independent
        // reads over the crawled graph; run them on rayon's pool rather than
        // serialize two CPU-bound passes over the same page text.
        let (mcc_result, entity_match) = rayon::join(
            || mcc_classifier::classify(&graph),
            || entity_matcher::match_entity(&input.merchant_legal_name, &input.registered_address, &graph, Some(&input.merchant_display_name)),
        );
        audit.add_check(
            "entity_match",
            CheckType::Entity,
            match entity_match.match_status {
                crate::model::MatchStatus::Match => CheckStatus::Pass,
                crate::model::MatchStatus::PartialMatch => CheckStatus::Flag,
                crate::model::MatchStatus::Mismatch | crate::model::MatchStatus::NoMatch => CheckStatus::Review,
            },
            None,
            entity_match.best_match.clone(),
        );

        let checkout_validator = CheckoutValidator::new(self.browser.clone(), self.client.clone());
        let checkout_result = tokio::time::timeout(CHECKOUT_OVERALL_TIMEOUT, checkout_validator.validate(&input.website_url))
            .await
            .unwrap_or_default();
        audit.add_check(
            "checkout_flow",
            CheckType::Checkout,
            if checkout_result.checkout_reachable { CheckStatus::Pass } else { CheckStatus::Flag },
            None,
            None,
        );

        let domain = url_utils::get_domain(&input.website_url);
        let domain_age_days = rdap::domain_age_days(&self.client, &domain).await;
        audit.add_check(
            "rdap_domain_age",
            CheckType::Rdap,
            if domain_age_days.is_some() { CheckStatus::Pass } else { CheckStatus::Skip },
            None,
            domain_age_days.map(|d| format!("{d} days")),
        );

        let compliance = compliance_scoring::score_with_domain_age(&graph, &policy_checks, &risk_analysis, context.primary, domain_age_days);

        let product_match_status = classify_product_match(&input.declared_products_services, &graph);
        let business_type_mismatch = detect_business_type_mismatch(&input.declared_business_type, &context);
        audit.add_check(
            "context_classification",
            CheckType::Context,
            CheckStatus::Pass,
            None,
            Some(context.reason.clone()),
        );
        audit.add_check(
            "mcc_classification",
            CheckType::Mcc,
            if mcc_result.primary.is_some() { CheckStatus::Pass } else { CheckStatus::Skip },
            None,
            mcc_result.primary.as_ref().map(|m| m.code.clone()),
        );

        let decision_ctx = DecisionContext {
            graph: &graph,
            policy_checks: &policy_checks,
            content_risk: &risk_analysis,
            checkout: &checkout_result,
            entity_match: Some(&entity_match),
            business_context: &context,
            product_match_status,
            business_type_mismatch,
            domain_age_days,
            compliance: &compliance,
        };
        let (decision, reason_codes, confidence, summary) = rules::evaluate(&decision_ctx);

        let completed_at = Utc::now();
        let final_url = graph
            .get_page_by_type(PageType::Home)
            .map(|h| h.final_url.clone())
            .unwrap_or_else(|| input.website_url.clone());
        let pages_scanned = graph.page_count();
        let audit_trail = audit.build(final_url, pages_scanned, completed_at);

        info!(decision = ?decision, confidence, "scan completed");

        Ok(KYCDecisionOutput {
            decision,
            reason_codes,
            summary,
            confidence_score: confidence,
            policy_checks,
            checkout_flow: Some(checkout_result),
            entity_match: Some(entity_match),
            compliance_score: Some(compliance),
            detected_business_type: Some(format!("{:?}", context.primary)),
            detected_mcc: mcc_result.primary.as_ref().map(|m| m.code.clone()),
            product_match_status: Some(product_match_status),
            content_risk_summary: Some(risk_analysis.summary),
            audit_trail,
            scan_version: self.config.scan_version.clone(),
        })
    }
}

/// No dedicated analyzer owns product-to-site matching in the component
/// list (C1-C14); it is a thin keyword-containment check against the
/// product/pricing/solutions/home pages, in the same spirit as the content
/// risk keyword matcher.
fn classify_product_match(declared: &[String], graph: &NormalizedPageGraph) -> ProductMatchStatus {
    let combined: String = [PageType::Product, PageType::Pricing, PageType::Solutions, PageType::Home]
        .iter()
        .filter_map(|pt| graph.get_page_by_type(*pt))
        .map(|p| p.visible_text.to_lowercase())
        .collect::<Vec<_>>()
        .join(" \n ");

    if combined.trim().is_empty() {
        return ProductMatchStatus::UnableToVerify;
    }

    let declared_nonempty: Vec<&String> = declared.iter().filter(|p| !p.trim().is_empty()).collect();
    if declared_nonempty.is_empty() {
        return ProductMatchStatus::UnableToVerify;
    }

    let matched = declared_nonempty.iter().filter(|p| combined.contains(&p.to_lowercase())).count();
    let ratio = matched as f64 / declared_nonempty.len() as f64;

    if ratio >= PRODUCT_MATCH_THRESHOLD {
        ProductMatchStatus::Match
    } else if ratio >= PRODUCT_PARTIAL_THRESHOLD {
        ProductMatchStatus::PartialMatch
    } else {
        ProductMatchStatus::Mismatch
    }
}

/// Flags an obvious contradiction between the declared business type and
/// the crawled business-context classification. Only fires once the
/// classifier reached `Determined` status, so an ambiguous site never
/// triggers a false mismatch.
fn detect_business_type_mismatch(declared_business_type: &str, context: &BusinessContext) -> bool {
    if context.status != ContextStatus::Determined {
        return false;
    }

    let declared = declared_business_type.to_lowercase();
    match context.primary {
        crate::model::BusinessContextType::SaasProduct => {
            declared.contains("retail") || declared.contains("e-commerce") || declared.contains("ecommerce") || declared.contains("physical goods")
        }
        crate::model::BusinessContextType::EcommerceMerchant | crate::model::BusinessContextType::Marketplace => {
            declared.contains("saas") || declared.contains("software as a service")
        }
        crate::model::BusinessContextType::BlockchainInfrastructure | crate::model::BusinessContextType::FintechInfrastructure => {
            declared.contains("restaurant") || declared.contains("retail store")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FrontendSurface};

    fn context(primary: crate::model::BusinessContextType, status: ContextStatus) -> BusinessContext {
        BusinessContext {
            primary,
            status,
            confidence: 0.9,
            frontend_surface: FrontendSurface::MarketingSite,
            reason: "test".to_string(),
            scores: Default::default(),
            alternatives: vec![],
        }
    }

    #[test]
    fn undetermined_context_never_flags_mismatch() {
        let ctx = context(crate::model::BusinessContextType::SaasProduct, ContextStatus::Undetermined);
        assert!(!detect_business_type_mismatch("E-commerce retailer", &ctx));
    }

    #[test]
    fn saas_site_with_ecommerce_declaration_flags_mismatch() {
        let ctx = context(crate::model::BusinessContextType::SaasProduct, ContextStatus::Determined);
        assert!(detect_business_type_mismatch("E-commerce retailer", &ctx));
    }

    #[test]
    fn empty_graph_is_unable_to_verify_product_match() {
        let graph = NormalizedPageGraph::new("https://example.com");
        let status = classify_product_match(&["Widgets".to_string()], &graph);
        assert_eq!(status, ProductMatchStatus::UnableToVerify);
    }
}
