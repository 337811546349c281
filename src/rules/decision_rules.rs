//! Seven-phase deterministic rule evaluation.
//!
//! Grounded on `kyc_site_scan/decision_rules.py`
//! (`DecisionEngine.evaluate`, `FAIL_RULES`, `ESCALATE_RULES`).

use crate::analyzers::content_risk::{is_policy_page, ContentRiskAnalysis};
use crate::analyzers::keywords::HIGH_RISK_CATEGORIES;
use crate::model::{
    BusinessContext, BusinessContextType, CheckoutFlowResult, ComplianceBreakdown, CrawlErrorKind, Decision,
    EntityMatchResult, Intent, MatchStatus, NormalizedPageGraph, PageType, PolicyCheckResult, PolicyType,
    ProductMatchStatus, ReasonCategory, ReasonCode, ReasonSeverity,
};

/// Domain-age threshold below which a site is flagged as suspiciously new
/// (spec.md section 4.13, `DOMAIN_TOO_NEW`).
const DOMAIN_TOO_NEW_DAYS: i64 = 180;

/// Categories considered high-risk enough to auto-fail when not suppressed
/// by intent/page-type, per spec.md section 4.13's `HIGH_RISK_CONTENT_*`
/// family. Drawn from [`HIGH_RISK_CATEGORIES`] — every member gets its own
/// reason code, not just the five spec.md names as examples.
fn high_risk_reason_code(category: &str) -> String {
    match category {
        "illegal_goods" => "HIGH_RISK_CONTENT_ILLEGAL".to_string(),
        other => format!("HIGH_RISK_CONTENT_{}", other.to_uppercase()),
    }
}

fn reason(
    code: impl Into<String>,
    category: ReasonCategory,
    severity: ReasonSeverity,
    message: impl Into<String>,
    evidence_url: Option<String>,
    evidence_snippet: Option<String>,
    is_auto_fail: bool,
    is_auto_escalate: bool,
) -> ReasonCode {
    ReasonCode {
        code: code.into(),
        category,
        severity,
        message: message.into(),
        evidence_url,
        evidence_snippet,
        is_auto_fail,
        is_auto_escalate,
    }
}

/// Bundles every signal the rule engine consults. Borrowed for the
/// lifetime of a single evaluation; nothing here is mutated.
pub struct DecisionContext<'a> {
    pub graph: &'a NormalizedPageGraph,
    pub policy_checks: &'a [PolicyCheckResult],
    pub content_risk: &'a ContentRiskAnalysis,
    pub checkout: &'a CheckoutFlowResult,
    pub entity_match: Option<&'a EntityMatchResult>,
    pub business_context: &'a BusinessContext,
    pub product_match_status: ProductMatchStatus,
    /// `true` when the declared business type contradicts the crawled
    /// business-context classification (e.g. declared "SaaS" but the site
    /// reads as a marketplace with no login gate). Computed by the caller,
    /// which holds the declared-vs-detected comparison the engine performs
    /// before calling into this module.
    pub business_type_mismatch: bool,
    pub domain_age_days: Option<i64>,
    pub compliance: &'a ComplianceBreakdown,
}

fn page_type_from_label(label: &str) -> PageType {
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

fn phase_accessibility(ctx: &DecisionContext) -> Vec<ReasonCode> {
    let mut reasons = Vec::new();
    let home = ctx.graph.get_page_by_type(PageType::Home);

    match home {
        None => {
            reasons.push(reason(
                "SITE_UNREACHABLE",
                ReasonCategory::Accessibility,
                ReasonSeverity::Critical,
                "the homepage could not be reached",
                Some(ctx.graph.root_url.clone()),
                None,
                true,
                false,
            ));
            return reasons;
        }
        Some(page) => {
            if let Some(error) = &page.error {
                match error.kind {
                    CrawlErrorKind::Dns => reasons.push(reason(
                        "DNS_FAIL",
                        ReasonCategory::Accessibility,
                        ReasonSeverity::Critical,
                        "domain name resolution failed",
                        Some(page.url.clone()),
                        Some(error.message.clone()),
                        true,
                        false,
                    )),
                    CrawlErrorKind::Ssl => reasons.push(reason(
                        "SSL_ERROR",
                        ReasonCategory::Accessibility,
                        ReasonSeverity::Critical,
                        "the site's SSL certificate is invalid or missing",
                        Some(page.url.clone()),
                        Some(error.message.clone()),
                        true,
                        false,
                    )),
                    CrawlErrorKind::Timeout | CrawlErrorKind::Unknown | CrawlErrorKind::HttpError | CrawlErrorKind::Blocked => {
                        if page.status == 0 {
                            reasons.push(reason(
                                "SITE_UNREACHABLE",
                                ReasonCategory::Accessibility,
                                ReasonSeverity::Critical,
                                "the homepage could not be reached",
                                Some(page.url.clone()),
                                Some(error.message.clone()),
                                true,
                                false,
                            ));
                        }
                    }
                    CrawlErrorKind::ParseError => {}
                }
            }

            let lower = page.visible_text.to_lowercase();
            let looks_parked = ctx.graph.page_count() <= 1
                && (lower.contains("domain is parked")
                    || lower.contains("this domain is for sale")
                    || lower.contains("buy this domain")
                    || lower.contains("domain may be for sale"));
            if looks_parked {
                reasons.push(reason(
                    "PARKED_DOMAIN",
                    ReasonCategory::Accessibility,
                    ReasonSeverity::Critical,
                    "the domain appears to be parked rather than hosting a live business",
                    Some(page.url.clone()),
                    None,
                    true,
                    false,
                ));
            }
        }
    }

    reasons
}

fn phase_policies(ctx: &DecisionContext) -> Vec<ReasonCode> {
    let mut reasons = Vec::new();

    let privacy = ctx.policy_checks.iter().find(|c| c.policy_type == PolicyType::PrivacyPolicy);
    if !privacy.map(|c| c.found).unwrap_or(false) {
        reasons.push(reason(
            "MISSING_PRIVACY_POLICY",
            ReasonCategory::Policy,
            ReasonSeverity::Critical,
            "no privacy policy page was found",
            None,
            None,
            true,
            false,
        ));
    }

    let terms = ctx.policy_checks.iter().find(|c| c.policy_type == PolicyType::TermsConditions);
    if !terms.map(|c| c.found).unwrap_or(false) {
        reasons.push(reason(
            "MISSING_TERMS",
            ReasonCategory::Policy,
            ReasonSeverity::Critical,
            "no terms and conditions page was found",
            None,
            None,
            true,
            false,
        ));
    }

    let refund = ctx.policy_checks.iter().find(|c| c.policy_type == PolicyType::RefundPolicy);
    let refund_applicable = matches!(
        ctx.business_context.primary,
        BusinessContextType::EcommerceMerchant | BusinessContextType::Unknown
    );
    if refund_applicable && !refund.map(|c| c.found).unwrap_or(false) {
        reasons.push(reason(
            "MISSING_REFUND_POLICY",
            ReasonCategory::Policy,
            ReasonSeverity::High,
            "no refund or returns policy page was found",
            None,
            None,
            false,
            true,
        ));
    }

    reasons
}

fn phase_content_risk(ctx: &DecisionContext) -> Vec<ReasonCode> {
    let mut reasons = Vec::new();
    let mut fired_high_risk: Vec<&str> = Vec::new();
    let mut medium_fired = false;

    for hit in &ctx.content_risk.hits {
        let page_type = page_type_from_label(hit.page_type.as_deref().unwrap_or(""));
        let informational = hit.intent == Intent::Prohibitive && is_policy_page(page_type);
        if informational {
            continue;
        }

        if HIGH_RISK_CATEGORIES.contains(&hit.category.as_str()) {
            let eligible = hit.is_corroborated || !is_policy_page(page_type);
            if eligible && !fired_high_risk.contains(&hit.category.as_str()) {
                fired_high_risk.push(hit.category.as_str());
                reasons.push(reason(
                    high_risk_reason_code(&hit.category),
                    ReasonCategory::ContentRisk,
                    ReasonSeverity::Critical,
                    format!("{} content detected on the site", hit.category.replace('_', " ")),
                    Some(hit.source_url.clone()),
                    Some(hit.snippet.clone()),
                    true,
                    false,
                ));
            }
        } else if !medium_fired {
            medium_fired = true;
            reasons.push(reason(
                "MEDIUM_RISK_CONTENT",
                ReasonCategory::ContentRisk,
                ReasonSeverity::High,
                format!("medium-risk {} content detected", hit.category.replace('_', " ")),
                Some(hit.source_url.clone()),
                Some(hit.snippet.clone()),
                false,
                true,
            ));
        }
    }

    if ctx.content_risk.summary.dummy_content_detected {
        let evidence = ctx.content_risk.dummy_words_detected.first();
        reasons.push(reason(
            "PLACEHOLDER_CONTENT",
            ReasonCategory::ContentRisk,
            ReasonSeverity::High,
            "placeholder or lorem-ipsum content detected",
            evidence.map(|(url, _)| url.clone()),
            evidence.map(|(_, snip)| snip.clone()),
            false,
            true,
        ));
    }

    reasons
}

fn phase_checkout(ctx: &DecisionContext) -> Vec<ReasonCode> {
    let mut reasons = Vec::new();
    let checkout = ctx.checkout;

    let dead_ctas_only = checkout.has_cta && !checkout.cta_clickable && !checkout.dead_ctas.is_empty();
    if dead_ctas_only {
        reasons.push(reason(
            "DEAD_CTAS_ONLY",
            ReasonCategory::Checkout,
            ReasonSeverity::Critical,
            "every sampled call-to-action failed to lead anywhere",
            checkout.checkout_url.clone(),
            checkout.dead_ctas.first().cloned(),
            true,
            false,
        ));
    } else if !checkout.has_cta && !checkout.checkout_reachable {
        reasons.push(reason(
            "NO_CHECKOUT_FLOW",
            ReasonCategory::Checkout,
            ReasonSeverity::High,
            "no checkout or purchase flow could be found",
            None,
            None,
            false,
            true,
        ));
    } else if checkout.has_cta && !checkout.checkout_reachable {
        reasons.push(reason(
            "CHECKOUT_INCOMPLETE",
            ReasonCategory::Checkout,
            ReasonSeverity::High,
            "a call-to-action was found but never reached a real checkout page",
            checkout.checkout_url.clone(),
            None,
            false,
            true,
        ));
    }

    let looks_fake_pricing = checkout.pricing_visible
        && !checkout.has_cta
        && !checkout.checkout_reachable
        && !checkout.form_fields_present
        && checkout.checkout_confidence < 0.1;
    if looks_fake_pricing {
        reasons.push(reason(
            "FAKE_PRICING",
            ReasonCategory::Checkout,
            ReasonSeverity::Critical,
            "pricing is displayed but no functioning purchase mechanism backs it",
            checkout.checkout_url.clone(),
            None,
            true,
            false,
        ));
    }

    if !checkout.pricing_visible {
        reasons.push(reason(
            "MISSING_PRICING",
            ReasonCategory::Checkout,
            ReasonSeverity::High,
            "no pricing information is visible on the site",
            None,
            None,
            false,
            true,
        ));
    }

    reasons
}

fn phase_entity(ctx: &DecisionContext) -> Vec<ReasonCode> {
    let mut reasons = Vec::new();
    let Some(entity) = ctx.entity_match else {
        return reasons;
    };

    match entity.match_status {
        MatchStatus::Mismatch => reasons.push(reason(
            "LEGAL_ENTITY_MISMATCH",
            ReasonCategory::Entity,
            ReasonSeverity::High,
            "the declared legal entity name does not match the site's extracted names",
            None,
            entity.best_match.clone(),
            false,
            true,
        )),
        MatchStatus::PartialMatch => reasons.push(reason(
            "PARTIAL_ENTITY_MATCH",
            ReasonCategory::Entity,
            ReasonSeverity::High,
            "the declared legal entity name only partially matches the site's extracted names",
            None,
            entity.best_match.clone(),
            false,
            true,
        )),
        MatchStatus::Match | MatchStatus::NoMatch => {}
    }

    if let Some(address) = &entity.address_match {
        if address.status == MatchStatus::Mismatch {
            reasons.push(reason(
                "ADDRESS_MISMATCH",
                ReasonCategory::Entity,
                ReasonSeverity::High,
                "the declared registered address does not match any address found on the site",
                None,
                address.best_match.clone(),
                false,
                true,
            ));
        }
    }

    reasons
}

fn phase_product_business_type(ctx: &DecisionContext) -> Vec<ReasonCode> {
    let mut reasons = Vec::new();

    if ctx.product_match_status == ProductMatchStatus::Mismatch {
        reasons.push(reason(
            "PRODUCT_MISMATCH",
            ReasonCategory::Product,
            ReasonSeverity::High,
            "the declared products/services do not match what the site actually offers",
            None,
            None,
            false,
            true,
        ));
    }

    if ctx.business_type_mismatch {
        reasons.push(reason(
            "BUSINESS_TYPE_MISMATCH",
            ReasonCategory::Product,
            ReasonSeverity::High,
            "the declared business type does not match the site's observed business context",
            None,
            None,
            false,
            true,
        ));
    }

    if let Some(days) = ctx.domain_age_days {
        if days < DOMAIN_TOO_NEW_DAYS {
            reasons.push(reason(
                "DOMAIN_TOO_NEW",
                ReasonCategory::Product,
                ReasonSeverity::High,
                format!("the domain was registered only {days} days ago"),
                None,
                None,
                false,
                true,
            ));
        }
    }

    reasons
}

fn phase_contact(ctx: &DecisionContext) -> Vec<ReasonCode> {
    let mut reasons = Vec::new();
    let has_contact_page = ctx.graph.get_page_by_type(PageType::Contact).is_some();
    let has_contact_check = ctx
        .policy_checks
        .iter()
        .any(|c| c.policy_type == PolicyType::ContactUs && c.found);

    if !has_contact_page && !has_contact_check {
        reasons.push(reason(
            "NO_CONTACT_METHOD",
            ReasonCategory::Contact,
            ReasonSeverity::High,
            "no contact page or contact method could be found",
            None,
            None,
            false,
            true,
        ));
    }

    reasons
}

fn confidence_for(decision: Decision, overall_score: u32) -> f64 {
    match decision {
        Decision::Fail => 0.95,
        Decision::Escalate => 0.75,
        Decision::Pass => {
            if overall_score >= 80 {
                0.95
            } else if overall_score >= 60 {
                0.85
            } else {
                0.75
            }
        }
    }
}

fn summary_for(reasons: &[ReasonCode]) -> String {
    match reasons.first() {
        None => "no issues found".to_string(),
        Some(first) => {
            let extra = reasons.len() - 1;
            if extra == 0 {
                first.message.clone()
            } else {
                format!("{} ({extra} additional issue(s) noted)", first.message)
            }
        }
    }
}

/// Runs every phase in fixed order and derives the final decision.
/// Probabilistic signals (compliance score) only affect the PASS
/// confidence tier, never the FAIL/ESCALATE verdict itself.
pub fn evaluate(ctx: &DecisionContext) -> (Decision, Vec<ReasonCode>, f64, String) {
    let mut reasons = Vec::new();
    reasons.extend(phase_accessibility(ctx));
    reasons.extend(phase_policies(ctx));
    reasons.extend(phase_content_risk(ctx));
    reasons.extend(phase_checkout(ctx));
    reasons.extend(phase_entity(ctx));
    reasons.extend(phase_product_business_type(ctx));
    reasons.extend(phase_contact(ctx));

    let decision = if reasons.iter().any(|r| r.is_auto_fail) {
        Decision::Fail
    } else if reasons.iter().any(|r| r.is_auto_escalate) {
        Decision::Escalate
    } else {
        Decision::Pass
    };

    let confidence = confidence_for(decision, ctx.compliance.overall_score);
    let summary = summary_for(&reasons);

    (decision, reasons, confidence, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComplianceBreakdown, Rating, ScoreSection};

    fn empty_compliance(score: u32) -> ComplianceBreakdown {
        ComplianceBreakdown {
            overall_score: score,
            rating: Rating::Fair,
            technical: ScoreSection { score: 0.0, max: 30.0, components: vec![] },
            policy: ScoreSection { score: 0.0, max: 40.0, components: vec![] },
            trust: ScoreSection { score: 0.0, max: 30.0, components: vec![] },
        }
    }

    #[test]
    fn missing_privacy_and_terms_auto_fails() {
        let graph = NormalizedPageGraph::new("https://example.com");
        let content_risk = ContentRiskAnalysis {
            hits: vec![],
            corroboration: Default::default(),
            dummy_words_detected: vec![],
            summary: Default::default(),
        };
        let checkout = CheckoutFlowResult::default();
        let context = BusinessContext {
            primary: BusinessContextType::Unknown,
            status: crate::model::ContextStatus::Undetermined,
            confidence: 0.0,
            frontend_surface: crate::model::FrontendSurface::Unknown,
            reason: String::new(),
            scores: Default::default(),
            alternatives: vec![],
        };
        let compliance = empty_compliance(10);

        let ctx = DecisionContext {
            graph: &graph,
            policy_checks: &[],
            content_risk: &content_risk,
            checkout: &checkout,
            entity_match: None,
            business_context: &context,
            product_match_status: ProductMatchStatus::UnableToVerify,
            business_type_mismatch: false,
            domain_age_days: None,
            compliance: &compliance,
        };

        let (decision, reasons, confidence, _summary) = evaluate(&ctx);
        assert_eq!(decision, Decision::Fail);
        assert_eq!(confidence, 0.95);
        assert!(reasons.iter().any(|r| r.code == "SITE_UNREACHABLE"));
    }

    #[test]
    fn confidence_scales_with_score_on_pass() {
        assert_eq!(confidence_for(Decision::Pass, 85), 0.95);
        assert_eq!(confidence_for(Decision::Pass, 65), 0.85);
        assert_eq!(confidence_for(Decision::Pass, 40), 0.75);
    }

    #[test]
    fn summary_counts_additional_issues() {
        let reasons = vec![
            reason("A", ReasonCategory::Policy, ReasonSeverity::Critical, "first issue", None, None, true, false),
            reason("B", ReasonCategory::Policy, ReasonSeverity::Critical, "second issue", None, None, true, false),
        ];
        assert_eq!(summary_for(&reasons), "first issue (1 additional issue(s) noted)");
    }
}
