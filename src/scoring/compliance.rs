//! Technical/Policy/Trust compliance sub-scores.
//!
//! Grounded on `market_research_agent/analyzers/compliance_intelligence.py`
//! (`ComplianceIntelligence.score`).

use crate::analyzers::content_risk::{is_policy_page, ContentRiskAnalysis};
use crate::model::{
    BusinessContextType, ComplianceBreakdown, Intent, NormalizedPageGraph, PageType, PolicyCheckResult, PolicyExpectation,
    PolicyType, Rating, ScoreComponent, ScoreSection,
};

/// The four policy types graded by the Policy sub-score (spec.md section
/// 4.12: "Four policies: privacy_policy, terms_condition, returns_refund,
/// contact_us"). Deliberately distinct from the unified `POLICY_PAGE_SET`
/// used for trust-score suppression and decision-rule checks — see
/// DESIGN.md's Open Question resolution.
const GRADED_POLICY_TYPES: &[PolicyType] = &[
    PolicyType::PrivacyPolicy,
    PolicyType::TermsConditions,
    PolicyType::RefundPolicy,
    PolicyType::ContactUs,
];

const MIN_CONTENT_LENGTH_FOR_FULL_CREDIT: usize = 500;

fn technical_score(graph: &NormalizedPageGraph, domain_age_days: Option<i64>) -> ScoreSection {
    let mut components = Vec::new();

    let home = graph.get_page_by_type(PageType::Home);
    let ssl_ok = home
        .map(|h| h.final_url.starts_with("https://") && h.error.as_ref().map(|e| !matches!(e.kind, crate::model::CrawlErrorKind::Ssl)).unwrap_or(true))
        .unwrap_or(false);
    let ssl_points = if ssl_ok { 15.0 } else { 0.0 };
    components.push(ScoreComponent {
        name: "ssl".to_string(),
        points: ssl_points,
        max_points: 15.0,
        status: if ssl_ok { "pass".to_string() } else { "fail".to_string() },
        reason: if ssl_ok { "valid HTTPS connection".to_string() } else { "missing or invalid SSL".to_string() },
        signal_reference: Some("technical.ssl".to_string()),
        signal_type: None,
        evidence: home.map(|h| h.final_url.clone()),
    });

    let age_points = match domain_age_days {
        Some(days) if days < 180 => 0.0,
        Some(days) if days < 365 => 5.0,
        Some(days) if days < 1095 => 10.0,
        Some(_) => 15.0,
        None => 0.0,
    };
    components.push(ScoreComponent {
        name: "domain_age".to_string(),
        points: age_points,
        max_points: 15.0,
        status: if domain_age_days.is_some() { "checked".to_string() } else { "unknown".to_string() },
        reason: match domain_age_days {
            Some(days) => format!("domain registered {days} days ago"),
            None => "domain age unavailable (RDAP lookup failed)".to_string(),
        },
        signal_reference: Some("technical.domain_age".to_string()),
        signal_type: None,
        evidence: None,
    });

    let score = components.iter().map(|c| c.points).sum();
    ScoreSection { score, max: 30.0, components }
}

fn grade_policy(check: &PolicyCheckResult) -> (f64, &'static str) {
    match check.expectation {
        PolicyExpectation::NotApplicable => (10.0, "not applicable for this business context"),
        PolicyExpectation::Optional if !check.found => (10.0, "optional and not found — no penalty"),
        PolicyExpectation::Required if !check.found => (0.0, "required policy not found"),
        _ if check.found => {
            let substantial = check.content_length.unwrap_or(0) >= MIN_CONTENT_LENGTH_FOR_FULL_CREDIT && check.has_required_keywords;
            if substantial {
                (10.0, "found with substantial, relevant content")
            } else {
                (6.0, "found but thin or missing expected keywords")
            }
        }
        _ => (0.0, "not found"),
    }
}

fn policy_score(policy_checks: &[PolicyCheckResult]) -> ScoreSection {
    let mut components = Vec::new();
    for policy_type in GRADED_POLICY_TYPES {
        let Some(check) = policy_checks.iter().find(|c| c.policy_type == *policy_type) else {
            continue;
        };
        let (points, reason) = grade_policy(check);
        components.push(ScoreComponent {
            name: format!("{policy_type:?}"),
            points,
            max_points: 10.0,
            status: if check.found { "found".to_string() } else { "not_found".to_string() },
            reason: reason.to_string(),
            signal_reference: Some(format!("policy.{policy_type:?}")),
            signal_type: Some(format!("{:?}", check.expectation)),
            evidence: check.url.clone(),
        });
    }
    let score = components.iter().map(|c| c.points).sum();
    ScoreSection { score, max: 40.0, components }
}

/// Mirrors `compliance_intelligence.py`'s elif chain. Categories with no
/// explicit handling (the HIGH_RISK set and the long tail of MCC-adjacent
/// restricted categories) fall through to zero penalty: those are surfaced
/// via the decision rules' auto-FAIL path instead of a trust-score ding.
fn category_penalty(category: &str, context: BusinessContextType) -> (f64, bool) {
    use BusinessContextType::*;
    match category {
        "crypto" if matches!(context, BlockchainInfrastructure | FintechInfrastructure) => (0.0, true),
        "crypto" => (5.0, false),
        "forex" if context == FintechInfrastructure => (0.0, true),
        "forex" => (5.0, false),
        "securities" | "money_transfer" | "money_changer" | "digital_lending" if context == FintechInfrastructure => {
            (0.0, true)
        }
        "securities" | "money_transfer" | "money_changer" | "digital_lending" => (5.0, false),
        "gambling" => (15.0, false),
        "adult" => (20.0, false),
        "pharmacy" => (10.0, false),
        "alcohol" | "tobacco" => (3.0, false),
        _ => (0.0, false),
    }
}

fn trust_score(content_risk: &ContentRiskAnalysis, context: BusinessContextType) -> ScoreSection {
    let mut components = Vec::new();
    let mut running = 30.0f64;

    for hit in &content_risk.hits {
        let page_type = page_type_from_label(hit.page_type.as_deref().unwrap_or(""));
        let is_informational = hit.intent == Intent::Prohibitive && is_policy_page(page_type);

        let (penalty, context_flagged) = if is_informational {
            (0.0, false)
        } else {
            category_penalty(&hit.category, context)
        };

        if penalty == 0.0 && !is_informational && !context_flagged {
            continue;
        }

        running -= penalty;
        components.push(ScoreComponent {
            name: format!("{}:{}", hit.category, hit.keyword),
            points: -penalty,
            max_points: 0.0,
            status: if is_informational { "informational".to_string() } else { "penalized".to_string() },
            reason: if is_informational {
                "prohibitive mention on a policy page — informational only".to_string()
            } else if context_flagged {
                format!("{} flagged as informational for this business context", hit.category)
            } else {
                format!("{} content penalty applied", hit.category)
            },
            signal_reference: Some("trust.restricted_keyword".to_string()),
            signal_type: Some(hit.category.clone()),
            evidence: Some(format!("{} :: {}", hit.source_url, hit.snippet)),
        });
    }

    if content_risk.summary.dummy_content_detected {
        running -= 10.0;
        components.push(ScoreComponent {
            name: "dummy_content".to_string(),
            points: -10.0,
            max_points: 0.0,
            status: "penalized".to_string(),
            reason: "placeholder/lorem-ipsum content detected".to_string(),
            signal_reference: Some("trust.dummy_content".to_string()),
            signal_type: None,
            evidence: content_risk.dummy_words_detected.first().map(|(url, snip)| format!("{url} :: {snip}")),
        });
    }

    let floored = running.max(0.0);
    ScoreSection { score: floored, max: 30.0, components }
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

fn rating_for(overall: u32) -> Rating {
    if overall >= 80 {
        Rating::Good
    } else if overall >= 50 {
        Rating::Fair
    } else {
        Rating::Poor
    }
}

/// Computes the full compliance breakdown from an already-resolved domain
/// age (the engine runs the RDAP lookup once and shares it with both
/// scoring and the audit trail).
pub fn score_with_domain_age(
    graph: &NormalizedPageGraph,
    policy_checks: &[PolicyCheckResult],
    content_risk: &ContentRiskAnalysis,
    context: BusinessContextType,
    domain_age_days: Option<i64>,
) -> ComplianceBreakdown {
    let technical = technical_score(graph, domain_age_days);
    let policy = policy_score(policy_checks);
    let trust = trust_score(content_risk, context);
    let overall = (technical.score + policy.score + trust.score).round().max(0.0).min(100.0) as u32;

    ComplianceBreakdown {
        overall_score: overall,
        rating: rating_for(overall),
        technical,
        policy,
        trust,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PolicyType;

    fn check(policy_type: PolicyType, found: bool, expectation: PolicyExpectation) -> PolicyCheckResult {
        PolicyCheckResult {
            policy_type,
            found,
            url: found.then(|| "https://example.com/policy".to_string()),
            content_length: found.then_some(1000),
            has_required_keywords: found,
            expectation,
        }
    }

    #[test]
    fn missing_required_policy_scores_zero() {
        let checks = vec![check(PolicyType::PrivacyPolicy, false, PolicyExpectation::Required)];
        let section = policy_score(&checks);
        assert_eq!(section.components[0].points, 0.0);
    }

    #[test]
    fn missing_optional_policy_scores_full_points() {
        let checks = vec![check(PolicyType::RefundPolicy, false, PolicyExpectation::Optional)];
        let section = policy_score(&checks);
        assert_eq!(section.components[0].points, 10.0);
    }

    #[test]
    fn not_applicable_always_scores_full_points() {
        let checks = vec![check(PolicyType::RefundPolicy, false, PolicyExpectation::NotApplicable)];
        let section = policy_score(&checks);
        assert_eq!(section.components[0].points, 10.0);
    }

    #[test]
    fn rating_thresholds_match_spec() {
        assert_eq!(rating_for(85), Rating::Good);
        assert_eq!(rating_for(60), Rating::Fair);
        assert_eq!(rating_for(30), Rating::Poor);
    }
}
