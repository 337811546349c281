//! Evidence-based business-context classification (C10).
//!
//! Grounded on `market_research_agent/analyzers/context_classifier.py` and
//! `context_evidence.py`.

use std::collections::HashMap;

use crate::model::{BusinessContext, BusinessContextType, ContextAlternative, ContextStatus, FrontendSurface, NormalizedPageGraph, PageType};

struct CategorySignals {
    context_type: BusinessContextType,
    /// Strong, near-unambiguous phrases; each hit is worth `strong_weight`.
    strong_keywords: &'static [&'static str],
    /// Weaker/generic phrases shared across categories; worth less.
    weak_keywords: &'static [&'static str],
}

const STRONG_WEIGHT: f64 = 2.0;
const WEAK_WEIGHT: f64 = 0.5;
const MAX_KEYWORD_CONTRIBUTION: f64 = 8.0;

static CATEGORY_SIGNALS: &[CategorySignals] = &[
    CategorySignals {
        context_type: BusinessContextType::EcommerceMerchant,
        strong_keywords: &["add to cart", "shopping cart", "free shipping", "buy now", "in stock", "place order"],
        weak_keywords: &["checkout", "sale", "discount"],
    },
    CategorySignals {
        context_type: BusinessContextType::Marketplace,
        strong_keywords: &["become a seller", "multi-vendor", "sell on our platform", "marketplace sellers"],
        weak_keywords: &["vendors", "marketplace"],
    },
    CategorySignals {
        context_type: BusinessContextType::SaasProduct,
        strong_keywords: &["free trial", "start your trial", "api access", "monthly subscription", "per seat"],
        weak_keywords: &["dashboard", "sign up", "login", "subscription"],
    },
    CategorySignals {
        context_type: BusinessContextType::FintechInfrastructure,
        strong_keywords: &["payment processing", "money transfer", "wire transfer", "kyc compliance", "aml policy", "banking infrastructure"],
        weak_keywords: &["credit card", "debit card", "payment methods"],
    },
    CategorySignals {
        context_type: BusinessContextType::BlockchainInfrastructure,
        strong_keywords: &["smart contract", "defi protocol", "blockchain network", "on-chain", "token swap", "web3 wallet"],
        weak_keywords: &["cryptocurrency", "nft", "crypto"],
    },
    CategorySignals {
        context_type: BusinessContextType::ContentMedia,
        strong_keywords: &["subscribe to our newsletter", "read the full article", "watch now", "episode"],
        weak_keywords: &["blog", "articles", "news"],
    },
    CategorySignals {
        context_type: BusinessContextType::DeveloperPlatform,
        strong_keywords: &["api documentation", "developer docs", "sdk reference", "api reference", "install via npm"],
        weak_keywords: &["github", "code example", "documentation"],
    },
];

fn score_text(text_lower: &str, signals: &CategorySignals) -> f64 {
    let mut score = 0.0;
    for kw in signals.strong_keywords {
        if text_lower.contains(kw) {
            score += STRONG_WEIGHT;
        }
    }
    for kw in signals.weak_keywords {
        if text_lower.contains(kw) {
            score += WEAK_WEIGHT;
        }
    }
    score.min(MAX_KEYWORD_CONTRIBUTION)
}

fn has_login_redirect_or_gate(graph: &NormalizedPageGraph) -> bool {
    graph
        .get_page_by_type(PageType::Home)
        .map(|home| {
            matches!(home.status, 401 | 403)
                || home.final_url.to_lowercase().contains("/login")
                || home.final_url.to_lowercase().contains("/signin")
        })
        .unwrap_or(false)
}

fn has_ecommerce_url_pattern(graph: &NormalizedPageGraph) -> bool {
    graph.all_pages().any(|p| {
        let lower = p.url.to_lowercase();
        lower.contains("/cart") || lower.contains("/checkout") || lower.contains("/product/")
    })
}

/// Classifies the crawled site's business context from keyword, structural
/// and crawl-level evidence, applying the cross-correlation bumps
/// described in spec.md section 4.10.
pub fn classify(graph: &NormalizedPageGraph) -> BusinessContext {
    let pages_fetched = graph.metadata.pages_fetched;
    let home_blocked = graph
        .get_page_by_type(PageType::Home)
        .map(|h| matches!(h.status, 401 | 403))
        .unwrap_or(true);

    if pages_fetched == 0 || home_blocked {
        return BusinessContext {
            primary: BusinessContextType::Unknown,
            status: ContextStatus::Undetermined,
            confidence: 0.0,
            frontend_surface: if home_blocked { FrontendSurface::AuthGated } else { FrontendSurface::Unknown },
            reason: "no pages fetched or homepage blocked".to_string(),
            scores: HashMap::new(),
            alternatives: Vec::new(),
        };
    }

    let combined_text: String = graph.all_pages().map(|p| p.visible_text.to_lowercase()).collect::<Vec<_>>().join(" \n ");
    let auth_gated = has_login_redirect_or_gate(graph);
    let has_pricing_page = graph.get_page_by_type(PageType::Pricing).is_some();
    let has_ecommerce_urls = has_ecommerce_url_pattern(graph);

    let mut scores: HashMap<BusinessContextType, f64> = HashMap::new();
    for signals in CATEGORY_SIGNALS {
        scores.insert(signals.context_type, score_text(&combined_text, signals));
    }

    if has_ecommerce_urls {
        *scores.entry(BusinessContextType::EcommerceMerchant).or_default() += 2.0;
    }
    if has_pricing_page {
        *scores.entry(BusinessContextType::SaasProduct).or_default() += 1.0;
    }

    let blockchain_score = *scores.get(&BusinessContextType::BlockchainInfrastructure).unwrap_or(&0.0);
    if blockchain_score >= 4.0 {
        *scores.entry(BusinessContextType::SaasProduct).or_default() -= 2.0;
        *scores.entry(BusinessContextType::DeveloperPlatform).or_default() -= 1.0;
    }

    let mut ranked: Vec<(BusinessContextType, f64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let (primary, primary_score) = ranked.first().copied().unwrap_or((BusinessContextType::Unknown, 0.0));
    let runner_up_score = ranked.get(1).map(|(_, s)| *s).unwrap_or(0.0);
    let gap = primary_score - runner_up_score;

    let (primary, status) = if primary_score <= 0.0 {
        (BusinessContextType::Unknown, ContextStatus::Undetermined)
    } else if primary_score <= 3.0 || gap < 1.0 {
        (primary, ContextStatus::LowConfidence)
    } else {
        (primary, ContextStatus::Determined)
    };

    let confidence = if primary_score <= 0.0 {
        0.0
    } else {
        (primary_score / (primary_score + runner_up_score + 1.0)).min(1.0)
    };

    let frontend_surface = if auth_gated {
        FrontendSurface::AuthGated
    } else if has_ecommerce_urls {
        FrontendSurface::FullCommerce
    } else if primary == BusinessContextType::DeveloperPlatform && graph.get_page_by_type(PageType::Docs).is_some() {
        FrontendSurface::ApiDocs
    } else if primary == BusinessContextType::ContentMedia {
        FrontendSurface::ContentOnly
    } else {
        FrontendSurface::MarketingSite
    };

    let alternatives: Vec<ContextAlternative> = ranked
        .iter()
        .skip(1)
        .filter(|(_, score)| *score > 0.0)
        .take(2)
        .map(|(t, s)| ContextAlternative { context_type: *t, score: *s })
        .collect();

    BusinessContext {
        primary,
        status,
        confidence: (confidence * 100.0).round() / 100.0,
        frontend_surface,
        reason: format!("primary score {primary_score:.1}, runner-up {runner_up_score:.1}"),
        scores: ranked.into_iter().map(|(t, s)| (format!("{t:?}"), s)).collect(),
        alternatives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PageArtifact, RenderType, SourceTag};

    fn graph_with_text(text: &str) -> NormalizedPageGraph {
        let mut graph = NormalizedPageGraph::new("https://example.com");
        graph.metadata.pages_fetched = 1;
        graph.add_page(PageArtifact {
            url: "https://example.com".into(),
            final_url: "https://example.com".into(),
            status: 200,
            content_type: "text/html".into(),
            html: String::new(),
            visible_text: text.to_string(),
            canonical_url: None,
            title: None,
            page_type: PageType::Home,
            classification_confidence: 1.0,
            depth: 0,
            source: SourceTag::Root,
            content_hash: PageArtifact::compute_content_hash(text),
            extracted_links: Vec::new(),
            render_type: RenderType::Http,
            error: None,
        });
        graph
    }

    #[test]
    fn undetermined_with_zero_pages() {
        let graph = NormalizedPageGraph::new("https://example.com");
        let ctx = classify(&graph);
        assert_eq!(ctx.status, ContextStatus::Undetermined);
    }

    #[test]
    fn strong_ecommerce_signals_determine_context() {
        let graph = graph_with_text("Add to cart, free shipping on all orders, buy now while in stock. Checkout securely.");
        let ctx = classify(&graph);
        assert_eq!(ctx.primary, BusinessContextType::EcommerceMerchant);
        assert_eq!(ctx.status, ContextStatus::Determined);
    }

    #[test]
    fn auth_gated_homepage_is_detected() {
        let mut graph = graph_with_text("login required");
        graph.add_page(PageArtifact {
            url: "https://example.com".into(),
            final_url: "https://example.com/login".into(),
            status: 200,
            content_type: "text/html".into(),
            html: String::new(),
            visible_text: "please sign in".into(),
            canonical_url: None,
            title: None,
            page_type: PageType::Home,
            classification_confidence: 1.0,
            depth: 0,
            source: SourceTag::Root,
            content_hash: PageArtifact::compute_content_hash(""),
            extracted_links: Vec::new(),
            render_type: RenderType::Http,
            error: None,
        });
        let ctx = classify(&graph);
        assert_eq!(ctx.frontend_surface, FrontendSurface::AuthGated);
    }
}
