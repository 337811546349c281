//! Multi-page content-risk analysis with intent classification and
//! cross-page corroboration (C6).
//!
//! Grounded on `market_research_agent/analyzers/content_analyzer.py`
//! (`ContentAnalyzer.analyze`).

use std::collections::{HashMap, HashSet};

use crate::model::{ContentRiskSummary, Intent, PageType, RestrictedKeywordHit, Severity};

use super::keywords::{self, HIGH_RISK_CATEGORIES, RESTRICTED_KEYWORDS};

/// Window radius (characters) scanned around a keyword hit for intent
/// markers — wider than the evidence snippet so markers just outside the
/// quoted text still count.
const INTENT_WINDOW: usize = 150;

/// The unified policy-page set (spec.md section 9, Open Question 1):
/// prohibitive hits landing on one of these page types are informational
/// and must never contribute to risk scoring or FAIL rules.
pub fn is_policy_page(page_type: PageType) -> bool {
    matches!(
        page_type,
        PageType::PrivacyPolicy | PageType::TermsConditions | PageType::RefundPolicy | PageType::ShippingDelivery
    )
}

fn base_severity(category: &str) -> Severity {
    if HIGH_RISK_CATEGORIES.contains(&category) {
        Severity::High
    } else {
        match category {
            "pharmacy" | "crypto" | "forex" | "securities" | "money_transfer" => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

pub struct ContentRiskAnalysis {
    pub hits: Vec<RestrictedKeywordHit>,
    pub corroboration: HashMap<String, Vec<String>>,
    pub dummy_words_detected: Vec<(String, String)>,
    pub summary: ContentRiskSummary,
}

/// One page's worth of analyzer input: its URL, cleaned visible text, and
/// the crawler's classified page type.
pub struct PageInput<'a> {
    pub url: &'a str,
    pub visible_text: &'a str,
    pub page_type: PageType,
}

/// Runs keyword matching + intent classification over every page, then
/// corroborates and promotes severity across the whole set.
pub fn analyze(pages: &[PageInput<'_>]) -> ContentRiskAnalysis {
    let mut hits: Vec<RestrictedKeywordHit> = Vec::new();
    let mut category_urls: HashMap<&'static str, HashSet<String>> = HashMap::new();
    let mut dummy_words_detected: Vec<(String, String)> = Vec::new();

    for page in pages {
        for snippet in keywords::find_dummy_text(page.visible_text) {
            dummy_words_detected.push((page.url.to_string(), snippet));
        }

        for category in RESTRICTED_KEYWORDS {
            for keyword in category.keywords {
                for (start, end) in keywords::find_matches(page.visible_text, keyword) {
                    let window_start = start.saturating_sub(INTENT_WINDOW);
                    let window_end = (end + INTENT_WINDOW).min(page.visible_text.len());
                    let window = safe_slice(page.visible_text, window_start, window_end);
                    let intent = keywords::classify_intent_window(&window);
                    let snippet = keywords::extract_snippet(page.visible_text, start, end);

                    category_urls.entry(category.category).or_default().insert(page.url.to_string());

                    hits.push(RestrictedKeywordHit {
                        keyword: keyword.to_string(),
                        category: category.category.to_string(),
                        source_url: page.url.to_string(),
                        snippet,
                        severity: base_severity(category.category),
                        intent,
                        page_type: Some(page_type_label(page.page_type).to_string()),
                        intent_context: Some(window),
                        is_corroborated: false,
                    });
                }
            }
        }
    }

    let corroboration: HashMap<String, Vec<String>> = category_urls
        .iter()
        .filter(|(_, urls)| urls.len() >= 2)
        .map(|(cat, urls)| {
            let mut list: Vec<String> = urls.iter().cloned().collect();
            list.sort();
            (cat.to_string(), list)
        })
        .collect();

    for hit in &mut hits {
        let corroborated = corroboration.contains_key(&hit.category);
        hit.is_corroborated = corroborated;

        if HIGH_RISK_CATEGORIES.contains(&hit.category.as_str()) {
            hit.severity = if corroborated { Severity::Critical } else { Severity::Medium };
        }
    }

    let mut risk_contributing_count = 0usize;
    let mut policy_mentions_count = 0usize;
    let mut high_risk_categories: HashSet<String> = HashSet::new();
    let mut medium_risk_categories: HashSet<String> = HashSet::new();

    for hit in &hits {
        let pt = page_type_from_label(hit.page_type.as_deref().unwrap_or(""));
        let is_informational = hit.intent == Intent::Prohibitive && is_policy_page(pt);
        if is_informational {
            policy_mentions_count += 1;
            continue;
        }
        risk_contributing_count += 1;
        match hit.severity {
            Severity::Critical | Severity::High => {
                high_risk_categories.insert(hit.category.clone());
            }
            Severity::Medium => {
                medium_risk_categories.insert(hit.category.clone());
            }
            Severity::Low => {}
        }
    }

    let summary = ContentRiskSummary {
        total_keywords_found: hits.len(),
        risk_contributing_count,
        policy_mentions_count,
        corroborated_categories: {
            let mut v: Vec<String> = corroboration.keys().cloned().collect();
            v.sort();
            v
        },
        pages_analyzed: pages.len(),
        high_risk_categories: {
            let mut v: Vec<String> = high_risk_categories.into_iter().collect();
            v.sort();
            v
        },
        medium_risk_categories: {
            let mut v: Vec<String> = medium_risk_categories.into_iter().collect();
            v.sort();
            v
        },
        dummy_content_detected: !dummy_words_detected.is_empty(),
    };

    ContentRiskAnalysis {
        hits,
        corroboration,
        dummy_words_detected,
        summary,
    }
}

fn safe_slice(text: &str, mut start: usize, mut end: usize) -> String {
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }
    text[start..end].to_string()
}

fn page_type_label(pt: PageType) -> &'static str {
    match pt {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prohibitive_hit_on_policy_page_is_informational() {
        let pages = vec![PageInput {
            url: "https://example.com/privacy",
            visible_text: "We do not allow gambling or sports betting on this platform under any circumstances.",
            page_type: PageType::PrivacyPolicy,
        }];
        let analysis = analyze(&pages);
        assert!(analysis.summary.policy_mentions_count >= 1);
        assert_eq!(analysis.summary.risk_contributing_count, 0);
    }

    #[test]
    fn corroborated_gambling_hits_are_promoted_to_critical() {
        let pages = vec![
            PageInput {
                url: "https://example.com/",
                visible_text: "Join our online casino and play now for big jackpots!",
                page_type: PageType::Home,
            },
            PageInput {
                url: "https://example.com/games",
                visible_text: "Our sportsbook offers live sports betting odds updated daily.",
                page_type: PageType::Other,
            },
        ];
        let analysis = analyze(&pages);
        assert!(analysis.corroboration.contains_key("gambling"));
        assert!(analysis
            .hits
            .iter()
            .any(|h| h.category == "gambling" && h.severity == Severity::Critical));
    }

    #[test]
    fn uncorroborated_high_risk_hit_capped_at_medium() {
        let pages = vec![PageInput {
            url: "https://example.com/",
            visible_text: "Check out our online casino for a great time!",
            page_type: PageType::Home,
        }];
        let analysis = analyze(&pages);
        let hit = analysis.hits.iter().find(|h| h.category == "gambling").unwrap();
        assert_eq!(hit.severity, Severity::Medium);
    }

    #[test]
    fn dummy_text_is_detected() {
        let pages = vec![PageInput {
            url: "https://example.com/about",
            visible_text: "Lorem ipsum dolor sit amet, consectetur adipiscing elit.",
            page_type: PageType::About,
        }];
        let analysis = analyze(&pages);
        assert!(analysis.summary.dummy_content_detected);
    }
}
