//! URL normalization and probabilistic page classification.
//!
//! Grounded on `market_research_agent/crawlers/url_utils.py`
//! (`URLNormalizer`, `PageClassifier`).

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::model::PageType;

/// Query params kept during normalization; everything else is dropped since
/// it rarely differentiates content and only hurts dedup.
const PRESERVE_PARAMS: &[&str] = &["p", "page", "id", "product", "category"];

/// URL patterns for content pages (blog/news/article) that must never be
/// classified as a policy-ish type even if the URL happens to contain a
/// matching keyword (e.g. `/blog/our-privacy-policy-explained`).
const CONTENT_URL_PATTERNS: &[&str] = &[
    r"/blog/",
    r"/blogs/",
    r"/news/",
    r"/article/",
    r"/articles/",
    r"/post/",
    r"/posts/",
    r"/insights/",
    r"/resources/",
    r"/webinars?/",
    r"/events?/",
    r"/press/",
    r"/media/",
    r"/case[-_]?stud(y|ies)/",
];

/// URLs that should never be fetched or classified.
const SKIP_PATTERNS: &[&str] = &[
    r"\.pdf$",
    r"\.jpg$",
    r"\.jpeg$",
    r"\.png$",
    r"\.gif$",
    r"\.css$",
    r"\.js$",
    r"/cdn[-_]cgi/",
    r"^javascript:",
    r"^mailto:",
    r"^tel:",
];

struct PatternRule {
    pattern: &'static str,
    weight: f64,
}

struct PageTypeRules {
    page_type: PageType,
    url_patterns: &'static [PatternRule],
    text_patterns: &'static [PatternRule],
}

macro_rules! rule {
    ($pattern:expr, $weight:expr) => {
        PatternRule {
            pattern: $pattern,
            weight: $weight,
        }
    };
}

lazy_static! {
    static ref SKIP_RE: Vec<Regex> = SKIP_PATTERNS.iter().map(|p| Regex::new(p).unwrap()).collect();
    static ref CONTENT_RE: Vec<Regex> = CONTENT_URL_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect();
    static ref COMPILED_PAGE_RULES: Vec<CompiledPageRules> = PAGE_RULES
        .iter()
        .map(|rules| CompiledPageRules {
            page_type: rules.page_type,
            url_patterns: rules
                .url_patterns
                .iter()
                .map(|r| (Regex::new(r.pattern).unwrap(), r.weight))
                .collect(),
            text_patterns: rules
                .text_patterns
                .iter()
                .map(|r| (Regex::new(r.pattern).unwrap(), r.weight))
                .collect(),
        })
        .collect();
    static ref POLICY_LIKE_TYPES: HashSet<PageType> = [
        PageType::About,
        PageType::Contact,
        PageType::PrivacyPolicy,
        PageType::TermsConditions,
        PageType::RefundPolicy,
        PageType::ShippingDelivery,
        PageType::Faq,
        PageType::Product,
        PageType::Pricing,
        PageType::Solutions,
    ]
    .into_iter()
    .collect();
}

static PAGE_RULES: &[PageTypeRules] = &[
    PageTypeRules {
        page_type: PageType::PrivacyPolicy,
        url_patterns: &[
            rule!(r"privacy[-_]?policy", 1.0),
            rule!(r"/privacy/?$", 0.9),
            rule!(r"gdpr", 0.8),
            rule!(r"data[-_]?protection", 0.8),
        ],
        text_patterns: &[
            rule!(r"privacy\s*policy", 1.0),
            rule!(r"privacy", 0.6),
            rule!(r"data\s*protection", 0.7),
        ],
    },
    PageTypeRules {
        page_type: PageType::TermsConditions,
        url_patterns: &[
            rule!(r"terms[-_]?(and[-_]?)?conditions?", 1.0),
            rule!(r"terms[-_]?of[-_]?(service|use)", 1.0),
            rule!(r"/terms/?$", 0.9),
            rule!(r"/tos/?$", 0.9),
            rule!(r"t-?and-?c", 0.8),
        ],
        text_patterns: &[
            rule!(r"terms\s*(and|&)?\s*conditions?", 1.0),
            rule!(r"terms\s*of\s*(service|use)", 1.0),
            rule!(r"terms", 0.5),
        ],
    },
    PageTypeRules {
        page_type: PageType::RefundPolicy,
        url_patterns: &[
            rule!(r"refund[-_]?policy", 1.0),
            rule!(r"return[-_]?policy", 1.0),
            rule!(r"/refunds?/?$", 0.9),
            rule!(r"/returns?/?$", 0.9),
            rule!(r"cancellation", 0.7),
        ],
        text_patterns: &[
            rule!(r"refund\s*policy", 1.0),
            rule!(r"return\s*policy", 1.0),
            rule!(r"refund", 0.6),
            rule!(r"cancellation", 0.5),
        ],
    },
    PageTypeRules {
        page_type: PageType::ShippingDelivery,
        url_patterns: &[
            rule!(r"shipping", 0.9),
            rule!(r"delivery", 0.9),
            rule!(r"dispatch", 0.7),
        ],
        text_patterns: &[
            rule!(r"shipping\s*(policy|info)", 1.0),
            rule!(r"delivery\s*(info|policy)", 1.0),
            rule!(r"shipping", 0.6),
        ],
    },
    PageTypeRules {
        page_type: PageType::About,
        url_patterns: &[
            rule!(r"about[-_]?us", 1.0),
            rule!(r"/about/?$", 0.95),
            rule!(r"who[-_]?we[-_]?are", 0.9),
            rule!(r"our[-_]?story", 0.9),
            rule!(r"[-/][a-z]+-story/?$", 0.85),
            rule!(r"/company/?$", 0.85),
            rule!(r"/story/?$", 0.8),
        ],
        text_patterns: &[
            rule!(r"about\s*us", 1.0),
            rule!(r"who\s*we\s*are", 0.9),
            rule!(r"our\s*story", 0.85),
            rule!(r"^company$", 0.8),
        ],
    },
    PageTypeRules {
        page_type: PageType::Contact,
        url_patterns: &[
            rule!(r"contact[-_]?us", 1.0),
            rule!(r"/contact/?$", 0.9),
            rule!(r"support", 0.6),
            rule!(r"help", 0.5),
        ],
        text_patterns: &[
            rule!(r"contact\s*us", 1.0),
            rule!(r"get\s*in\s*touch", 0.9),
            rule!(r"contact", 0.6),
        ],
    },
    PageTypeRules {
        page_type: PageType::Pricing,
        url_patterns: &[
            rule!(r"/pricing/?$", 1.0),
            rule!(r"/plans?/?$", 0.9),
            rule!(r"/packages?/?$", 0.8),
        ],
        text_patterns: &[
            rule!(r"pricing", 1.0),
            rule!(r"plans?\s*(and|&)?\s*pricing", 1.0),
            rule!(r"plans", 0.6),
        ],
    },
    PageTypeRules {
        page_type: PageType::Product,
        url_patterns: &[
            rule!(r"/products?/?$", 0.9),
            rule!(r"/shop/?$", 0.8),
            rule!(r"/store/?$", 0.8),
            rule!(r"/catalog/?$", 0.7),
            rule!(r"/features?/?$", 0.7),
        ],
        text_patterns: &[
            rule!(r"products?", 0.7),
            rule!(r"features?", 0.6),
            rule!(r"shop", 0.5),
        ],
    },
    PageTypeRules {
        page_type: PageType::Solutions,
        url_patterns: &[
            rule!(r"/solutions?/?$", 1.0),
            rule!(r"/services?/?$", 1.0),
            rule!(r"/offerings?/?$", 0.9),
            rule!(r"/platform/?$", 0.8),
            rule!(r"/capabilities/?$", 0.7),
            rule!(r"/what[-_]?we[-_]?do/?$", 0.8),
        ],
        text_patterns: &[
            rule!(r"^solutions?$", 1.0),
            rule!(r"^services?$", 1.0),
            rule!(r"our\s*solutions?", 0.9),
            rule!(r"our\s*services?", 0.9),
            rule!(r"what\s*we\s*(do|offer)", 0.8),
            rule!(r"platform", 0.6),
        ],
    },
    PageTypeRules {
        page_type: PageType::Faq,
        url_patterns: &[
            rule!(r"/faq/?$", 1.0),
            rule!(r"frequently[-_]?asked", 0.9),
            rule!(r"/help/?$", 0.6),
        ],
        text_patterns: &[
            rule!(r"faq", 1.0),
            rule!(r"frequently\s*asked", 0.9),
            rule!(r"questions", 0.4),
        ],
    },
    PageTypeRules {
        page_type: PageType::Docs,
        url_patterns: &[
            rule!(r"/docs?/?$", 0.9),
            rule!(r"/documentation/?$", 1.0),
            rule!(r"/api/?$", 0.7),
            rule!(r"/guide/?$", 0.7),
        ],
        text_patterns: &[
            rule!(r"documentation", 1.0),
            rule!(r"docs", 0.8),
            rule!(r"api\s*reference", 0.8),
        ],
    },
    PageTypeRules {
        page_type: PageType::Blog,
        url_patterns: &[
            rule!(r"/blog/", 1.0),
            rule!(r"/blog/?$", 1.0),
            rule!(r"/news/", 0.9),
            rule!(r"/news/?$", 0.8),
            rule!(r"/articles?/", 0.8),
            rule!(r"/articles?/?$", 0.7),
            rule!(r"/insights/", 0.7),
            rule!(r"/resources/", 0.6),
            rule!(r"/webinars?/", 0.6),
        ],
        text_patterns: &[rule!(r"blog", 1.0), rule!(r"news", 0.6)],
    },
];

struct CompiledPageRules {
    page_type: PageType,
    url_patterns: Vec<(Regex, f64)>,
    text_patterns: Vec<(Regex, f64)>,
}

/// Outcome of [`classify`]: the most likely page type for a URL plus the
/// confidence of that guess, in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub page_type: PageType,
    pub confidence: f64,
}

/// Normalizes a URL for deduplication: lowercases the host, strips trailing
/// slashes and fragments, and keeps only query params in [`PRESERVE_PARAMS`]
/// (sorted, for a stable string). Falls back to the input unchanged if it
/// fails to parse.
pub fn normalize(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    parsed.set_fragment(None);

    let host = parsed.host_str().map(|h| h.to_lowercase());
    if let Some(h) = &host {
        let _ = parsed.set_host(Some(h));
    }

    let path = parsed.path();
    let trimmed_path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    let trimmed_path = if trimmed_path.is_empty() { "/" } else { trimmed_path };
    parsed.set_path(trimmed_path);

    let mut kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, v)| !v.is_empty() && PRESERVE_PARAMS.contains(&k.to_lowercase().as_str()))
        .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
        .collect();
    kept.sort();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let query = kept
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    parsed.into()
}

/// Returns the registrable-ish domain (host minus a leading `www.`).
pub fn get_domain(raw: &str) -> String {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .map(|h| h.strip_prefix("www.").map(str::to_string).unwrap_or(h))
        .unwrap_or_default()
}

/// Whether `url`'s host is the same site as (or a subdomain of) `base_domain`.
pub fn is_internal(url: &str, base_domain: &str) -> bool {
    let url_domain = get_domain(url);
    let base_domain = base_domain.to_lowercase();
    let base_domain = base_domain.strip_prefix("www.").unwrap_or(&base_domain);
    !url_domain.is_empty() && (url_domain == base_domain || url_domain.ends_with(&format!(".{base_domain}")))
}

fn is_content_url(url_lower: &str) -> bool {
    CONTENT_RE.iter().any(|re| re.is_match(url_lower))
}

/// Classifies a URL (with optional anchor text / page title context) into a
/// [`PageType`] and confidence score, mirroring `PageClassifier.classify` in
/// the original: URL-pattern match sets the base confidence, then anchor
/// text and title contribute smaller top-ups.
pub fn classify(url: &str, anchor_text: &str, title: &str) -> Classification {
    let url_lower = url.to_lowercase();

    if SKIP_RE.iter().any(|re| re.is_match(&url_lower)) {
        return Classification {
            page_type: PageType::Skip,
            confidence: 1.0,
        };
    }

    let path = Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_else(|_| url_lower.clone());
    let anchor_lower = anchor_text.to_lowercase();
    let title_lower = title.to_lowercase();
    let content_url = is_content_url(&url_lower);

    let mut best_type = PageType::Other;
    let mut best_confidence = 0.0f64;

    for rules in COMPILED_PAGE_RULES.iter() {
        if content_url && POLICY_LIKE_TYPES.contains(&rules.page_type) {
            continue;
        }

        let mut confidence = 0.0f64;

        if let Some((_, weight)) = rules.url_patterns.iter().find(|(re, _)| re.is_match(&path)) {
            confidence = confidence.max(*weight);
        }

        if !anchor_lower.is_empty() {
            if let Some((_, weight)) = rules.text_patterns.iter().find(|(re, _)| re.is_match(&anchor_lower)) {
                confidence = (confidence + weight * 0.3).min(1.0);
            }
        }

        if !title_lower.is_empty() {
            if let Some((_, weight)) = rules.text_patterns.iter().find(|(re, _)| re.is_match(&title_lower)) {
                confidence = (confidence + weight * 0.2).min(1.0);
            }
        }

        if confidence > best_confidence {
            best_confidence = confidence;
            best_type = rules.page_type;
        }
    }

    Classification {
        page_type: best_type,
        confidence: (best_confidence * 100.0).round() / 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_fragment_and_trailing_slash() {
        assert_eq!(
            normalize("https://Example.com/Privacy/#section"),
            "https://example.com/Privacy"
        );
    }

    #[test]
    fn normalize_keeps_only_preserved_params_sorted() {
        let normalized = normalize("https://example.com/shop?utm_source=x&product=42&page=2");
        assert_eq!(normalized, "https://example.com/shop?page=2&product=42");
    }

    #[test]
    fn classify_privacy_policy_url() {
        let c = classify("https://example.com/privacy-policy", "", "");
        assert_eq!(c.page_type, PageType::PrivacyPolicy);
        assert!(c.confidence >= 0.9);
    }

    #[test]
    fn classify_blog_url_never_becomes_policy() {
        let c = classify(
            "https://example.com/blog/our-privacy-policy-explained",
            "Privacy Policy",
            "",
        );
        assert_ne!(c.page_type, PageType::PrivacyPolicy);
    }

    #[test]
    fn classify_skip_pattern() {
        let c = classify("https://example.com/logo.png", "", "");
        assert_eq!(c.page_type, PageType::Skip);
    }

    #[test]
    fn is_internal_handles_www_and_subdomains() {
        assert!(is_internal("https://www.example.com/a", "example.com"));
        assert!(is_internal("https://shop.example.com/a", "example.com"));
        assert!(!is_internal("https://evil.com/a", "example.com"));
    }
}
