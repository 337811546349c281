//! Legal-entity name and address fuzzy matching (C8).
//!
//! Grounded on `kyc_site_scan/entity_matcher.py` (`EntityMatcher`).
//! `strsim`'s Levenshtein primitive is used to build the four
//! full/partial/token-sort/token-set ratios the original blends, since no
//! literal rapidfuzz port exists in the retrieved corpus (see DESIGN.md).

use std::collections::HashSet;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::{AddressMatch, EntityMatchResult, MatchStatus, NormalizedPageGraph, PageType};

/// Hard cap on how long the whole extraction + matching pass may take
/// before the caller surrenders the signal as `None` (spec.md section 5).
pub const ENTITY_MATCH_TIMEOUT: Duration = Duration::from_secs(30);

const LEGAL_SUFFIXES: &[&str] = &[
    "private limited",
    "pvt ltd",
    "pvt. ltd.",
    "public limited company",
    "limited liability company",
    "limited liability partnership",
    "llp",
    "llc",
    "l.l.c.",
    "inc.",
    "incorporated",
    "inc",
    "ltd.",
    "ltd",
    "gmbh",
    "corp.",
    "corporation",
    "corp",
    "co.",
    "plc",
    "s.a.",
    "s.r.l.",
    "b.v.",
];

lazy_static! {
    static ref YEAR_RANGE_RE: Regex = Regex::new(r"(?i)\b(19|20)\d{2}(\s*-\s*(19|20)\d{2})?\b").unwrap();
    static ref NON_ALNUM_RE: Regex = Regex::new(r"[^a-z0-9 ]").unwrap();
    static ref COPYRIGHT_RE: Regex = Regex::new(r"(?i)(?:©|\(c\)|copyright)\s*(?:\d{4}\s*)?(?:-\s*\d{4}\s*)?,?\s*([A-Z][A-Za-z0-9&.,'\- ]{2,80})").unwrap();
    static ref OPERATED_BY_RE: Regex =
        Regex::new(r"(?i)(?:operated|provided|owned)\s+by\s+([A-Z][A-Za-z0-9&.,'\- ]{2,80})").unwrap();
    static ref STOPWORD_SUFFIX_RE: Regex =
        Regex::new(r"(?i)\s+all\s+rights\s+reserved\.?\s*$").unwrap();
}

/// Strips a legal-entity suffix catalog, "All Rights Reserved", year
/// ranges and non-alphanumerics, then collapses whitespace and lowercases —
/// mirrors `EntityMatcher._normalize_name` in the original.
pub fn normalize_name(name: &str) -> String {
    let mut s = STOPWORD_SUFFIX_RE.replace(name, "").to_string();
    s = YEAR_RANGE_RE.replace_all(&s, "").to_string();

    let lower = s.to_lowercase();
    let mut stripped = lower.clone();
    for suffix in LEGAL_SUFFIXES {
        let pattern = format!(r"(?i)\b{}\s*$", regex::escape(suffix));
        if let Ok(re) = Regex::new(&pattern) {
            stripped = re.replace(&stripped, "").to_string();
        }
    }

    let cleaned = NON_ALNUM_RE.replace_all(&stripped, " ").to_string();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ").trim().to_string()
}

fn full_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Best-substring match: slides a `len(shorter)`-sized window across the
/// longer string and keeps the highest Levenshtein ratio, matching
/// fuzzywuzzy's `partial_ratio`.
fn partial_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let short_chars: Vec<char> = shorter.chars().collect();
    let long_chars: Vec<char> = longer.chars().collect();
    if long_chars.len() <= short_chars.len() {
        return full_ratio(a, b);
    }

    let mut best = 0.0f64;
    for start in 0..=(long_chars.len() - short_chars.len()) {
        let window: String = long_chars[start..start + short_chars.len()].iter().collect();
        let ratio = full_ratio(shorter, &window);
        if ratio > best {
            best = ratio;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut words: Vec<&str> = s.split_whitespace().collect();
    words.sort_unstable();
    words.join(" ")
}

fn token_sort_ratio(a: &str, b: &str) -> f64 {
    full_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Token-set ratio: compares the intersection plus each side's unique
/// remainder, taking the best of three combinations — matches
/// fuzzywuzzy's `token_set_ratio`.
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();

    let intersection: Vec<&str> = {
        let mut v: Vec<&str> = set_a.intersection(&set_b).copied().collect();
        v.sort_unstable();
        v
    };
    let only_a: Vec<&str> = {
        let mut v: Vec<&str> = set_a.difference(&set_b).copied().collect();
        v.sort_unstable();
        v
    };
    let only_b: Vec<&str> = {
        let mut v: Vec<&str> = set_b.difference(&set_a).copied().collect();
        v.sort_unstable();
        v
    };

    let inter_str = intersection.join(" ");
    let combined_a = if only_a.is_empty() {
        inter_str.clone()
    } else {
        format!("{} {}", inter_str, only_a.join(" ")).trim().to_string()
    };
    let combined_b = if only_b.is_empty() {
        inter_str.clone()
    } else {
        format!("{} {}", inter_str, only_b.join(" ")).trim().to_string()
    };

    full_ratio(&inter_str, &combined_a)
        .max(full_ratio(&inter_str, &combined_b))
        .max(full_ratio(&combined_a, &combined_b))
}

/// Weighted blend of the four ratios (spec.md section 4.8: 0.2/0.2/0.3/0.3).
pub fn similarity_score(a: &str, b: &str) -> f64 {
    let na = normalize_name(a);
    let nb = normalize_name(b);
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }
    0.2 * full_ratio(&na, &nb) + 0.2 * partial_ratio(&na, &nb) + 0.3 * token_sort_ratio(&na, &nb) + 0.3 * token_set_ratio(&na, &nb)
}

pub fn status_for_score(score: f64, has_candidates: bool) -> MatchStatus {
    if !has_candidates {
        return MatchStatus::NoMatch;
    }
    if score >= 80.0 {
        MatchStatus::Match
    } else if score >= 60.0 {
        MatchStatus::PartialMatch
    } else {
        MatchStatus::Mismatch
    }
}

/// Extracts every candidate legal/display name visible on the crawled
/// site: homepage `og:site_name`, page titles (left of `-`/`|`), footer
/// copyright notices, and Terms-of-Service "operated by" language.
pub fn extract_candidate_names(graph: &NormalizedPageGraph, extracted_business_name: Option<&str>) -> Vec<(String, String)> {
    let mut candidates: Vec<(String, String)> = Vec::new();

    if let Some(name) = extracted_business_name {
        if !name.trim().is_empty() {
            candidates.push((name.trim().to_string(), "scan_provided".to_string()));
        }
    }

    for page in graph.all_pages() {
        if let Some(site_name) = extract_meta_site_name(&page.html) {
            candidates.push((site_name, "og:site_name".to_string()));
        }
        if let Some(title) = &page.title {
            if let Some(first) = title.split(['-', '|']).next() {
                let trimmed = first.trim();
                if trimmed.len() > 2 {
                    candidates.push((trimmed.to_string(), "page_title".to_string()));
                }
            }
        }
        for m in COPYRIGHT_RE.captures_iter(&page.visible_text) {
            candidates.push((m[1].trim().to_string(), "footer_copyright".to_string()));
        }
        if page.page_type == PageType::TermsConditions {
            for m in OPERATED_BY_RE.captures_iter(&page.visible_text) {
                candidates.push((m[1].trim().to_string(), "terms_operated_by".to_string()));
            }
        }
    }

    candidates.retain(|(name, _)| !normalize_name(name).is_empty());
    candidates
}

fn extract_meta_site_name(html: &str) -> Option<String> {
    let document = scraper::Html::parse_document(html);
    let selector = scraper::Selector::parse(r#"meta[property="og:site_name"]"#).ok()?;
    document
        .select(&selector)
        .next()?
        .value()
        .attr("content")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Matches `declared_name`/`declared_address` against every candidate
/// extracted from the crawl, keeping the single best-scoring name.
pub fn match_entity(
    declared_name: &str,
    declared_address: &str,
    graph: &NormalizedPageGraph,
    extracted_business_name: Option<&str>,
) -> EntityMatchResult {
    let candidates = extract_candidate_names(graph, extracted_business_name);
    let extracted_names: Vec<String> = candidates.iter().map(|(n, _)| n.clone()).collect();
    let extraction_sources: Vec<String> = candidates.iter().map(|(_, s)| s.clone()).collect();

    let mut best_match: Option<String> = None;
    let mut best_score = 0.0f64;
    for (name, _) in &candidates {
        let score = similarity_score(declared_name, name);
        if score > best_score {
            best_score = score;
            best_match = Some(name.clone());
        }
    }

    let match_status = status_for_score(best_score, !candidates.is_empty());

    let address_match = extract_addresses(graph).into_iter().max_by(|a, b| {
        similarity_score(declared_address, a)
            .partial_cmp(&similarity_score(declared_address, b))
            .unwrap_or(std::cmp::Ordering::Equal)
    }).map(|best_addr| {
        let score = similarity_score(declared_address, &best_addr);
        AddressMatch {
            declared: declared_address.to_string(),
            best_match: Some(best_addr),
            score,
            status: status_for_score(score, true),
        }
    });

    EntityMatchResult {
        declared_name: declared_name.to_string(),
        extracted_names,
        best_match,
        match_score: (best_score * 10.0).round() / 10.0,
        match_status,
        address_match,
        extraction_sources,
    }
}

/// Very small address extraction: looks for a `<address>` tag or a
/// footer/contact block containing a street-number pattern. Good enough
/// for comparison purposes; full postal parsing is out of scope.
fn extract_addresses(graph: &NormalizedPageGraph) -> Vec<String> {
    lazy_static! {
        static ref STREET_RE: Regex = Regex::new(r"(?i)\b\d{1,6}\s+[A-Za-z0-9.'\- ]{3,60},").unwrap();
    }
    let mut addresses = Vec::new();
    for page in graph.all_pages() {
        if matches!(page.page_type, PageType::Contact | PageType::About | PageType::Home) {
            for m in STREET_RE.find_iter(&page.visible_text) {
                addresses.push(m.as_str().trim_end_matches(',').to_string());
            }
        }
    }
    addresses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_legal_suffixes_and_punctuation() {
        assert_eq!(normalize_name("Acme Solutions Pvt. Ltd."), "acme solutions");
        assert_eq!(normalize_name("Beta Corp, LLC"), "beta");
    }

    #[test]
    fn identical_names_score_100() {
        let score = similarity_score("Acme Solutions Pvt Ltd", "Acme Solutions Private Limited");
        assert!(score >= 99.0, "expected near-100, got {score}");
    }

    #[test]
    fn mismatched_names_score_low() {
        let score = similarity_score("Acme Solutions Pvt Ltd", "Beta Corp");
        assert!(score < 60.0, "expected a mismatch, got {score}");
    }

    #[test]
    fn status_thresholds_match_spec() {
        assert_eq!(status_for_score(85.0, true), MatchStatus::Match);
        assert_eq!(status_for_score(70.0, true), MatchStatus::PartialMatch);
        assert_eq!(status_for_score(40.0, true), MatchStatus::Mismatch);
        assert_eq!(status_for_score(0.0, false), MatchStatus::NoMatch);
    }
}
