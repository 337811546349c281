//! Dictionary-keyword Merchant Category Code classification (C11).
//!
//! Grounded on spec.md section 4.11 (hierarchical MCC catalog,
//! `confidence = min(score * 15, 100)`, `MIN_CONFIDENCE_THRESHOLD = 30.0`).

use crate::model::{MccClassificationResult, MccMatch, NormalizedPageGraph};

pub const MIN_CONFIDENCE_THRESHOLD: f64 = 30.0;

struct MccEntry {
    category: &'static str,
    subcategory: &'static str,
    code: &'static str,
    keywords: &'static [&'static str],
}

static MCC_CATALOG: &[MccEntry] = &[
    MccEntry {
        category: "Retail",
        subcategory: "Fashion",
        code: "5651",
        keywords: &["clothing", "apparel", "fashion", "footwear", "accessories", "boutique"],
    },
    MccEntry {
        category: "Retail",
        subcategory: "Groceries",
        code: "5411",
        keywords: &["grocery", "groceries", "supermarket", "fresh produce", "pantry staples"],
    },
    MccEntry {
        category: "Retail",
        subcategory: "Electronics",
        code: "5732",
        keywords: &["electronics", "gadgets", "smartphone", "laptop", "consumer electronics"],
    },
    MccEntry {
        category: "Retail",
        subcategory: "Home",
        code: "5712",
        keywords: &["furniture", "home decor", "home goods", "interior design"],
    },
    MccEntry {
        category: "Services",
        subcategory: "Professional",
        code: "7392",
        keywords: &["consulting", "professional services", "advisory", "agency services"],
    },
    MccEntry {
        category: "Services",
        subcategory: "Financial",
        code: "6012",
        keywords: &["banking", "loans", "financial services", "payment processing", "insurance"],
    },
    MccEntry {
        category: "Services",
        subcategory: "Education",
        code: "8299",
        keywords: &["courses", "education", "online learning", "tutoring", "curriculum"],
    },
    MccEntry {
        category: "Services",
        subcategory: "Health",
        code: "8099",
        keywords: &["healthcare", "telemedicine", "clinic", "wellness", "medical services"],
    },
    MccEntry {
        category: "Travel",
        subcategory: "Booking",
        code: "4722",
        keywords: &["travel agency", "book a flight", "hotel booking", "vacation packages", "itinerary"],
    },
    MccEntry {
        category: "Entertainment",
        subcategory: "Media",
        code: "7829",
        keywords: &["streaming", "movies", "music streaming", "entertainment content", "on-demand video"],
    },
    MccEntry {
        category: "Technology",
        subcategory: "Software",
        code: "5734",
        keywords: &["software", "saas", "api", "cloud platform", "developer tools"],
    },
];

/// Counts keyword occurrences across `combined_text` for one catalog entry,
/// returning the match count and which keywords were seen at least once.
fn count_matches(combined_text: &str, entry: &MccEntry) -> (usize, Vec<String>) {
    let mut count = 0usize;
    let mut matched = Vec::new();
    for kw in entry.keywords {
        let occurrences = combined_text.matches(kw).count();
        if occurrences > 0 {
            count += occurrences;
            matched.push((*kw).to_string());
        }
    }
    (count, matched)
}

/// Classifies the crawled pages against the MCC catalog. Confidence below
/// [`MIN_CONFIDENCE_THRESHOLD`] is kept (not discarded) but flagged
/// `low_confidence`.
pub fn classify(graph: &NormalizedPageGraph) -> MccClassificationResult {
    let pages: Vec<(&str, String)> = graph.all_pages().map(|p| (p.url.as_str(), p.visible_text.to_lowercase())).collect();
    let combined_text = pages.iter().map(|(_, t)| t.as_str()).collect::<Vec<_>>().join(" \n ");

    let mut matches: Vec<MccMatch> = Vec::new();

    for entry in MCC_CATALOG {
        let (score, matched_keywords) = count_matches(&combined_text, entry);
        if score == 0 {
            continue;
        }

        let confidence = (score as f64 * 15.0).min(100.0);
        let evidence_pages: Vec<String> = pages
            .iter()
            .filter(|(_, text)| entry.keywords.iter().any(|kw| text.contains(kw)))
            .map(|(url, _)| url.to_string())
            .collect();

        matches.push(MccMatch {
            category: entry.category.to_string(),
            subcategory: entry.subcategory.to_string(),
            code: entry.code.to_string(),
            confidence,
            low_confidence: confidence < MIN_CONFIDENCE_THRESHOLD,
            matched_keywords,
            evidence_pages,
        });
    }

    matches.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));

    let primary = matches.first().cloned();
    let secondary = matches.get(1).cloned();

    MccClassificationResult {
        primary,
        secondary,
        all_matches: matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PageArtifact, PageType, RenderType, SourceTag};

    fn graph_with_text(text: &str) -> NormalizedPageGraph {
        let mut graph = NormalizedPageGraph::new("https://example.com");
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
    fn classifies_fashion_retailer() {
        let graph = graph_with_text("Shop our latest clothing and apparel collection, free shipping on all fashion accessories.");
        let result = classify(&graph);
        assert_eq!(result.primary.unwrap().subcategory, "Fashion");
    }

    #[test]
    fn low_confidence_below_threshold() {
        let graph = graph_with_text("our furniture is nice");
        let result = classify(&graph);
        let primary = result.primary.unwrap();
        assert!(primary.low_confidence);
    }

    #[test]
    fn no_matches_yields_empty_result() {
        let graph = graph_with_text("a perfectly generic page with no category signals whatsoever");
        let result = classify(&graph);
        assert!(result.primary.is_none());
    }
}
