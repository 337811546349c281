//! Content risk types.
//!
//! Grounded on `market_research_agent/analyzers/content_analyzer.py`
//! (`RESTRICTED_KEYWORDS`, `_match_keyword`, `analyze_content_risk`) and
//! `kyc_site_scan/models/output_schema.py::KeywordTrigger`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Classification of why a restricted keyword appeared: actually promoting
/// the restricted activity, describing it as prohibited (e.g. in an
/// acceptable-use policy), or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Prohibitive,
    Promotional,
    Neutral,
}

impl Default for Intent {
    fn default() -> Self {
        Intent::Neutral
    }
}

/// One restricted-keyword hit, with enough context for a human reviewer and
/// for the intent-aware suppression rules in the compliance scorer and
/// decision rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestrictedKeywordHit {
    pub keyword: String,
    pub category: String,
    pub source_url: String,
    pub snippet: String,
    pub severity: Severity,
    pub intent: Intent,
    pub page_type: Option<String>,
    pub intent_context: Option<String>,
    pub is_corroborated: bool,
}

/// Aggregate content-risk summary surfaced on the final decision output.
/// Grounded on `KYCDecisionOutput.content_risk_summary` in the original.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentRiskSummary {
    pub total_keywords_found: usize,
    pub risk_contributing_count: usize,
    pub policy_mentions_count: usize,
    pub corroborated_categories: Vec<String>,
    pub pages_analyzed: usize,
    pub high_risk_categories: Vec<String>,
    pub medium_risk_categories: Vec<String>,
    pub dummy_content_detected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_defaults_to_neutral() {
        assert_eq!(Intent::default(), Intent::Neutral);
    }

    #[test]
    fn severity_orders_by_escalation() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }
}
