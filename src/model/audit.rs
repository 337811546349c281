//! Audit trail types.
//!
//! Grounded on `kyc_site_scan/audit_builder.py` and
//! `models/output_schema.py::{CheckRecord, EvidenceSnippet, KeywordTrigger,
//! TimestampRecord, AuditTrailOutput}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
    Flag,
    Review,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Policy,
    ContentRisk,
    Checkout,
    Entity,
    Context,
    Mcc,
    Rdap,
    Accessibility,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRecord {
    pub check_id: String,
    pub check_name: String,
    pub check_type: CheckType,
    pub status: CheckStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub duration_ms: Option<u64>,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceSnippet {
    pub source_url: String,
    pub snippet_text: String,
    pub context: Option<String>,
    pub extraction_method: String,
    pub confidence: f64,
}

impl EvidenceSnippet {
    pub fn rule_based(source_url: impl Into<String>, snippet_text: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            snippet_text: snippet_text.into(),
            context: None,
            extraction_method: "rule_based".to_string(),
            confidence: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordTrigger {
    pub keyword: String,
    pub category: String,
    pub source_url: String,
    pub snippet: String,
    pub severity: String,
    pub intent: String,
    pub page_type: Option<String>,
    pub intent_context: Option<String>,
    pub is_corroborated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampRecord {
    pub event: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrail {
    pub scan_id: String,
    pub scan_started_at: chrono::DateTime<chrono::Utc>,
    pub scan_completed_at: chrono::DateTime<chrono::Utc>,
    pub scan_duration_seconds: f64,
    pub target_url: String,
    pub final_url: String,
    pub urls_visited: Vec<String>,
    pub pages_scanned: usize,
    pub checks_performed: Vec<CheckRecord>,
    pub keywords_triggered: Vec<KeywordTrigger>,
    pub text_snippets: Vec<EvidenceSnippet>,
    pub timestamps: Vec<TimestampRecord>,
    pub raw_scan_reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_based_snippet_defaults() {
        let snippet = EvidenceSnippet::rule_based("https://example.com", "some text");
        assert_eq!(snippet.extraction_method, "rule_based");
        assert_eq!(snippet.confidence, 1.0);
        assert!(snippet.context.is_none());
    }
}
