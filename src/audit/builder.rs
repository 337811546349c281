//! Append-only audit trail builder.
//!
//! Grounded on `kyc_site_scan/audit_builder.py`
//! (`AuditBuilder.add_check`, `.add_keyword_trigger`, `.build`,
//! `.generate_summary_report`).

use chrono::{DateTime, Utc};

use crate::model::{AuditTrail, CheckRecord, CheckStatus, CheckType, EvidenceSnippet, KeywordTrigger, TimestampRecord};

const MAX_KEYWORDS_IN_SUMMARY: usize = 10;

/// Accumulates scan evidence in insertion order and only ever appends
/// (spec.md section 4.14 invariant). `build()` is the single point where
/// the accumulated state is frozen into an [`AuditTrail`].
pub struct AuditBuilder {
    scan_id: String,
    scan_started_at: DateTime<Utc>,
    target_url: String,
    urls_visited: Vec<String>,
    checks_performed: Vec<CheckRecord>,
    keywords_triggered: Vec<KeywordTrigger>,
    text_snippets: Vec<EvidenceSnippet>,
    timestamps: Vec<TimestampRecord>,
    raw_scan_reference: Option<String>,
}

impl AuditBuilder {
    pub fn new(scan_id: impl Into<String>, target_url: impl Into<String>, scan_started_at: DateTime<Utc>) -> Self {
        let mut builder = Self {
            scan_id: scan_id.into(),
            scan_started_at,
            target_url: target_url.into(),
            urls_visited: Vec::new(),
            checks_performed: Vec::new(),
            keywords_triggered: Vec::new(),
            text_snippets: Vec::new(),
            timestamps: Vec::new(),
            raw_scan_reference: None,
        };
        builder.add_timestamp("scan_started", scan_started_at, None);
        builder
    }

    pub fn record_url_visited(&mut self, url: impl Into<String>) {
        self.urls_visited.push(url.into());
    }

    pub fn add_check(&mut self, check_name: impl Into<String>, check_type: CheckType, status: CheckStatus, duration_ms: Option<u64>, details: Option<String>) {
        let check_id = format!("chk_{}_{}", self.checks_performed.len() + 1, self.scan_id);
        self.checks_performed.push(CheckRecord {
            check_id,
            check_name: check_name.into(),
            check_type,
            status,
            timestamp: Utc::now(),
            duration_ms,
            details,
        });
    }

    pub fn add_keyword_trigger(&mut self, trigger: KeywordTrigger) {
        self.keywords_triggered.push(trigger);
    }

    pub fn add_snippet(&mut self, snippet: EvidenceSnippet) {
        self.text_snippets.push(snippet);
    }

    pub fn add_timestamp(&mut self, event: impl Into<String>, at: DateTime<Utc>, details: Option<String>) {
        self.timestamps.push(TimestampRecord { event: event.into(), timestamp: at, details });
    }

    pub fn set_raw_scan_reference(&mut self, reference: impl Into<String>) {
        self.raw_scan_reference = Some(reference.into());
    }

    /// Freezes the accumulated state, attaching crawl completion time,
    /// final URL, and pages-scanned count (spec.md section 4.14).
    pub fn build(mut self, final_url: impl Into<String>, pages_scanned: usize, completed_at: DateTime<Utc>) -> AuditTrail {
        self.add_timestamp("scan_completed", completed_at, None);
        let scan_duration_seconds = (completed_at - self.scan_started_at).num_milliseconds() as f64 / 1000.0;

        AuditTrail {
            scan_id: self.scan_id,
            scan_started_at: self.scan_started_at,
            scan_completed_at: completed_at,
            scan_duration_seconds,
            target_url: self.target_url,
            final_url: final_url.into(),
            urls_visited: self.urls_visited,
            pages_scanned,
            checks_performed: self.checks_performed,
            keywords_triggered: self.keywords_triggered,
            text_snippets: self.text_snippets,
            timestamps: self.timestamps,
            raw_scan_reference: self.raw_scan_reference,
        }
    }
}

/// Renders the same grouped structure as the original's
/// `generate_summary_report`: header, check counts, failed/flagged check
/// detail, keyword triggers (capped), then the full timeline.
pub fn generate_summary_report(trail: &AuditTrail) -> String {
    let mut out = String::new();
    out.push_str(&format!("# KYC Scan Audit Report — {}\n\n", trail.scan_id));
    out.push_str(&format!("Target: {}\n", trail.target_url));
    out.push_str(&format!("Final URL: {}\n", trail.final_url));
    out.push_str(&format!("Duration: {:.1}s\n", trail.scan_duration_seconds));
    out.push_str(&format!("Pages scanned: {}\n\n", trail.pages_scanned));

    let passed = trail.checks_performed.iter().filter(|c| c.status == CheckStatus::Pass).count();
    let failed: Vec<&CheckRecord> = trail.checks_performed.iter().filter(|c| c.status == CheckStatus::Fail).collect();
    let flagged: Vec<&CheckRecord> = trail.checks_performed.iter().filter(|c| c.status == CheckStatus::Flag).collect();

    out.push_str("## Check Summary\n\n");
    out.push_str(&format!("- Passed: {passed}\n"));
    out.push_str(&format!("- Failed: {}\n", failed.len()));
    out.push_str(&format!("- Flagged: {}\n\n", flagged.len()));

    if !failed.is_empty() {
        out.push_str("## Failed Checks\n\n");
        for check in &failed {
            out.push_str(&format!("- **{}** ({:?}): {}\n", check.check_name, check.check_type, check.details.as_deref().unwrap_or("no detail")));
        }
        out.push('\n');
    }

    if !flagged.is_empty() {
        out.push_str("## Flagged Checks\n\n");
        for check in &flagged {
            out.push_str(&format!("- **{}** ({:?}): {}\n", check.check_name, check.check_type, check.details.as_deref().unwrap_or("no detail")));
        }
        out.push('\n');
    }

    if !trail.keywords_triggered.is_empty() {
        out.push_str("## Keyword Triggers\n\n");
        for trigger in trail.keywords_triggered.iter().take(MAX_KEYWORDS_IN_SUMMARY) {
            out.push_str(&format!("- `{}` ({}, {}) on {}: \"{}\"\n", trigger.keyword, trigger.category, trigger.severity, trigger.source_url, trigger.snippet));
        }
        if trail.keywords_triggered.len() > MAX_KEYWORDS_IN_SUMMARY {
            out.push_str(&format!("- ... and {} more\n", trail.keywords_triggered.len() - MAX_KEYWORDS_IN_SUMMARY));
        }
        out.push('\n');
    }

    out.push_str("## Timeline\n\n");
    for event in &trail.timestamps {
        out.push_str(&format!("- {} — {}", event.timestamp.to_rfc3339(), event.event));
        if let Some(details) = &event.details {
            out.push_str(&format!(" ({details})"));
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_computes_duration_and_appends_completion_timestamp() {
        let start = Utc::now();
        let builder = AuditBuilder::new("scan_1", "https://example.com", start);
        let end = start + chrono::Duration::seconds(5);
        let trail = builder.build("https://example.com/", 3, end);

        assert_eq!(trail.pages_scanned, 3);
        assert!((trail.scan_duration_seconds - 5.0).abs() < 0.01);
        assert_eq!(trail.timestamps.len(), 2);
        assert_eq!(trail.timestamps[0].event, "scan_started");
        assert_eq!(trail.timestamps[1].event, "scan_completed");
    }

    #[test]
    fn summary_report_groups_failed_and_flagged_checks() {
        let start = Utc::now();
        let mut builder = AuditBuilder::new("scan_2", "https://example.com", start);
        builder.add_check("privacy_policy_present", CheckType::Policy, CheckStatus::Fail, Some(10), Some("not found".to_string()));
        builder.add_check("ssl_valid", CheckType::Accessibility, CheckStatus::Pass, Some(5), None);
        let trail = builder.build("https://example.com/", 1, Utc::now());

        let report = generate_summary_report(&trail);
        assert!(report.contains("## Failed Checks"));
        assert!(report.contains("privacy_policy_present"));
        assert!(!report.contains("ssl_valid") || report.contains("Passed: 1"));
    }
}
