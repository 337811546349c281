//! KYC decision output types.
//!
//! Grounded on `kyc_site_scan/decision_rules.py` and
//! `models/output_schema.py::{KYCDecisionEnum, ReasonCode, KYCDecisionOutput}`.

use serde::{Deserialize, Serialize};

use super::audit::AuditTrail;
use super::checkout::CheckoutFlowResult;
use super::compliance::ComplianceBreakdown;
use super::content_risk::ContentRiskSummary;
use super::entity::EntityMatchResult;
use super::policy::PolicyCheckResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Pass,
    Fail,
    Escalate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReasonSeverity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCategory {
    Accessibility,
    Policy,
    ContentRisk,
    Checkout,
    Entity,
    Product,
    Contact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonCode {
    pub code: String,
    pub category: ReasonCategory,
    pub severity: ReasonSeverity,
    pub message: String,
    pub evidence_url: Option<String>,
    pub evidence_snippet: Option<String>,
    pub is_auto_fail: bool,
    pub is_auto_escalate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductMatchStatus {
    Match,
    PartialMatch,
    Mismatch,
    UnableToVerify,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KYCDecisionOutput {
    pub decision: Decision,
    pub reason_codes: Vec<ReasonCode>,
    pub summary: String,
    pub confidence_score: f64,
    pub policy_checks: Vec<PolicyCheckResult>,
    pub checkout_flow: Option<CheckoutFlowResult>,
    pub entity_match: Option<EntityMatchResult>,
    pub compliance_score: Option<ComplianceBreakdown>,
    pub detected_business_type: Option<String>,
    pub detected_mcc: Option<String>,
    pub product_match_status: Option<ProductMatchStatus>,
    pub content_risk_summary: Option<ContentRiskSummary>,
    pub audit_trail: AuditTrail,
    pub scan_version: String,
}
