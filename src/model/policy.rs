//! Policy check result types.
//!
//! Grounded on `kyc_site_scan/models/output_schema.py::PolicyCheckResult`
//! and the unified `POLICY_PAGE_SET` resolution in SPEC_FULL.md section 9.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    PrivacyPolicy,
    TermsConditions,
    RefundPolicy,
    ShippingDelivery,
    ContactUs,
    AboutUs,
    Faq,
}

impl PolicyType {
    /// The four types scored by the compliance engine's Policy sub-score
    /// and matched by the decision rules' intent-suppression check — the
    /// unified `POLICY_PAGE_SET` from SPEC_FULL.md section 9.
    pub fn is_policy_page_set(self) -> bool {
        matches!(
            self,
            PolicyType::PrivacyPolicy
                | PolicyType::TermsConditions
                | PolicyType::RefundPolicy
                | PolicyType::ShippingDelivery
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyExpectation {
    Required,
    Optional,
    NotApplicable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyCheckResult {
    pub policy_type: PolicyType,
    pub found: bool,
    pub url: Option<String>,
    pub content_length: Option<usize>,
    pub has_required_keywords: bool,
    pub expectation: PolicyExpectation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_page_set_matches_unified_four() {
        assert!(PolicyType::PrivacyPolicy.is_policy_page_set());
        assert!(PolicyType::TermsConditions.is_policy_page_set());
        assert!(PolicyType::RefundPolicy.is_policy_page_set());
        assert!(PolicyType::ShippingDelivery.is_policy_page_set());
        assert!(!PolicyType::ContactUs.is_policy_page_set());
        assert!(!PolicyType::Faq.is_policy_page_set());
    }
}
