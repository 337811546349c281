//! Checkout flow validation result.
//!
//! Grounded on `kyc_site_scan/checkout_validator.py` and
//! `models/output_schema.py::CheckoutFlowResult`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutFlowResult {
    pub has_cta: bool,
    pub cta_clickable: bool,
    pub checkout_reachable: bool,
    pub checkout_url: Option<String>,
    pub checkout_confidence: f64,
    pub pricing_visible: bool,
    pub form_fields_present: bool,
    pub dead_ctas: Vec<String>,
    pub evidence: HashMap<String, String>,
}
