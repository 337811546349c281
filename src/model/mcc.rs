//! Merchant Category Code (MCC) classification result types.
//!
//! Grounded on spec.md section 4.11 prose (dictionary-keyword MCC
//! classification); no standalone `mcc_classifier.py` was retrieved in the
//! pack.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MccMatch {
    pub category: String,
    pub subcategory: String,
    pub code: String,
    pub confidence: f64,
    pub low_confidence: bool,
    pub matched_keywords: Vec<String>,
    pub evidence_pages: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MccClassificationResult {
    pub primary: Option<MccMatch>,
    pub secondary: Option<MccMatch>,
    pub all_matches: Vec<MccMatch>,
}
