//! Legal entity matching result.
//!
//! Grounded on `kyc_site_scan/entity_matcher.py` and
//! `models/output_schema.py::EntityMatchResult`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Match,
    PartialMatch,
    Mismatch,
    NoMatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressMatch {
    pub declared: String,
    pub best_match: Option<String>,
    pub score: f64,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMatchResult {
    pub declared_name: String,
    pub extracted_names: Vec<String>,
    pub best_match: Option<String>,
    pub match_score: f64,
    pub match_status: MatchStatus,
    pub address_match: Option<AddressMatch>,
    pub extraction_sources: Vec<String>,
}
