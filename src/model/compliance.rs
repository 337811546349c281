//! Compliance scoring breakdown types.
//!
//! Grounded on `market_research_agent/analyzers/compliance_intelligence.py`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Good,
    Fair,
    Poor,
}

/// One scored line item within a sub-score, matching the original's
/// `breakdown.<section>.details[]` entry shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub name: String,
    pub points: f64,
    pub max_points: f64,
    pub status: String,
    pub reason: String,
    pub signal_reference: Option<String>,
    pub signal_type: Option<String>,
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSection {
    pub score: f64,
    pub max: f64,
    pub components: Vec<ScoreComponent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceBreakdown {
    pub overall_score: u32,
    pub rating: Rating,
    pub technical: ScoreSection,
    pub policy: ScoreSection,
    pub trust: ScoreSection,
}
