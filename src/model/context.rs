//! Business context classification types.
//!
//! Grounded on `market_research_agent/analyzers/context_classifier.py`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextStatus {
    Determined,
    LowConfidence,
    Undetermined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrontendSurface {
    FullCommerce,
    MarketingSite,
    AuthGated,
    ContentOnly,
    ApiDocs,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessContextType {
    EcommerceMerchant,
    Marketplace,
    SaasProduct,
    FintechInfrastructure,
    BlockchainInfrastructure,
    ContentMedia,
    DeveloperPlatform,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextAlternative {
    pub context_type: BusinessContextType,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessContext {
    pub primary: BusinessContextType,
    pub status: ContextStatus,
    pub confidence: f64,
    pub frontend_surface: FrontendSurface,
    pub reason: String,
    pub scores: HashMap<String, f64>,
    pub alternatives: Vec<ContextAlternative>,
}
