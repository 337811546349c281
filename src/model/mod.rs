//! Data model types shared across the crawl, analyzer, scoring, rules and
//! audit subsystems. Every type here is a plain, serde-derivable record —
//! no duck-typed maps cross module boundaries (see DESIGN.md, Design Notes).

pub mod audit;
pub mod checkout;
pub mod compliance;
pub mod content_risk;
pub mod context;
pub mod decision;
pub mod entity;
pub mod graph;
pub mod mcc;
pub mod merchant;
pub mod page;
pub mod policy;
pub mod robots;

pub use audit::{AuditTrail, CheckRecord, CheckStatus, CheckType, EvidenceSnippet, KeywordTrigger, TimestampRecord};
pub use checkout::CheckoutFlowResult;
pub use compliance::{ComplianceBreakdown, Rating, ScoreComponent, ScoreSection};
pub use content_risk::{ContentRiskSummary, Intent, RestrictedKeywordHit, Severity};
pub use context::{BusinessContext, BusinessContextType, ContextAlternative, ContextStatus, FrontendSurface};
pub use decision::{Decision, KYCDecisionOutput, ProductMatchStatus, ReasonCategory, ReasonCode, ReasonSeverity};
pub use entity::{AddressMatch, EntityMatchResult, MatchStatus};
pub use graph::{CrawlMetadata, NormalizedPageGraph};
pub use mcc::{MccClassificationResult, MccMatch};
pub use merchant::{MerchantInputError, MerchantKYCInput, OptionalMerchantData, RiskTier};
pub use page::{CrawlError, CrawlErrorKind, ExtractedLink, PageArtifact, PageType, RenderType, SourceTag};
pub use policy::{PolicyCheckResult, PolicyExpectation, PolicyType};
pub use robots::RobotsRules;
