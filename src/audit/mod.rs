//! Append-only audit trail construction (C14).

pub mod builder;

pub use builder::{generate_summary_report, AuditBuilder};
