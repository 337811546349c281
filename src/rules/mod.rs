//! Deterministic decision evaluation (C13): converts every analyzer signal
//! into an ordered set of [`crate::model::ReasonCode`]s and a final
//! [`crate::model::Decision`]. Never consults [`crate::scoring`] to
//! override its own verdict — probabilistic signals may not override
//! deterministic rules in either direction (spec.md section 4.13).

pub mod decision_rules;

pub use decision_rules::{evaluate, DecisionContext};
