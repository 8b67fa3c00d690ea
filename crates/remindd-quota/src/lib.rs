//! `remindd-quota` — creation-time quota gate.
//!
//! The creation flow asks [`QuotaEvaluator::can_create`] before persisting a
//! new reminder. A rejection is a normal decision outcome, not an error;
//! only store failures surface as `Err`.

pub mod evaluator;

pub use evaluator::{QuotaDecision, QuotaDenial, QuotaEvaluator};
