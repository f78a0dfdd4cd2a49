//! Employee benefit eligibility rule engine.
//!
//! This crate provides:
//! - YAML-based rule definition validated at construction
//! - Condition predicates over employee attribute snapshots
//! - Priority-ordered rule resolution with block short-circuit and an audit trace
//! - Parallel roster evaluation with impact statistics
//! - Filesystem rule loader, rule-set lint, and an in-memory audit log

pub mod actions;
pub mod audit_log;
pub mod bulk;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod notifications;
pub mod resolution;
pub mod resolver;
pub mod schema;
pub mod validation;

pub use bulk::{BulkEvaluator, BulkReport, CancellationToken, ImpactStats};
pub use error::{EvaluationError, RuleConfigError};
pub use resolution::BenefitResolution;
pub use resolver::{EvaluationOutcome, ResolutionState, RuleSetResolver};
pub use schema::{EligibilityRule, RuleSet};
