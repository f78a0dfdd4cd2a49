//! Rule schema types with serde deserialization.
//!
//! Defines the rule type hierarchy:
//! - `Condition`: one typed comparison against an employee attribute
//! - `Action`: one mutation of a benefit resolution
//! - `EligibilityRule`: validated rule (conditions + actions + priority + window)
//! - `RuleSet`: ordered collection with a stable priority order
//!
//! Rules are authored as `RuleDocument` YAML and only become an
//! `EligibilityRule` after construction-time validation.

mod action;
mod condition;
mod metadata;
mod rule;
mod rule_set;

pub use action::*;
pub use condition::*;
pub use metadata::*;
pub use rule::*;
pub use rule_set::*;
