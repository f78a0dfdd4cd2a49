//! Filesystem rule loader.
//!
//! Scans the rules directory for YAML documents, validates each into an
//! [`EligibilityRule`](crate::schema::EligibilityRule), and assembles a
//! [`RuleSet`](crate::schema::RuleSet) in path order. A single broken file
//! rejects the whole set so no roster is evaluated against a partial rule set.

mod core;
mod error;

#[cfg(test)]
mod tests;

pub use self::core::{parse_rule, RuleLoader};
pub use self::error::{LoadError, LoadResult, LoadStatus, Result};
