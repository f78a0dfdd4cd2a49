//! Authoring lint for rules and rule sets.
//!
//! Rules that reach a [`RuleSet`] are already valid, so rule-set checks
//! only produce warnings: things that are legal but probably not what the
//! author meant. [`validate_yaml`] covers the editing loop, turning parse
//! and construction failures into path-addressed errors with suggestions.

mod document_checks;
mod fuzzy;
mod set_checks;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schema::RuleSet;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Path-like location, e.g. `"conditions[0].parameter"`.
    pub path: String,
    pub message: String,
    /// Optional "did you mean" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<&str>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: suggestion.map(|s| format!("did you mean '{s}'?")),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Warnings whose path starts with `prefix`.
    pub fn warnings_at<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a ValidationWarning> + 'a {
        self.warnings.iter().filter(move |w| w.path.starts_with(prefix))
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Lint a rule set. `as_of` enables the expired-rule check.
pub fn validate_rule_set(rules: &RuleSet, as_of: Option<NaiveDate>) -> ValidationResult {
    let mut result = ValidationResult::new();
    if rules.is_empty() {
        result.warn("rules", "rule set is empty; every employee resolves to an empty benefit");
        return result;
    }
    for rule in rules.rules() {
        set_checks::validate_rule(rule, as_of, &mut result);
    }
    set_checks::validate_priority_overlaps(rules, &mut result);
    set_checks::validate_duplicate_names(rules, &mut result);
    result
}

/// Parse a single YAML rule and report every problem found.
pub fn validate_yaml(yaml: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    if let Some(rule) = document_checks::validate_document(yaml, &mut result) {
        set_checks::validate_rule(&rule, None, &mut result);
    }
    result
}
