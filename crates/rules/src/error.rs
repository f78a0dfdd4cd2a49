//! Error taxonomy for rule construction and per-employee evaluation.

use chrono::NaiveDate;
use eligibility_core::{Attribute, AttributeKind, Scalar};
use serde::Serialize;

use crate::schema::Operator;

/// A rule was authored incorrectly. Raised at construction, never at evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleConfigError {
    #[error("rule metadata.id must not be empty")]
    EmptyId,

    #[error("rule '{rule_id}' has no conditions")]
    EmptyConditions { rule_id: String },

    #[error("rule '{rule_id}' has no actions")]
    EmptyActions { rule_id: String },

    #[error("rule '{rule_id}' condition {index}: {source}")]
    Condition {
        rule_id: String,
        index: usize,
        #[source]
        source: Box<RuleConfigError>,
    },

    #[error("rule '{rule_id}' action {index}: {message}")]
    Action {
        rule_id: String,
        index: usize,
        message: String,
    },

    #[error("operator '{operator}' is not valid for {kind} parameter '{parameter}'")]
    IncompatibleOperator {
        parameter: Attribute,
        kind: AttributeKind,
        operator: Operator,
    },

    #[error("operator '{operator}' on '{parameter}' expects {expected}")]
    ValueShape {
        parameter: Attribute,
        operator: Operator,
        expected: &'static str,
    },

    #[error("value {value} cannot be read as {expected} for parameter '{parameter}'")]
    ValueType {
        parameter: Attribute,
        expected: AttributeKind,
        value: Scalar,
    },

    #[error("'{operator}' on '{parameter}' needs a non-empty list")]
    EmptyList {
        parameter: Attribute,
        operator: Operator,
    },

    #[error("between range on '{parameter}' is inverted: {from} > {to}")]
    InvalidRange {
        parameter: Attribute,
        from: Scalar,
        to: Scalar,
    },

    #[error("rule '{rule_id}' effective range ends ({end}) before it starts ({start})")]
    InvalidEffectiveRange {
        rule_id: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("duplicate rule id '{0}' in rule set")]
    DuplicateRuleId(String),

    #[error("unsupported rule kind '{0}' (expected 'EligibilityRule')")]
    UnknownKind(String),

    #[error("unsupported apiVersion '{0}' (expected 'v1')")]
    UnsupportedApiVersion(String),
}

/// Per-employee evaluation failure. Never aborts a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationError {
    #[error("type mismatch on '{parameter}' with '{operator}': {detail}")]
    TypeMismatch {
        parameter: Attribute,
        operator: Operator,
        detail: String,
    },

    #[error("operator '{operator}' is not supported for parameter '{parameter}'")]
    UnsupportedOperator {
        parameter: Attribute,
        operator: Operator,
    },

    #[error("malformed condition on '{parameter}': {detail}")]
    InvalidCondition { parameter: Attribute, detail: String },

    #[error("employee '{employee_id}' has no value for '{parameter}'")]
    MissingField {
        employee_id: String,
        parameter: Attribute,
    },

    #[error(
        "employee '{employee_id}': OPD sublimits total {sublimit_total} but wallet is {wallet}"
    )]
    InvariantViolation {
        employee_id: String,
        wallet: u64,
        sublimit_total: u64,
    },

    #[error("rule '{rule_id}' condition {index}: {source}")]
    Condition {
        rule_id: String,
        index: usize,
        #[source]
        source: Box<EvaluationError>,
    },
}

impl EvaluationError {
    /// Rule that raised the error, when the failure is attributable to one.
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            EvaluationError::Condition { rule_id, .. } => Some(rule_id),
            _ => None,
        }
    }

    /// Short machine-readable label for the error class.
    pub fn label(&self) -> &'static str {
        match self {
            EvaluationError::TypeMismatch { .. } => "type_mismatch",
            EvaluationError::UnsupportedOperator { .. } => "unsupported_operator",
            EvaluationError::InvalidCondition { .. } => "invalid_condition",
            EvaluationError::MissingField { .. } => "missing_field",
            EvaluationError::InvariantViolation { .. } => "invariant_violation",
            EvaluationError::Condition { source, .. } => source.label(),
        }
    }
}
