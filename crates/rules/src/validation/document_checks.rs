//! YAML document checks: unknown names first, then full rule construction.

use eligibility_core::Attribute;
use serde_yaml::Value;

use crate::error::RuleConfigError;
use crate::schema::{ActionKind, EligibilityRule, OpdService, Operator, RuleDocument};

use super::fuzzy::suggest;
use super::ValidationResult;

/// Validate one YAML document, returning the rule when it is valid.
pub(super) fn validate_document(yaml: &str, result: &mut ValidationResult) -> Option<EligibilityRule> {
    let value: Value = match serde_yaml::from_str(yaml) {
        Ok(v) => v,
        Err(e) => {
            result.error("", format!("YAML parse error: {e}"));
            return None;
        }
    };

    check_names(&value, result);
    if !result.valid {
        return None;
    }

    let doc: RuleDocument = match serde_yaml::from_value(value) {
        Ok(doc) => doc,
        Err(e) => {
            result.error("", format!("invalid rule document: {e}"));
            return None;
        }
    };

    match EligibilityRule::new(doc) {
        Ok(rule) => Some(rule),
        Err(e) => {
            result.error(error_path(&e), e.to_string());
            None
        }
    }
}

/// Unknown parameter, operator, action, and service names, with suggestions.
fn check_names(value: &Value, result: &mut ValidationResult) {
    let conditions = value.get("conditions").and_then(Value::as_sequence);
    for (i, condition) in conditions.into_iter().flatten().enumerate() {
        if let Some(parameter) = condition.get("parameter").and_then(Value::as_str) {
            let known = Attribute::ALL.iter().map(|a| a.as_str());
            if !Attribute::ALL.iter().any(|a| a.as_str() == parameter) {
                result.error_with_suggestion(
                    format!("conditions[{i}].parameter"),
                    format!("unknown parameter '{parameter}'"),
                    suggest(parameter, known),
                );
            }
        }
        if let Some(operator) = condition.get("operator").and_then(Value::as_str) {
            if !Operator::ALL.iter().any(|o| o.as_str() == operator) {
                result.error_with_suggestion(
                    format!("conditions[{i}].operator"),
                    format!("unknown operator '{operator}'"),
                    suggest(operator, Operator::ALL.iter().map(|o| o.as_str())),
                );
            }
        }
    }

    let actions = value.get("actions").and_then(Value::as_sequence);
    for (i, action) in actions.into_iter().flatten().enumerate() {
        if let Some(kind) = action.get("type").and_then(Value::as_str) {
            if !ActionKind::ALL.iter().any(|k| k.as_str() == kind) {
                result.error_with_suggestion(
                    format!("actions[{i}].type"),
                    format!("unknown action type '{kind}'"),
                    suggest(kind, ActionKind::ALL.iter().map(|k| k.as_str())),
                );
            }
        }
        if let Some(service) = action.get("service").and_then(Value::as_str) {
            let known = service == "vision_care"
                || OpdService::ALL.iter().any(|s| s.as_str() == service);
            if !known {
                result.error_with_suggestion(
                    format!("actions[{i}].service"),
                    format!("unknown OPD service '{service}'"),
                    suggest(service, OpdService::ALL.iter().map(|s| s.as_str())),
                );
            }
        }
    }
}

fn error_path(error: &RuleConfigError) -> String {
    match error {
        RuleConfigError::EmptyId => "metadata.id".to_string(),
        RuleConfigError::EmptyConditions { .. } => "conditions".to_string(),
        RuleConfigError::EmptyActions { .. } => "actions".to_string(),
        RuleConfigError::Condition { index, .. } => format!("conditions[{index}]"),
        RuleConfigError::Action { index, .. } => format!("actions[{index}]"),
        RuleConfigError::InvalidEffectiveRange { .. } => "effective".to_string(),
        RuleConfigError::UnknownKind(_) => "kind".to_string(),
        RuleConfigError::UnsupportedApiVersion(_) => "apiVersion".to_string(),
        RuleConfigError::IncompatibleOperator { .. }
        | RuleConfigError::ValueShape { .. }
        | RuleConfigError::ValueType { .. }
        | RuleConfigError::EmptyList { .. }
        | RuleConfigError::InvalidRange { .. }
        | RuleConfigError::DuplicateRuleId(_) => String::new(),
    }
}
