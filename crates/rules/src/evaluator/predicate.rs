//! Condition predicate: one typed comparison against an employee snapshot.

use std::cmp::Ordering;

use chrono::NaiveDate;
use eligibility_core::{AttributeKind, EmployeeProfile, MissingFieldPolicy, Scalar};

use crate::error::EvaluationError;
use crate::schema::{compare_scalars, Condition, ConditionValue, Operator};

// ── Condition evaluation ────────────────────────────────────────────

/// Evaluate one condition against an employee profile.
///
/// Operator/parameter compatibility is checked before the attribute is
/// looked up, so a misconfigured condition fails even for employees that
/// lack the attribute. A missing attribute yields `false` under
/// [`MissingFieldPolicy::NoMatch`], including for negative operators.
pub fn evaluate_condition(
    condition: &Condition,
    employee: &EmployeeProfile,
    as_of: NaiveDate,
    policy: MissingFieldPolicy,
) -> Result<bool, EvaluationError> {
    let parameter = condition.parameter;
    let operator = condition.operator;
    let kind = parameter.kind();

    if !operator.supports(kind) {
        return Err(match kind {
            AttributeKind::Text => EvaluationError::TypeMismatch {
                parameter,
                operator,
                detail: format!("{} parameters are not ordinal", kind),
            },
            AttributeKind::Numeric | AttributeKind::Date => {
                EvaluationError::UnsupportedOperator {
                    parameter,
                    operator,
                }
            }
        });
    }

    let actual = match employee.attribute(parameter, as_of) {
        Some(value) => value,
        None => {
            return match policy {
                MissingFieldPolicy::NoMatch => Ok(false),
                MissingFieldPolicy::Error => Err(EvaluationError::MissingField {
                    employee_id: employee.id.clone(),
                    parameter,
                }),
            }
        }
    };

    let expect = |value: &Scalar| -> Result<Scalar, EvaluationError> {
        value
            .coerce_to(kind)
            .ok_or_else(|| EvaluationError::TypeMismatch {
                parameter,
                operator,
                detail: format!("value {} is not {}", value, kind),
            })
    };

    match (operator, &condition.value) {
        (Operator::Equals, ConditionValue::Scalar(v)) => Ok(scalars_equal(&actual, &expect(v)?)),
        (Operator::NotEquals, ConditionValue::Scalar(v)) => {
            Ok(!scalars_equal(&actual, &expect(v)?))
        }
        (Operator::GreaterThan, ConditionValue::Scalar(v)) => {
            Ok(compare_scalars(&actual, &expect(v)?) == Some(Ordering::Greater))
        }
        (Operator::LessThan, ConditionValue::Scalar(v)) => {
            Ok(compare_scalars(&actual, &expect(v)?) == Some(Ordering::Less))
        }
        (Operator::Contains, ConditionValue::Scalar(v)) => {
            let needle = match expect(v)? {
                Scalar::Text(s) => s.trim().to_lowercase(),
                other => other.to_string(),
            };
            if needle.is_empty() {
                return Err(EvaluationError::InvalidCondition {
                    parameter,
                    detail: "contains needs a non-empty substring".to_string(),
                });
            }
            Ok(normalize(&actual).contains(&needle))
        }
        (Operator::InList | Operator::NotInList, ConditionValue::List(values)) => {
            if values.is_empty() {
                return Err(EvaluationError::InvalidCondition {
                    parameter,
                    detail: format!("'{}' needs a non-empty list", operator),
                });
            }
            let mut found = false;
            for v in values {
                if scalars_equal(&actual, &expect(v)?) {
                    found = true;
                    break;
                }
            }
            Ok(if operator == Operator::InList { found } else { !found })
        }
        (Operator::Between, ConditionValue::Range { from, to }) => {
            let from = expect(from)?;
            let to = expect(to)?;
            if compare_scalars(&from, &to) == Some(Ordering::Greater) {
                return Err(EvaluationError::InvalidCondition {
                    parameter,
                    detail: format!("between range is inverted: {} > {}", from, to),
                });
            }
            let above = matches!(
                compare_scalars(&actual, &from),
                Some(Ordering::Greater | Ordering::Equal)
            );
            let below = matches!(
                compare_scalars(&actual, &to),
                Some(Ordering::Less | Ordering::Equal)
            );
            Ok(above && below)
        }
        (_, value) => Err(EvaluationError::TypeMismatch {
            parameter,
            operator,
            detail: format!("unexpected value shape {}", shape_name(value)),
        }),
    }
}

/// Type-aware equality: case-insensitive for text, exact otherwise.
fn scalars_equal(a: &Scalar, b: &Scalar) -> bool {
    match (a, b) {
        (Scalar::Text(x), Scalar::Text(y)) => x.trim().to_lowercase() == y.trim().to_lowercase(),
        (Scalar::Number(x), Scalar::Number(y)) => x == y,
        (Scalar::Date(x), Scalar::Date(y)) => x == y,
        _ => false,
    }
}

fn normalize(value: &Scalar) -> String {
    match value {
        Scalar::Text(s) => s.trim().to_lowercase(),
        other => other.to_string(),
    }
}

fn shape_name(value: &ConditionValue) -> &'static str {
    match value {
        ConditionValue::List(_) => "list",
        ConditionValue::Range { .. } => "range",
        ConditionValue::Scalar(_) => "scalar",
    }
}

// ── Tests ───────────────────────────────────────────────────────────
