//! Condition types: parameter, operator, and value.

use std::cmp::Ordering;
use std::fmt;

use eligibility_core::{Attribute, AttributeKind, Scalar};
use serde::{Deserialize, Serialize};

use crate::error::RuleConfigError;

// ── Operators ───────────────────────────────────────────────────────

/// Comparison operators available to conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    InList,
    NotInList,
    Between,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::Contains,
        Operator::InList,
        Operator::NotInList,
        Operator::Between,
    ];

    /// Whether the operator needs an ordered value type.
    pub fn is_ordinal(&self) -> bool {
        matches!(
            self,
            Operator::GreaterThan | Operator::LessThan | Operator::Between
        )
    }

    /// Whether the operator is defined for values of `kind`.
    pub fn supports(&self, kind: AttributeKind) -> bool {
        match kind {
            AttributeKind::Text => !self.is_ordinal(),
            AttributeKind::Numeric | AttributeKind::Date => *self != Operator::Contains,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::Contains => "contains",
            Operator::InList => "in_list",
            Operator::NotInList => "not_in_list",
            Operator::Between => "between",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule combines its conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicOperator {
    #[default]
    And,
    Or,
}

// ── Values ──────────────────────────────────────────────────────────

/// Right-hand side of a condition: one value, a set, or an inclusive range.
///
/// `List` is tried before `Range` because a struct variant would also accept
/// a two-element sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    List(Vec<Scalar>),
    Range { from: Scalar, to: Scalar },
    Scalar(Scalar),
}

impl ConditionValue {
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        ConditionValue::Scalar(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        ConditionValue::List(values.into_iter().map(Into::into).collect())
    }

    pub fn range(from: impl Into<Scalar>, to: impl Into<Scalar>) -> Self {
        ConditionValue::Range {
            from: from.into(),
            to: to.into(),
        }
    }
}

// ── Condition ───────────────────────────────────────────────────────

/// One typed comparison against an employee attribute.
///
/// A condition read straight from YAML is unchecked; rule construction runs
/// [`Condition::validated`] so conditions inside an `EligibilityRule` always
/// have an operator legal for the parameter and a value of the right shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    pub parameter: Attribute,
    pub operator: Operator,
    pub value: ConditionValue,
}

impl Condition {
    /// Build and validate a condition.
    pub fn new(
        parameter: Attribute,
        operator: Operator,
        value: ConditionValue,
    ) -> Result<Self, RuleConfigError> {
        Condition {
            parameter,
            operator,
            value,
        }
        .validated()
    }

    /// Check operator/parameter compatibility and value arity, coercing
    /// scalars to the parameter's declared type.
    pub fn validated(self) -> Result<Self, RuleConfigError> {
        let parameter = self.parameter;
        let operator = self.operator;
        let kind = parameter.kind();

        if !operator.supports(kind) {
            return Err(RuleConfigError::IncompatibleOperator {
                parameter,
                kind,
                operator,
            });
        }

        let coerce = |value: &Scalar| -> Result<Scalar, RuleConfigError> {
            value
                .coerce_to(kind)
                .ok_or_else(|| RuleConfigError::ValueType {
                    parameter,
                    expected: kind,
                    value: value.clone(),
                })
        };

        let range = |from: &Scalar, to: &Scalar| -> Result<ConditionValue, RuleConfigError> {
            let from = coerce(from)?;
            let to = coerce(to)?;
            if compare_scalars(&from, &to) == Some(Ordering::Greater) {
                return Err(RuleConfigError::InvalidRange {
                    parameter,
                    from,
                    to,
                });
            }
            Ok(ConditionValue::Range { from, to })
        };

        let value = match (operator, &self.value) {
            (Operator::InList | Operator::NotInList, ConditionValue::List(values)) => {
                if values.is_empty() {
                    return Err(RuleConfigError::EmptyList {
                        parameter,
                        operator,
                    });
                }
                ConditionValue::List(values.iter().map(coerce).collect::<Result<_, _>>()?)
            }
            (Operator::InList | Operator::NotInList, _) => {
                return Err(RuleConfigError::ValueShape {
                    parameter,
                    operator,
                    expected: "a list of values",
                });
            }
            (Operator::Between, ConditionValue::Range { from, to }) => range(from, to)?,
            // `[from, to]` is shorthand for `{from, to}`.
            (Operator::Between, ConditionValue::List(bounds)) if bounds.len() == 2 => {
                range(&bounds[0], &bounds[1])?
            }
            (Operator::Between, _) => {
                return Err(RuleConfigError::ValueShape {
                    parameter,
                    operator,
                    expected: "a {from, to} range or a [from, to] pair",
                });
            }
            (Operator::Contains, ConditionValue::Scalar(value)) => {
                let value = coerce(value)?;
                if matches!(&value, Scalar::Text(s) if s.trim().is_empty()) {
                    return Err(RuleConfigError::ValueShape {
                        parameter,
                        operator,
                        expected: "a non-empty substring",
                    });
                }
                ConditionValue::Scalar(value)
            }
            (_, ConditionValue::Scalar(value)) => ConditionValue::Scalar(coerce(value)?),
            (_, _) => {
                return Err(RuleConfigError::ValueShape {
                    parameter,
                    operator,
                    expected: "a single value",
                });
            }
        };

        Ok(Condition {
            parameter,
            operator,
            value,
        })
    }
}

/// Order two scalars of the same kind; `None` for mixed kinds, text, or NaN.
pub fn compare_scalars(a: &Scalar, b: &Scalar) -> Option<Ordering> {
    match (a, b) {
        (Scalar::Number(x), Scalar::Number(y)) => x.partial_cmp(y),
        (Scalar::Date(x), Scalar::Date(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
