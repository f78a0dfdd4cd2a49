//! Rule matching: activation window plus AND/OR over condition predicates.
//!
//! A rule is checked in two stages:
//! - **Gate**: the rule must be active and `as_of` must fall inside its
//!   effective range (inclusive). Failing the gate skips the conditions.
//! - **Conditions**: `and` short-circuits on the first false, `or` on the
//!   first true.

mod predicate;

pub use predicate::evaluate_condition;

use chrono::NaiveDate;
use eligibility_core::{EmployeeProfile, MissingFieldPolicy};
use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;
use crate::schema::{EligibilityRule, LogicOperator};

/// Why a rule did or did not match an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleVerdict {
    Matched,
    Inactive,
    OutsideEffectiveRange,
    ConditionsNotMet,
}

// ── Rule evaluator ──────────────────────────────────────────────────

/// Evaluates single rules against employee profiles.
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// Check a rule and report the verdict.
    ///
    /// Condition errors are wrapped with the rule id and condition index.
    pub fn check(
        rule: &EligibilityRule,
        employee: &EmployeeProfile,
        as_of: NaiveDate,
        policy: MissingFieldPolicy,
    ) -> Result<RuleVerdict, EvaluationError> {
        if !rule.is_active() {
            return Ok(RuleVerdict::Inactive);
        }
        if !rule.effective().contains(as_of) {
            return Ok(RuleVerdict::OutsideEffectiveRange);
        }

        // AND stops at the first false, OR at the first true.
        let stop_on = rule.logic() == LogicOperator::Or;

        for (index, condition) in rule.conditions().iter().enumerate() {
            let hit = evaluate_condition(condition, employee, as_of, policy).map_err(|e| {
                EvaluationError::Condition {
                    rule_id: rule.id().to_string(),
                    index,
                    source: Box::new(e),
                }
            })?;
            if hit == stop_on {
                return Ok(verdict(stop_on));
            }
        }

        Ok(verdict(!stop_on))
    }

    /// Whether the rule applies to the employee on `as_of`.
    pub fn matches(
        rule: &EligibilityRule,
        employee: &EmployeeProfile,
        as_of: NaiveDate,
        policy: MissingFieldPolicy,
    ) -> Result<bool, EvaluationError> {
        Ok(Self::check(rule, employee, as_of, policy)? == RuleVerdict::Matched)
    }
}

fn verdict(matched: bool) -> RuleVerdict {
    if matched {
        RuleVerdict::Matched
    } else {
        RuleVerdict::ConditionsNotMet
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rule(yaml: &str) -> EligibilityRule {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn engineer_aged(age: u32) -> EmployeeProfile {
        EmployeeProfile {
            id: "E1".to_string(),
            department: Some("Engineering".to_string()),
            age: Some(age),
            ..Default::default()
        }
    }

    const TWO_CONDITIONS: &str = r#"
metadata:
  id: eng-senior
  name: Senior engineers
priority: 1
logic: LOGIC
conditions:
  - parameter: department
    operator: equals
    value: Engineering
  - parameter: age
    operator: greater_than
    value: 50
actions:
  - type: assign_benefit_group
    group: Senior
"#;

    fn with_logic(logic: &str) -> EligibilityRule {
        rule(&TWO_CONDITIONS.replace("LOGIC", logic))
    }

    #[test]
    fn and_requires_all_conditions() {
        let r = with_logic("and");
        let policy = MissingFieldPolicy::NoMatch;
        let as_of = date("2024-01-01");

        assert!(RuleEvaluator::matches(&r, &engineer_aged(55), as_of, policy).unwrap());
        assert_eq!(
            RuleEvaluator::check(&r, &engineer_aged(30), as_of, policy).unwrap(),
            RuleVerdict::ConditionsNotMet
        );
    }

    #[test]
    fn or_requires_any_condition() {
        let r = with_logic("or");
        let policy = MissingFieldPolicy::NoMatch;
        let as_of = date("2024-01-01");

        assert!(RuleEvaluator::matches(&r, &engineer_aged(30), as_of, policy).unwrap());

        let mut finance = engineer_aged(30);
        finance.department = Some("Finance".to_string());
        assert!(!RuleEvaluator::matches(&r, &finance, as_of, policy).unwrap());
    }

    #[test]
    fn inactive_rule_short_circuits() {
        let yaml = TWO_CONDITIONS
            .replace("LOGIC", "and")
            .replace("  name: Senior engineers", "  name: Senior engineers\n  enabled: false");
        let r = rule(&yaml);

        let verdict = RuleEvaluator::check(
            &r,
            &engineer_aged(55),
            date("2024-01-01"),
            MissingFieldPolicy::Error,
        )
        .unwrap();
        assert_eq!(verdict, RuleVerdict::Inactive);
    }

    #[test]
    fn effective_range_bounds_are_inclusive() {
        let yaml = TWO_CONDITIONS.replace("LOGIC", "and").replace(
            "priority: 1",
            "priority: 1\neffective:\n  start: 2024-04-01\n  end: 2025-03-31",
        );
        let r = rule(&yaml);
        let emp = engineer_aged(55);
        let policy = MissingFieldPolicy::NoMatch;

        assert!(RuleEvaluator::matches(&r, &emp, date("2024-04-01"), policy).unwrap());
        assert!(RuleEvaluator::matches(&r, &emp, date("2025-03-31"), policy).unwrap());
        assert_eq!(
            RuleEvaluator::check(&r, &emp, date("2025-04-01"), policy).unwrap(),
            RuleVerdict::OutsideEffectiveRange
        );
        assert_eq!(
            RuleEvaluator::check(&r, &emp, date("2024-03-31"), policy).unwrap(),
            RuleVerdict::OutsideEffectiveRange
        );
    }

    #[test]
    fn short_circuit_skips_later_errors() {
        // Missing age would error under the Error policy, but AND stops at
        // the failed department check first.
        let r = with_logic("and");
        let mut emp = engineer_aged(0);
        emp.age = None;
        emp.department = Some("Finance".to_string());

        let verdict =
            RuleEvaluator::check(&r, &emp, date("2024-01-01"), MissingFieldPolicy::Error).unwrap();
        assert_eq!(verdict, RuleVerdict::ConditionsNotMet);

        emp.department = Some("Engineering".to_string());
        let err = RuleEvaluator::check(&r, &emp, date("2024-01-01"), MissingFieldPolicy::Error)
            .unwrap_err();
        assert_eq!(err.rule_id(), Some("eng-senior"));
        assert_eq!(err.label(), "missing_field");
    }
}
