//! Rule set resolver: evaluates every rule for one employee.
//!
//! Rules are visited in ascending priority (list order among equals). Each
//! matched rule applies its actions through [`crate::actions::apply`], and
//! every step is recorded in an [`EvaluationTrace`].
//!
//! Conflicts are settled per resolution field. The first rule to write a
//! field claims it at its priority; a later action on the same field is
//! applied only when it comes from the same priority (later in list order
//! wins) and is otherwise recorded as shadowed. A `block_eligibility`
//! action stops the walk immediately.
//!
//! State machine: `Pending → Evaluating → Blocked | Resolved`.

mod trace;


pub use trace::{ActionOutcome, ActionRecord, EvaluationTrace, TraceEntry};

use std::collections::BTreeMap;

use chrono::NaiveDate;
use eligibility_core::{EmployeeProfile, EngineConfig, MissingFieldPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::actions;
use crate::error::EvaluationError;
use crate::evaluator::{RuleEvaluator, RuleVerdict};
use crate::notifications::PendingNotification;
use crate::resolution::BenefitResolution;
use crate::schema::{Action, EligibilityRule, ResolutionField, RuleSet};

// ── Outcome ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    Pending,
    Evaluating,
    Blocked,
    Resolved,
}

/// Result of resolving one employee against a rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub employee_id: String,
    pub as_of: NaiveDate,
    /// `Blocked` or `Resolved`.
    pub state: ResolutionState,
    pub resolution: BenefitResolution,
    pub trace: EvaluationTrace,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<PendingNotification>,
    /// Invariant mismatches tolerated because strict mode is off.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EvaluationOutcome {
    pub fn is_blocked(&self) -> bool {
        self.state == ResolutionState::Blocked
    }

    pub fn matched_any(&self) -> bool {
        !self.resolution.matched_rule_ids.is_empty()
    }
}

// ── Resolver ────────────────────────────────────────────────────────

/// Which rule currently owns a resolution field.
#[derive(Debug, Clone)]
struct Claim {
    rule_id: String,
    priority: i32,
}

/// Resolves employees against a borrowed rule set.
#[derive(Debug, Clone, Copy)]
pub struct RuleSetResolver<'a> {
    rules: &'a RuleSet,
    strict_invariants: bool,
    missing_field_policy: MissingFieldPolicy,
}

impl<'a> RuleSetResolver<'a> {
    pub fn new(rules: &'a RuleSet, config: &EngineConfig) -> Self {
        Self {
            rules,
            strict_invariants: config.strict_invariants,
            missing_field_policy: config.missing_field_policy,
        }
    }

    pub fn rules(&self) -> &'a RuleSet {
        self.rules
    }

    /// Resolve one employee as of `as_of`.
    ///
    /// Fails when a condition cannot be evaluated, or in strict mode when the
    /// finished resolution breaks the OPD wallet invariant.
    pub fn resolve(
        &self,
        employee: &EmployeeProfile,
        as_of: NaiveDate,
    ) -> Result<EvaluationOutcome, EvaluationError> {
        let mut state = ResolutionState::Pending;
        transition(&employee.id, &mut state, ResolutionState::Evaluating);

        let mut resolution = BenefitResolution::new(employee.id.clone());
        let mut claims: BTreeMap<ResolutionField, Claim> = BTreeMap::new();
        let mut evaluation_trace = EvaluationTrace::default();
        let mut notifications = Vec::new();

        'rules: for rule in self.rules.by_priority() {
            let verdict =
                RuleEvaluator::check(rule, employee, as_of, self.missing_field_policy)
                    .map_err(|e| {
                        debug!(employee_id = %employee.id, rule_id = %rule.id(), error = %e, "rule check failed");
                        e
                    })?;

            evaluation_trace.push(TraceEntry::RuleCheck {
                rule_id: rule.id().to_string(),
                priority: rule.priority(),
                verdict,
            });
            if verdict != RuleVerdict::Matched {
                continue;
            }

            debug!(employee_id = %employee.id, rule_id = %rule.id(), priority = rule.priority(), "rule matched");
            resolution.matched_rule_ids.push(rule.id().to_string());

            for action in rule.actions() {
                let record = match self.step(rule, action, &mut resolution, &mut claims) {
                    Step::Notify(template) => {
                        notifications.push(PendingNotification {
                            rule_id: rule.id().to_string(),
                            employee_id: employee.id.clone(),
                            template,
                        });
                        ActionOutcome::NotificationQueued
                    }
                    Step::Done(outcome) => outcome,
                };
                evaluation_trace.push(TraceEntry::Action(ActionRecord {
                    rule_id: rule.id().to_string(),
                    priority: rule.priority(),
                    action: action.clone(),
                    outcome: record,
                }));

                if resolution.is_blocked() {
                    transition(&employee.id, &mut state, ResolutionState::Blocked);
                    break 'rules;
                }
            }
        }

        let mut warnings = Vec::new();
        if state != ResolutionState::Blocked {
            if let Err(mismatch) = resolution.check_opd_invariant() {
                if self.strict_invariants {
                    return Err(EvaluationError::InvariantViolation {
                        employee_id: employee.id.clone(),
                        wallet: mismatch.wallet,
                        sublimit_total: mismatch.sublimit_total,
                    });
                }
                warn!(
                    employee_id = %employee.id,
                    wallet = mismatch.wallet,
                    sublimit_total = mismatch.sublimit_total,
                    "OPD sublimits do not add up to wallet"
                );
                warnings.push(format!(
                    "OPD sublimits total {} but wallet is {}",
                    mismatch.sublimit_total, mismatch.wallet
                ));
            }
            transition(&employee.id, &mut state, ResolutionState::Resolved);
        }

        Ok(EvaluationOutcome {
            employee_id: employee.id.clone(),
            as_of,
            state,
            resolution,
            trace: evaluation_trace,
            notifications,
            warnings,
        })
    }

    /// Apply or shadow one action, updating field claims.
    fn step(
        &self,
        rule: &EligibilityRule,
        action: &Action,
        resolution: &mut BenefitResolution,
        claims: &mut BTreeMap<ResolutionField, Claim>,
    ) -> Step {
        if let Action::SendNotification { template } = action {
            return Step::Notify(template.clone());
        }

        let field = action.field();
        if let Some(owner) = field.and_then(|f| claims.get(&f)) {
            if owner.priority < rule.priority() {
                trace!(
                    rule_id = %rule.id(),
                    by_rule_id = %owner.rule_id,
                    field = ?field,
                    "action shadowed"
                );
                return Step::Done(ActionOutcome::Shadowed {
                    by_rule_id: owner.rule_id.clone(),
                    by_priority: owner.priority,
                });
            }
        }

        let after = actions::apply(action, resolution, rule.id());
        let before = std::mem::replace(resolution, after.clone());
        if let Some(field) = field {
            claims.insert(
                field,
                Claim {
                    rule_id: rule.id().to_string(),
                    priority: rule.priority(),
                },
            );
        }

        Step::Done(ActionOutcome::Applied {
            before: Box::new(before),
            after: Box::new(after),
        })
    }
}

enum Step {
    Notify(String),
    Done(ActionOutcome),
}

fn transition(employee_id: &str, state: &mut ResolutionState, next: ResolutionState) {
    trace!(employee_id, from = ?*state, to = ?next, "resolution state");
    *state = next;
}
