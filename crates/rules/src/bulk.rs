//! Roster-wide evaluation on a rayon thread pool.
//!
//! Each employee is resolved independently, so the roster fans out across
//! workers with no shared mutable state. Failures stay local to the employee
//! that produced them. Cancellation is cooperative and checked before each
//! employee is started; employees not started are listed in
//! [`BulkReport::not_evaluated`].

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use eligibility_core::{EmployeeProfile, EngineConfig};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EvaluationError;
use crate::resolver::{EvaluationOutcome, RuleSetResolver};
use crate::schema::{ActionKind, RuleSet};

/// Per-employee result: an outcome, or the error that stopped that employee.
pub type EmployeeResult = Result<EvaluationOutcome, EvaluationError>;

// ── Cancellation ────────────────────────────────────────────────────

/// Shared flag a caller can raise to stop a bulk run between employees.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ── Report ──────────────────────────────────────────────────────────

/// Aggregate impact of a rule set over a roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImpactStats {
    /// Profiles supplied, duplicates included.
    pub total: usize,
    /// Employees whose evaluation ran to completion or failure.
    pub evaluated: usize,
    pub matched_any: usize,
    pub blocked: usize,
    pub failed: usize,
    /// Employees skipped after cancellation or deadline expiry.
    pub cancelled: usize,
    /// Employees affected by at least one applied action of each kind.
    pub action_counts: BTreeMap<ActionKind, usize>,
    /// Employees matched per rule id.
    pub rule_matches: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicate_employee_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkReport {
    pub run_id: Uuid,
    pub as_of: NaiveDate,
    pub results: BTreeMap<String, EmployeeResult>,
    pub stats: ImpactStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_evaluated: Vec<String>,
}

impl BulkReport {
    pub fn outcomes(&self) -> impl Iterator<Item = &EvaluationOutcome> + '_ {
        self.results.values().filter_map(|r| r.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &EvaluationError)> + '_ {
        self.results
            .iter()
            .filter_map(|(id, r)| r.as_ref().err().map(|e| (id.as_str(), e)))
    }

    pub fn was_cancelled(&self) -> bool {
        !self.not_evaluated.is_empty()
    }
}

// ── Evaluator ───────────────────────────────────────────────────────

/// Runs the resolver over a roster.
pub struct BulkEvaluator<'a> {
    resolver: RuleSetResolver<'a>,
    worker_threads: usize,
    deadline: Option<Duration>,
}

impl<'a> BulkEvaluator<'a> {
    pub fn new(rules: &'a RuleSet, config: &EngineConfig) -> Self {
        Self {
            resolver: RuleSetResolver::new(rules, config),
            worker_threads: config.resolved_worker_threads(),
            deadline: config.batch_deadline_secs.map(Duration::from_secs),
        }
    }

    /// Override the batch deadline.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn evaluate_all(&self, employees: &[EmployeeProfile], as_of: NaiveDate) -> BulkReport {
        self.evaluate_all_with(employees, as_of, &CancellationToken::new())
    }

    /// Evaluate a roster, stopping early when `token` is cancelled or the
    /// deadline passes.
    pub fn evaluate_all_with(
        &self,
        employees: &[EmployeeProfile],
        as_of: NaiveDate,
        token: &CancellationToken,
    ) -> BulkReport {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        // A deadline too far out to represent is no deadline at all.
        let deadline = self.deadline.and_then(|d| started.checked_add(d));

        let (unique, duplicates) = dedupe(employees);
        if !duplicates.is_empty() {
            warn!(%run_id, count = duplicates.len(), "duplicate employee ids in roster; first occurrence wins");
        }

        let run = || -> Vec<(String, Option<EmployeeResult>)> {
            unique
                .par_iter()
                .map(|employee| {
                    let expired = deadline.is_some_and(|d| Instant::now() >= d);
                    if expired || token.is_cancelled() {
                        return (employee.id.clone(), None);
                    }
                    (
                        employee.id.clone(),
                        Some(self.resolver.resolve(employee, as_of)),
                    )
                })
                .collect()
        };

        let gathered = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_threads)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!(error = %e, "failed to build worker pool; using global pool");
                run()
            }
        };

        let mut results = BTreeMap::new();
        let mut not_evaluated = Vec::new();
        for (id, result) in gathered {
            match result {
                Some(r) => {
                    results.insert(id, r);
                }
                None => not_evaluated.push(id),
            }
        }

        let mut stats = ImpactStats {
            total: employees.len(),
            cancelled: not_evaluated.len(),
            duplicate_employee_ids: duplicates,
            ..Default::default()
        };
        for result in results.values() {
            stats.record(result);
        }

        if token.is_cancelled() && !not_evaluated.is_empty() {
            warn!(%run_id, skipped = not_evaluated.len(), "bulk evaluation cancelled");
        } else if !not_evaluated.is_empty() {
            warn!(%run_id, skipped = not_evaluated.len(), "bulk evaluation deadline exceeded");
        }
        info!(
            %run_id,
            %as_of,
            total = stats.total,
            evaluated = stats.evaluated,
            matched = stats.matched_any,
            blocked = stats.blocked,
            failed = stats.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "bulk evaluation complete"
        );

        BulkReport {
            run_id,
            as_of,
            results,
            stats,
            not_evaluated,
        }
    }
}

impl ImpactStats {
    fn record(&mut self, result: &EmployeeResult) {
        self.evaluated += 1;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(_) => {
                self.failed += 1;
                return;
            }
        };

        if outcome.matched_any() {
            self.matched_any += 1;
        }
        if outcome.is_blocked() {
            self.blocked += 1;
        }
        for rule_id in &outcome.resolution.matched_rule_ids {
            *self.rule_matches.entry(rule_id.clone()).or_default() += 1;
        }

        // Counted once per employee even when several rules apply the same kind.
        let kinds: BTreeSet<ActionKind> = outcome
            .trace
            .applied()
            .map(|r| r.action.kind())
            .chain(
                outcome
                    .notifications
                    .iter()
                    .map(|_| ActionKind::SendNotification),
            )
            .collect();
        for kind in kinds {
            *self.action_counts.entry(kind).or_default() += 1;
        }
    }
}

/// Keep the first profile per id; return the ids seen more than once.
fn dedupe(employees: &[EmployeeProfile]) -> (Vec<&EmployeeProfile>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    let mut unique = Vec::with_capacity(employees.len());
    for employee in employees {
        if seen.insert(employee.id.as_str()) {
            unique.push(employee);
        } else {
            duplicates.insert(employee.id.clone());
        }
    }
    (unique, duplicates.into_iter().collect())
}

// ── Tests ───────────────────────────────────────────────────────────
