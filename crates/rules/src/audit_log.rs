//! In-memory structured audit log for eligibility evaluation.
//!
//! Stores per-rule log entries capped at a configurable maximum (default 500)
//! with FIFO eviction. Entries are derived from finished evaluation outcomes,
//! so the resolver itself stays free of side effects. Uses `std::sync::RwLock`
//! so bulk consumers can record from worker threads.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::EvaluationError;
use crate::evaluator::RuleVerdict;
use crate::resolver::{ActionOutcome, EvaluationOutcome, TraceEntry};
use crate::schema::ActionKind;

/// Scope used for failures that no single rule is responsible for.
pub const UNSCOPED: &str = "*";

/// Severity level for audit log entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Numeric severity for comparison (higher = more severe).
    pub fn as_severity(&self) -> u8 {
        match self {
            LogLevel::Debug => 0,
            LogLevel::Info => 1,
            LogLevel::Warning => 2,
            LogLevel::Error => 3,
        }
    }
}

/// Evaluation step that produced the log entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    RuleCheck,
    ActionApplied,
    ActionShadowed,
    Blocked,
    Notification,
    InvariantCheck,
    Failure,
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub rule_id: String,
    pub employee_id: String,
    pub level: LogLevel,
    pub phase: ExecutionPhase,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Query parameters for filtering audit log entries.
#[derive(Debug, Default, Deserialize)]
pub struct LogQueryParams {
    /// Minimum log level (inclusive).
    pub level: Option<LogLevel>,
    pub phase: Option<ExecutionPhase>,
    /// Maximum number of entries to return (default 100).
    pub limit: Option<u32>,
    /// Only return entries at or after this RFC 3339 timestamp.
    pub since: Option<String>,
}

/// In-memory per-rule audit log with FIFO eviction.
#[derive(Clone)]
pub struct AuditLog {
    entries: Arc<RwLock<HashMap<String, VecDeque<LogEntry>>>>,
    max_entries_per_rule: usize,
}

impl AuditLog {
    /// Create a new audit log with the default cap of 500 entries per rule.
    pub fn new() -> Self {
        Self::with_max_entries(500)
    }

    pub fn with_max_entries(max: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_entries_per_rule: max,
        }
    }

    pub fn log(
        &self,
        rule_id: &str,
        employee_id: &str,
        level: LogLevel,
        phase: ExecutionPhase,
        message: impl Into<String>,
    ) {
        self.log_with_details(rule_id, employee_id, level, phase, message, None);
    }

    pub fn log_with_details(
        &self,
        rule_id: &str,
        employee_id: &str,
        level: LogLevel,
        phase: ExecutionPhase,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            rule_id: rule_id.to_string(),
            employee_id: employee_id.to_string(),
            level,
            phase,
            message: message.into(),
            details,
        };

        let mut guard = self.entries.write().expect("audit_log lock poisoned");
        let deque = guard.entry(rule_id.to_string()).or_default();
        deque.push_back(entry);
        while deque.len() > self.max_entries_per_rule {
            deque.pop_front();
        }
    }

    /// Record every step of a finished evaluation.
    pub fn record_outcome(&self, outcome: &EvaluationOutcome) {
        let employee_id = outcome.employee_id.as_str();

        for entry in &outcome.trace.entries {
            match entry {
                TraceEntry::RuleCheck {
                    rule_id, verdict, ..
                } => {
                    let level = if *verdict == RuleVerdict::Matched {
                        LogLevel::Info
                    } else {
                        LogLevel::Debug
                    };
                    self.log_with_details(
                        rule_id,
                        employee_id,
                        level,
                        ExecutionPhase::RuleCheck,
                        format!("rule check: {}", verdict_label(*verdict)),
                        Some(json!({ "as_of": outcome.as_of })),
                    );
                }
                TraceEntry::Action(record) => {
                    let action = serde_json::to_value(&record.action).ok();
                    match &record.outcome {
                        ActionOutcome::Applied { .. } => {
                            let (phase, level) = if record.action.kind() == ActionKind::BlockEligibility {
                                (ExecutionPhase::Blocked, LogLevel::Warning)
                            } else {
                                (ExecutionPhase::ActionApplied, LogLevel::Info)
                            };
                            self.log_with_details(
                                &record.rule_id,
                                employee_id,
                                level,
                                phase,
                                format!("{} applied", record.action.kind()),
                                action,
                            );
                        }
                        ActionOutcome::Shadowed {
                            by_rule_id,
                            by_priority,
                        } => {
                            self.log_with_details(
                                &record.rule_id,
                                employee_id,
                                LogLevel::Debug,
                                ExecutionPhase::ActionShadowed,
                                format!("shadowed by '{by_rule_id}' (priority {by_priority})"),
                                action,
                            );
                        }
                        ActionOutcome::NotificationQueued => {
                            self.log_with_details(
                                &record.rule_id,
                                employee_id,
                                LogLevel::Info,
                                ExecutionPhase::Notification,
                                "notification queued",
                                action,
                            );
                        }
                    }
                }
            }
        }

        for warning in &outcome.warnings {
            for rule_id in &outcome.resolution.matched_rule_ids {
                self.log(
                    rule_id,
                    employee_id,
                    LogLevel::Warning,
                    ExecutionPhase::InvariantCheck,
                    warning.clone(),
                );
            }
        }
    }

    /// Record a failed evaluation against the rule that raised it, or
    /// against [`UNSCOPED`] when no single rule is responsible.
    pub fn record_failure(&self, employee_id: &str, error: &EvaluationError) {
        let rule_id = error.rule_id().unwrap_or(UNSCOPED);
        let phase = match error {
            EvaluationError::InvariantViolation { .. } => ExecutionPhase::InvariantCheck,
            _ => ExecutionPhase::Failure,
        };
        self.log_with_details(
            rule_id,
            employee_id,
            LogLevel::Error,
            phase,
            error.to_string(),
            serde_json::to_value(error).ok(),
        );
    }

    /// Query log entries for a rule, newest first.
    pub fn query(&self, rule_id: &str, params: &LogQueryParams) -> Vec<LogEntry> {
        let guard = self.entries.read().expect("audit_log lock poisoned");
        let Some(deque) = guard.get(rule_id) else {
            return Vec::new();
        };

        let min_severity = params.level.map(|l| l.as_severity()).unwrap_or(0);
        let since: Option<DateTime<Utc>> = params
            .since
            .as_ref()
            .and_then(|s| s.parse::<DateTime<Utc>>().ok());
        let limit = params.limit.unwrap_or(100) as usize;

        deque
            .iter()
            .rev()
            .filter(|e| e.level.as_severity() >= min_severity)
            .filter(|e| params.phase.map_or(true, |p| e.phase == p))
            .filter(|e| since.map_or(true, |s| e.timestamp >= s))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Rule ids with at least one entry, sorted.
    pub fn rule_ids(&self) -> Vec<String> {
        let guard = self.entries.read().expect("audit_log lock poisoned");
        let mut ids: Vec<String> = guard.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn clear(&self, rule_id: &str) {
        let mut guard = self.entries.write().expect("audit_log lock poisoned");
        guard.remove(rule_id);
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

fn verdict_label(verdict: RuleVerdict) -> &'static str {
    match verdict {
        RuleVerdict::Matched => "matched",
        RuleVerdict::Inactive => "inactive",
        RuleVerdict::OutsideEffectiveRange => "outside effective range",
        RuleVerdict::ConditionsNotMet => "conditions not met",
    }
}
