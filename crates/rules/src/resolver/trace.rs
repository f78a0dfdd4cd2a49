//! Ordered audit trail of one employee's evaluation.

use serde::{Deserialize, Serialize};

use crate::evaluator::RuleVerdict;
use crate::resolution::BenefitResolution;
use crate::schema::Action;

/// What happened to one action of a matched rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The action changed the resolution.
    Applied {
        before: Box<BenefitResolution>,
        after: Box<BenefitResolution>,
    },
    /// A higher-precedence rule already owns the field this action writes.
    Shadowed { by_rule_id: String, by_priority: i32 },
    /// Handed to the notification collaborator; the resolution is unchanged.
    NotificationQueued,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub rule_id: String,
    pub priority: i32,
    pub action: Action,
    #[serde(flatten)]
    pub outcome: ActionOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum TraceEntry {
    RuleCheck {
        rule_id: String,
        priority: i32,
        verdict: RuleVerdict,
    },
    Action(ActionRecord),
}

/// Entries in evaluation order: one rule check per candidate rule, followed
/// by one action record per action of each matched rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTrace {
    pub entries: Vec<TraceEntry>,
}

impl EvaluationTrace {
    pub(crate) fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    pub fn rule_checks(&self) -> impl Iterator<Item = (&str, RuleVerdict)> + '_ {
        self.entries.iter().filter_map(|e| match e {
            TraceEntry::RuleCheck {
                rule_id, verdict, ..
            } => Some((rule_id.as_str(), *verdict)),
            TraceEntry::Action(_) => None,
        })
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionRecord> + '_ {
        self.entries.iter().filter_map(|e| match e {
            TraceEntry::Action(record) => Some(record),
            TraceEntry::RuleCheck { .. } => None,
        })
    }

    /// Action records that changed the resolution.
    pub fn applied(&self) -> impl Iterator<Item = &ActionRecord> + '_ {
        self.actions()
            .filter(|r| matches!(r.outcome, ActionOutcome::Applied { .. }))
    }

    pub fn shadowed(&self) -> impl Iterator<Item = &ActionRecord> + '_ {
        self.actions()
            .filter(|r| matches!(r.outcome, ActionOutcome::Shadowed { .. }))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
