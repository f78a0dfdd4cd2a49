//! Ordered rule collection with a stable priority order.

use std::collections::HashSet;

use crate::error::RuleConfigError;

use super::EligibilityRule;

/// Rules in authoring (list) order plus a precomputed priority order.
///
/// The priority order sorts ascending by `priority` and keeps list order
/// among equal priorities.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<EligibilityRule>,
    order: Vec<usize>,
}

impl RuleSet {
    /// Build a rule set, rejecting duplicate rule ids.
    pub fn new(rules: Vec<EligibilityRule>) -> Result<Self, RuleConfigError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id()) {
                return Err(RuleConfigError::DuplicateRuleId(rule.id().to_string()));
            }
        }

        let mut order: Vec<usize> = (0..rules.len()).collect();
        // `sort_by_key` is stable.
        order.sort_by_key(|&i| rules[i].priority());

        Ok(Self { rules, order })
    }

    /// Rules in list order.
    pub fn rules(&self) -> &[EligibilityRule] {
        &self.rules
    }

    /// Rules in evaluation order.
    pub fn by_priority(&self) -> impl Iterator<Item = &EligibilityRule> + '_ {
        self.order.iter().map(move |&i| &self.rules[i])
    }

    pub fn get(&self, id: &str) -> Option<&EligibilityRule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
