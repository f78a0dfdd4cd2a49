//! Advisory checks over validated rules.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::schema::{Action, EligibilityRule, OpdService, ResolutionField, RuleSet};

use super::fuzzy::is_kebab_case;
use super::ValidationResult;

fn rule_path(rule: &EligibilityRule, suffix: &str) -> String {
    format!("rules[{}].{}", rule.id(), suffix)
}

// ── Per-rule checks ─────────────────────────────────────────────────

pub(super) fn validate_rule(
    rule: &EligibilityRule,
    as_of: Option<NaiveDate>,
    result: &mut ValidationResult,
) {
    if !is_kebab_case(rule.id()) {
        result.warn(
            rule_path(rule, "metadata.id"),
            format!("id should be kebab-case (lowercase alphanumeric + hyphens), got '{}'", rule.id()),
        );
    }

    if let Some(as_of) = as_of {
        let effective = rule.effective();
        if let Some(end) = effective.end.filter(|end| *end < as_of) {
            result.warn(
                rule_path(rule, "effective.end"),
                format!("rule expired on {end} and cannot match as of {as_of}"),
            );
        }
        if let Some(start) = effective.start.filter(|start| *start > as_of) {
            result.warn(
                rule_path(rule, "effective.start"),
                format!("rule only takes effect on {start}"),
            );
        }
    }

    validate_own_opd(rule, result);
    validate_unreachable_actions(rule, result);
}

/// A rule that sets both a wallet and service sublimits should balance them.
fn validate_own_opd(rule: &EligibilityRule, result: &mut ValidationResult) {
    let mut wallet = None;
    let mut sublimits: BTreeMap<OpdService, u64> = BTreeMap::new();
    for action in rule.actions() {
        match action {
            Action::SetOpdWallet { amount } => wallet = Some(*amount),
            Action::ConfigureOpdService {
                service, sublimit, ..
            } => {
                sublimits.insert(*service, *sublimit);
            }
            _ => {}
        }
    }

    let Some(wallet) = wallet else { return };
    if sublimits.is_empty() {
        return;
    }
    let total = sublimits.values().fold(0u64, |acc, v| acc.saturating_add(*v));
    if total != wallet {
        result.warn(
            rule_path(rule, "actions"),
            format!(
                "service sublimits total {total} but the wallet is {wallet}; resolution fails in strict mode unless another rule corrects it"
            ),
        );
    }
}

fn validate_unreachable_actions(rule: &EligibilityRule, result: &mut ValidationResult) {
    let block = rule
        .actions()
        .iter()
        .position(|a| matches!(a, Action::BlockEligibility { .. }));
    if let Some(index) = block {
        for later in (index + 1)..rule.actions().len() {
            result.warn(
                rule_path(rule, &format!("actions[{later}]")),
                "action follows block_eligibility and is never applied",
            );
        }
    }
}

// ── Cross-rule checks ───────────────────────────────────────────────

/// Same-priority rules writing the same field fall back to list order.
pub(super) fn validate_priority_overlaps(rules: &RuleSet, result: &mut ValidationResult) {
    let active: Vec<&EligibilityRule> = rules.rules().iter().filter(|r| r.is_active()).collect();

    for (i, earlier) in active.iter().enumerate() {
        let earlier_fields = fields(earlier);
        for later in active.iter().skip(i + 1) {
            if later.priority() != earlier.priority() {
                continue;
            }
            for field in earlier_fields.intersection(&fields(later)) {
                result.warn(
                    rule_path(later, "priority"),
                    format!(
                        "shares priority {} with '{}' and both write {}; '{}' wins when both match",
                        later.priority(),
                        earlier.id(),
                        field,
                        later.id()
                    ),
                );
            }
        }
    }
}

fn fields(rule: &EligibilityRule) -> BTreeSet<ResolutionField> {
    rule.actions().iter().filter_map(Action::field).collect()
}

pub(super) fn validate_duplicate_names(rules: &RuleSet, result: &mut ValidationResult) {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for rule in rules.rules() {
        let key = rule.name().trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        if let Some(first) = seen.get(&key) {
            result.warn(
                rule_path(rule, "metadata.name"),
                format!("name '{}' is already used by rule '{}'", rule.name(), first),
            );
        } else {
            seen.insert(key, rule.id());
        }
    }
}
