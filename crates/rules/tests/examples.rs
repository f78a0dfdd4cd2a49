//! Integration tests that verify every example YAML rule in
//! `data/rules/examples/` loads and lints cleanly.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use eligibility_core::Attribute;
use eligibility_rules::loader::{parse_rule, LoadStatus, RuleLoader};
use eligibility_rules::schema::{
    Action, ConditionValue, EligibilityRule, FamilyCoverage, LogicOperator, OpdService, Operator,
};
use eligibility_rules::validation::validate_rule_set;

/// Integration tests run from the crate directory, so we go up two levels.
fn examples_dir() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../data/rules/examples")
}

fn load_rule(filename: &str) -> EligibilityRule {
    let path = examples_dir().join(filename);
    let yaml = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    parse_rule(&yaml).unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e))
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ── contractor-block.yml ────────────────────────────────────

#[test]
fn parse_contractor_block_example() {
    let rule = load_rule("contractor-block.yml");

    assert_eq!(rule.id(), "contractor-block");
    assert_eq!(rule.priority(), 0);
    assert_eq!(rule.conditions()[0].parameter, Attribute::EmployeeType);
    assert_eq!(rule.conditions()[0].operator, Operator::InList);
    assert_eq!(
        rule.conditions()[0].value,
        ConditionValue::list(["Contractor", "Intern"])
    );
    assert!(matches!(rule.actions()[0], Action::SendNotification { .. }));
    assert_eq!(
        rule.actions()[1],
        Action::BlockEligibility {
            reason: Some("agency plan".to_string())
        }
    );
}

// ── executive-age-band.yml ──────────────────────────────────

#[test]
fn parse_executive_age_band_example() {
    let rule = load_rule("executive-age-band.yml");

    assert_eq!(rule.priority(), 1);
    assert_eq!(rule.effective().start, Some(date("2024-04-01")));
    assert_eq!(rule.effective().end, None);
    assert_eq!(rule.conditions()[0].value, ConditionValue::range(40, 60));
    assert_eq!(
        rule.metadata().tags.as_deref(),
        Some(&["ahc".to_string(), "executive".to_string()][..])
    );

    let packages: BTreeSet<String> = ["Platinum".to_string()].into_iter().collect();
    assert_eq!(
        rule.actions()[1],
        Action::EnableAhc {
            packages,
            include_spouse: true
        }
    );
}

// ── long-tenure-opd.yml ─────────────────────────────────────

#[test]
fn parse_long_tenure_opd_example() {
    let rule = load_rule("long-tenure-opd.yml");

    assert_eq!(rule.conditions()[0].parameter, Attribute::ServicePeriod);
    assert_eq!(rule.actions()[0], Action::SetOpdWallet { amount: 20_000 });
    assert_eq!(
        rule.actions()[1],
        Action::ConfigureOpdService {
            service: OpdService::Consultation,
            sublimit: 8_000,
            transaction_limit: Some(1_500),
            reimbursement: false,
        }
    );

    let sublimits: u64 = rule
        .actions()
        .iter()
        .filter_map(|a| match a {
            Action::ConfigureOpdService { sublimit, .. } => Some(*sublimit),
            _ => None,
        })
        .sum();
    assert_eq!(sublimits, 20_000);
}

// ── opd-wallet-standard.yml ─────────────────────────────────

#[test]
fn parse_opd_wallet_standard_example() {
    let rule = load_rule("opd-wallet-standard.yml");

    assert_eq!(
        rule.actions().last(),
        Some(&Action::SetFamilyCoverage {
            service: OpdService::Consultation,
            coverage: FamilyCoverage {
                spouse: true,
                parents: true,
                parents_in_law: false,
            },
        })
    );
}

// ── location-pilot.yml ──────────────────────────────────────

#[test]
fn parse_location_pilot_example() {
    let rule = load_rule("location-pilot.yml");

    assert!(!rule.is_active());
    assert_eq!(rule.logic(), LogicOperator::Or);
    assert_eq!(rule.conditions()[0].operator, Operator::Contains);
}

// ── Whole directory ─────────────────────────────────────────

#[test]
fn every_example_loads() {
    let loader = RuleLoader::new(examples_dir());
    let results = loader.load_all().unwrap();

    let failed: Vec<_> = results
        .iter()
        .filter_map(|r| match &r.status {
            LoadStatus::Failed { error } => Some(format!("{}: {}", r.path.display(), error)),
            _ => None,
        })
        .collect();
    assert!(failed.is_empty(), "failed examples: {failed:?}");

    let set = loader.rule_set().unwrap();
    assert_eq!(set.len(), 6);

    let order: Vec<_> = set.by_priority().map(|r| r.id()).collect();
    assert_eq!(
        order,
        vec![
            "contractor-block",
            "executive-age-band",
            "long-tenure-opd",
            "engineering-standard",
            "opd-wallet-standard",
            "location-pilot",
        ]
    );
}

#[test]
fn examples_lint_with_only_the_expired_pilot_warning() {
    let (set, _) = RuleLoader::load_rule_set(examples_dir()).unwrap();
    let result = validate_rule_set(&set, Some(date("2024-06-30")));

    assert!(result.valid);
    let paths: Vec<_> = result.warnings.iter().map(|w| w.path.as_str()).collect();
    assert_eq!(paths, vec!["rules[location-pilot].effective.end"]);
}
