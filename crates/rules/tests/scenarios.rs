//! End-to-end resolution scenarios over YAML rules and the sample roster.

use chrono::NaiveDate;
use eligibility_core::{load_roster, EmployeeProfile, EngineConfig, MissingFieldPolicy};
use eligibility_rules::loader::{parse_rule, RuleLoader};
use eligibility_rules::schema::{ActionKind, OpdService};
use eligibility_rules::{
    BulkEvaluator, EvaluationError, ResolutionState, RuleSet, RuleSetResolver,
};

fn workspace_path(relative: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(relative)
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn rule_set(docs: &[&str]) -> RuleSet {
    RuleSet::new(docs.iter().map(|d| parse_rule(d).unwrap()).collect()).unwrap()
}

fn employee(json: &str) -> EmployeeProfile {
    serde_json::from_str(json).unwrap()
}

const RULE_A: &str = r#"
metadata: { id: rule-a, name: Engineering standard }
priority: 2
conditions:
  - { parameter: department, operator: equals, value: Engineering }
actions:
  - { type: assign_benefit_group, group: Standard }
"#;

const RULE_B: &str = r#"
metadata: { id: rule-b, name: Executive band }
priority: 1
conditions:
  - { parameter: age, operator: between, value: { from: 40, to: 60 } }
actions:
  - { type: assign_benefit_group, group: Executive }
"#;

// ── Resolution properties ───────────────────────────────────

#[test]
fn executive_scenario_from_yaml() {
    let rules = rule_set(&[RULE_A, RULE_B]);
    let config = EngineConfig::default();
    let emp = employee(r#"{ "id": "E1", "department": "engineering", "age": 45 }"#);

    let outcome = RuleSetResolver::new(&rules, &config)
        .resolve(&emp, as_of())
        .unwrap();

    assert_eq!(outcome.state, ResolutionState::Resolved);
    assert_eq!(outcome.resolution.benefit_group.as_deref(), Some("Executive"));
    assert_eq!(outcome.resolution.matched_rule_ids, vec!["rule-b", "rule-a"]);
}

#[test]
fn and_versus_or_from_yaml() {
    let and_rule = r#"
metadata: { id: both, name: Both }
priority: 1
logic: and
conditions:
  - { parameter: department, operator: equals, value: Engineering }
  - { parameter: location, operator: in_list, value: [Pune, Chennai] }
actions:
  - { type: set_opd_wallet, amount: 0 }
"#;
    let or_rule = and_rule.replace("logic: and", "logic: or");
    let emp = employee(r#"{ "id": "E1", "department": "Engineering", "location": "Delhi" }"#);
    let config = EngineConfig::default();

    let and_set = rule_set(&[and_rule]);
    let or_set = rule_set(&[or_rule.as_str()]);
    let and_outcome = RuleSetResolver::new(&and_set, &config).resolve(&emp, as_of()).unwrap();
    let or_outcome = RuleSetResolver::new(&or_set, &config).resolve(&emp, as_of()).unwrap();

    assert!(!and_outcome.matched_any());
    assert!(or_outcome.matched_any());
}

#[test]
fn invariant_violation_then_fixed() {
    let broken = r#"
metadata: { id: opd, name: OPD }
priority: 1
conditions:
  - { parameter: age, operator: greater_than, value: 18 }
actions:
  - { type: set_opd_wallet, amount: 10000 }
  - { type: configure_opd_service, service: consultation, sublimit: 5000 }
  - { type: configure_opd_service, service: visionCare, sublimit: 4000 }
"#;
    let fixed = broken.replace("sublimit: 4000", "sublimit: 5000");
    let emp = employee(r#"{ "id": "E1", "age": 30 }"#);
    let config = EngineConfig::default();

    let broken_set = rule_set(&[broken]);
    let err = RuleSetResolver::new(&broken_set, &config)
        .resolve(&emp, as_of())
        .unwrap_err();
    assert!(matches!(err, EvaluationError::InvariantViolation { wallet: 10_000, sublimit_total: 9_000, .. }));

    let fixed_set = rule_set(&[fixed.as_str()]);
    let outcome = RuleSetResolver::new(&fixed_set, &config)
        .resolve(&emp, as_of())
        .unwrap();
    assert!(outcome.resolution.opd_services[&OpdService::VisionCare].enabled);
    assert_eq!(outcome.resolution.sublimit_total(), 10_000);
}

// ── Sample roster ───────────────────────────────────────────

fn sample_report(config: &EngineConfig) -> eligibility_rules::BulkReport {
    let (rules, _) = RuleLoader::load_rule_set(workspace_path("data/rules/examples")).unwrap();
    let roster = load_roster(&workspace_path("data/rosters/sample.json")).unwrap();
    assert!(roster.rejected.is_empty(), "{:?}", roster.rejected);
    BulkEvaluator::new(&rules, config).evaluate_all(&roster.employees, as_of())
}

#[test]
fn sample_roster_resolves() {
    let config = EngineConfig {
        worker_threads: 2,
        ..Default::default()
    };
    let report = sample_report(&config);

    assert_eq!(report.results.len(), 6);
    assert_eq!(report.failures().count(), 0);

    let e001 = report.results["E001"].as_ref().unwrap();
    assert_eq!(e001.resolution.benefit_group.as_deref(), Some("Executive"));
    assert_eq!(e001.resolution.opd_wallet, 20_000);
    assert_eq!(e001.resolution.sublimit_total(), 20_000);
    assert!(e001.resolution.ahc_packages.contains("Platinum"));
    let consultation = &e001.resolution.opd_services[&OpdService::Consultation];
    assert_eq!(consultation.sublimit, 8_000);
    assert!(consultation.family_access.spouse);
    assert_eq!(
        e001.resolution.matched_rule_ids,
        vec![
            "executive-age-band",
            "long-tenure-opd",
            "engineering-standard",
            "opd-wallet-standard",
        ]
    );

    let e002 = report.results["E002"].as_ref().unwrap();
    assert_eq!(e002.resolution.benefit_group.as_deref(), Some("Standard"));
    assert_eq!(e002.resolution.opd_wallet, 15_000);

    let e003 = report.results["E003"].as_ref().unwrap();
    assert_eq!(e003.state, ResolutionState::Blocked);
    assert_eq!(e003.resolution.blocked_by_rule_id.as_deref(), Some("contractor-block"));
    assert_eq!(e003.notifications.len(), 1);

    let e005 = report.results["E005"].as_ref().unwrap();
    assert_eq!(e005.resolution.matched_rule_ids, vec!["opd-wallet-standard"]);

    let stats = &report.stats;
    assert_eq!(stats.matched_any, 6);
    assert_eq!(stats.blocked, 2);
    assert_eq!(stats.action_counts[&ActionKind::SetOpdWallet], 4);
    assert_eq!(stats.action_counts[&ActionKind::AssignBenefitGroup], 3);
    assert_eq!(stats.action_counts[&ActionKind::SendNotification], 2);
    assert_eq!(stats.rule_matches["opd-wallet-standard"], 4);
    assert!(!stats.rule_matches.contains_key("location-pilot"));
}

#[test]
fn error_policy_isolates_the_incomplete_profile() {
    let config = EngineConfig {
        missing_field_policy: MissingFieldPolicy::Error,
        worker_threads: 2,
        ..Default::default()
    };
    let report = sample_report(&config);

    let failures: Vec<_> = report.failures().map(|(id, e)| (id, e.label())).collect();
    assert!(failures.contains(&("E005", "missing_field")), "{failures:?}");
    assert!(report.results["E001"].is_ok());
    assert_eq!(report.stats.failed, failures.len());
}

#[test]
fn report_serializes_deterministically() {
    let config = EngineConfig::default();
    let first = sample_report(&config);
    let second = sample_report(&config);

    assert_eq!(
        serde_json::to_string(&first.results).unwrap(),
        serde_json::to_string(&second.results).unwrap()
    );
    let json = serde_json::to_value(&first).unwrap();
    assert_eq!(json["stats"]["total"], 6);
    assert_eq!(json["as_of"], "2024-06-30");
}
