//! Tests for the rule loader module.

use std::fs;

use tempfile::TempDir;

use super::*;
use crate::error::RuleConfigError;

const VALID_RULE_YAML: &str = r#"
apiVersion: v1
kind: EligibilityRule
metadata:
  id: engineering-standard
  name: Engineering standard plan
priority: 2
conditions:
  - parameter: department
    operator: equals
    value: Engineering
actions:
  - type: assign_benefit_group
    group: Standard
"#;

fn rule_yaml(id: &str, priority: i32) -> String {
    VALID_RULE_YAML
        .replace("engineering-standard", id)
        .replace("priority: 2", &format!("priority: {priority}"))
}

fn temp_loader() -> (TempDir, RuleLoader) {
    let dir = TempDir::new().expect("create tempdir");
    let loader = RuleLoader::new(dir.path());
    (dir, loader)
}

#[test]
fn load_rule_from_file() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("engineering.yml");
    fs::write(&path, VALID_RULE_YAML).unwrap();

    let rule = loader.load_file(&path).unwrap();
    assert_eq!(rule.id(), "engineering-standard");
    assert_eq!(rule.priority(), 2);
}

#[test]
fn load_all_skips_dotfiles_and_non_yaml() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("rule1.yml"), VALID_RULE_YAML).unwrap();
    fs::write(dir.path().join(".hidden.yml"), VALID_RULE_YAML).unwrap();
    fs::write(dir.path().join("readme.txt"), "not a rule").unwrap();

    let results = loader.load_all().unwrap();
    let loaded = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Loaded { .. }))
        .count();
    let skipped = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Skipped { .. }))
        .count();

    assert_eq!(loaded, 1);
    assert_eq!(skipped, 2);
    assert_eq!(loader.len(), 1);
}

#[test]
fn subdirectories_are_scanned_in_path_order() {
    let (dir, loader) = temp_loader();
    let nested = dir.path().join("b-nested");
    fs::create_dir(&nested).unwrap();
    fs::write(dir.path().join("c.yaml"), rule_yaml("rule-c", 1)).unwrap();
    fs::write(dir.path().join("a.yml"), rule_yaml("rule-a", 1)).unwrap();
    fs::write(nested.join("x.yml"), rule_yaml("rule-b", 1)).unwrap();

    loader.load_all().unwrap();
    let set = loader.rule_set().unwrap();
    let ids: Vec<_> = set.rules().iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["rule-a", "rule-b", "rule-c"]);
}

#[test]
fn broken_file_rejects_the_rule_set() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("good.yml"), VALID_RULE_YAML).unwrap();
    fs::write(
        dir.path().join("bad.yml"),
        VALID_RULE_YAML.replace("operator: equals", "operator: greater_than"),
    )
    .unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(results.iter().filter(|r| r.is_failed()).count(), 1);

    let err = loader.rule_set().unwrap_err();
    match err {
        LoadError::Rejected { failed, first } => {
            assert_eq!(failed, 1);
            assert!(first.contains("bad.yml"), "{first}");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let err = parse_rule("metadata: [unclosed").unwrap_err();
    assert!(matches!(err, LoadError::Parse(_)));
}

#[test]
fn invalid_rule_is_a_config_error() {
    let yaml = VALID_RULE_YAML.replace(
        "actions:\n  - type: assign_benefit_group\n    group: Standard\n",
        "actions: []\n",
    );
    let err = parse_rule(&yaml).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Config(RuleConfigError::EmptyActions { .. })
    ));
}

#[test]
fn duplicate_ids_across_files_are_rejected() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("one.yml"), VALID_RULE_YAML).unwrap();
    fs::write(dir.path().join("two.yml"), VALID_RULE_YAML).unwrap();

    loader.load_all().unwrap();
    let err = loader.rule_set().unwrap_err();
    assert!(matches!(
        err,
        LoadError::Config(RuleConfigError::DuplicateRuleId(ref id)) if id == "engineering-standard"
    ));
}

#[test]
fn reload_replaces_previous_scan() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("bad.yml");
    fs::write(&path, "metadata: [unclosed").unwrap();
    loader.load_all().unwrap();
    assert!(loader.rule_set().is_err());

    fs::write(&path, VALID_RULE_YAML).unwrap();
    loader.load_all().unwrap();
    assert_eq!(loader.rule_set().unwrap().len(), 1);
}

#[test]
fn missing_directory_is_an_io_error() {
    let (dir, _) = temp_loader();
    let loader = RuleLoader::new(dir.path().join("absent"));
    assert!(matches!(loader.load_all(), Err(LoadError::Io(_))));
}

#[test]
fn load_rule_set_convenience() {
    let (dir, _) = temp_loader();
    fs::write(dir.path().join("a.yml"), rule_yaml("rule-a", 3)).unwrap();
    fs::write(dir.path().join("b.yml"), rule_yaml("rule-b", 1)).unwrap();

    let (set, results) = RuleLoader::load_rule_set(dir.path()).unwrap();
    assert_eq!(results.len(), 2);
    let order: Vec<_> = set.by_priority().map(|r| r.id()).collect();
    assert_eq!(order, vec!["rule-b", "rule-a"]);
}
