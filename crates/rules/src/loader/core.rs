//! Core [`RuleLoader`] struct: filesystem-backed rule loading.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{info, warn};

use crate::schema::{EligibilityRule, RuleDocument, RuleSet};

use super::error::{LoadError, LoadResult, LoadStatus, Result};

/// Parse one YAML document into a validated rule.
///
/// Parsing into [`RuleDocument`] first keeps YAML errors and rule
/// validation errors apart.
pub fn parse_rule(yaml: &str) -> Result<EligibilityRule> {
    let doc: RuleDocument = serde_yaml::from_str(yaml)?;
    Ok(EligibilityRule::new(doc)?)
}

/// Filesystem-backed rule loader.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files and keeps the
/// validated rules keyed by path, so [`RuleLoader::rule_set`] lists them in a
/// stable order.
pub struct RuleLoader {
    rules_dir: PathBuf,
    rules: RwLock<BTreeMap<PathBuf, EligibilityRule>>,
    failures: RwLock<BTreeMap<PathBuf, String>>,
}

impl RuleLoader {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
            rules: RwLock::new(BTreeMap::new()),
            failures: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load `rules_dir` and build its rule set in one step.
    pub fn load_rule_set(rules_dir: impl Into<PathBuf>) -> Result<(RuleSet, Vec<LoadResult>)> {
        let loader = Self::new(rules_dir);
        let results = loader.load_all()?;
        Ok((loader.rule_set()?, results))
    }

    /// Rescan the rules directory, replacing anything loaded before.
    ///
    /// Dotfiles and non-YAML files are skipped. Parse errors are reported
    /// per file and do not stop the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        if !self.rules_dir.is_dir() {
            return Err(LoadError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("rules directory not found: {}", self.rules_dir.display()),
            )));
        }

        self.rules.write().expect("rules lock poisoned").clear();
        self.failures.write().expect("failures lock poisoned").clear();

        let mut results = Vec::new();
        self.scan_dir_recursive(&self.rules_dir, &mut results)?;

        let loaded = results
            .iter()
            .filter(|r| matches!(r.status, LoadStatus::Loaded { .. }))
            .count();
        let failed = results.iter().filter(|r| r.is_failed()).count();
        info!(path = %self.rules_dir.display(), loaded, failed, "rule scan complete");
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let mut paths = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.sort();

        for path in paths {
            // Skip dotfiles/dotdirs
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);
            if !is_yaml {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            match self.load_file(&path) {
                Ok(rule) => {
                    let rule_id = rule.id().to_string();
                    info!(rule_id = %rule_id, priority = rule.priority(), path = %path.display(), "loaded rule");
                    self.rules
                        .write()
                        .expect("rules lock poisoned")
                        .insert(path.clone(), rule);
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { rule_id },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule file");
                    let error = e.to_string();
                    self.failures
                        .write()
                        .expect("failures lock poisoned")
                        .insert(path.clone(), error.clone());
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed { error },
                    });
                }
            }
        }

        Ok(())
    }

    /// Read and validate a single rule file.
    pub fn load_file(&self, path: &Path) -> Result<EligibilityRule> {
        let contents = fs::read_to_string(path)?;
        parse_rule(&contents)
    }

    /// Build a rule set from everything loaded so far, in path order.
    ///
    /// Fails if any file failed to load or two files share a rule id.
    pub fn rule_set(&self) -> Result<RuleSet> {
        let failures = self.failures.read().expect("failures lock poisoned");
        if let Some((path, error)) = failures.iter().next() {
            return Err(LoadError::Rejected {
                failed: failures.len(),
                first: format!("{}: {}", path.display(), error),
            });
        }

        let rules = self.rules.read().expect("rules lock poisoned");
        Ok(RuleSet::new(rules.values().cloned().collect())?)
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Number of rules currently loaded.
    pub fn len(&self) -> usize {
        self.rules.read().expect("rules lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
