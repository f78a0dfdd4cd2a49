//! Error types and load result structures for the rule loader.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::RuleConfigError;

/// Errors that can occur while loading rule files.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML syntax or shape error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document parsed but is not a valid rule, or the set is inconsistent.
    #[error("invalid rule: {0}")]
    Config(#[from] RuleConfigError),

    /// At least one file failed to load, so no rule set is produced.
    #[error("{failed} rule file(s) failed to load; first: {first}")]
    Rejected { failed: usize, first: String },
}

/// Result alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Outcome of loading a single rule file.
#[derive(Debug, Clone, Serialize)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    Loaded { rule_id: String },
    /// Dotfile or non-YAML file.
    Skipped { reason: String },
    Failed { error: String },
}

impl LoadResult {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, LoadStatus::Failed { .. })
    }
}
