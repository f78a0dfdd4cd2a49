use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional profiled env var. A value that does not parse is
/// logged and treated as unset.
fn profiled_env_parsed_opt<T>(profile: &str, key: &str) -> Option<T>
where
    T: FromStr,
{
    let raw = profiled_env_opt(profile, key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "unparseable config value, using default");
            None
        }
    }
}

/// Parse a profiled env var, warning and falling back to `default` when it does not parse.
fn profiled_env_parsed<T>(profile: &str, key: &str, default: T) -> T
where
    T: FromStr,
{
    profiled_env_parsed_opt(profile, key).unwrap_or(default)
}

// ── Missing field policy ──────────────────────────────────────

/// What a condition does when the employee profile lacks the referenced attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// The condition evaluates to `false`.
    #[default]
    NoMatch,
    /// Evaluation of that employee fails with a missing-field error.
    Error,
}

impl FromStr for MissingFieldPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "no_match" | "nomatch" | "no-match" => Ok(MissingFieldPolicy::NoMatch),
            "error" => Ok(MissingFieldPolicy::Error),
            other => Err(format!("unknown missing field policy: '{}'", other)),
        }
    }
}

impl fmt::Display for MissingFieldPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingFieldPolicy::NoMatch => write!(f, "no_match"),
            MissingFieldPolicy::Error => write!(f, "error"),
        }
    }
}

// ── Engine config ─────────────────────────────────────────────

/// Runtime options for rule evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Active profile name (empty = default).
    #[serde(default)]
    pub profile: String,
    /// Fail on OPD sublimit/wallet mismatch (`true`) or only warn (`false`).
    #[serde(default = "default_true")]
    pub strict_invariants: bool,
    #[serde(default)]
    pub missing_field_policy: MissingFieldPolicy,
    /// Bulk evaluation worker count; 0 = one per available core.
    #[serde(default)]
    pub worker_threads: usize,
    #[serde(default = "default_rules_dir")]
    pub rules_dir: PathBuf,
    /// Overall deadline for one bulk evaluation, in seconds.
    #[serde(default)]
    pub batch_deadline_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_rules_dir() -> PathBuf {
    PathBuf::from("data/rules")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            strict_invariants: true,
            missing_field_policy: MissingFieldPolicy::NoMatch,
            worker_threads: 0,
            rules_dir: default_rules_dir(),
            batch_deadline_secs: None,
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ELIGIBILITY_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("ELIGIBILITY_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            strict_invariants: profiled_env_parsed(p, "STRICT_INVARIANTS", true),
            missing_field_policy: profiled_env_parsed(
                p,
                "MISSING_FIELD_POLICY",
                MissingFieldPolicy::NoMatch,
            ),
            worker_threads: profiled_env_parsed(p, "WORKER_THREADS", 0),
            rules_dir: PathBuf::from(profiled_env_or(p, "RULES_DIR", "data/rules")),
            batch_deadline_secs: profiled_env_parsed_opt(p, "BATCH_DEADLINE_SECS"),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Worker count with 0 resolved to the number of available cores.
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            return self.worker_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules_dir:            {}", self.rules_dir.display());
        tracing::info!("  strict_invariants:    {}", self.strict_invariants);
        tracing::info!("  missing_field_policy: {}", self.missing_field_policy);
        tracing::info!("  worker_threads:       {}", self.resolved_worker_threads());
        match self.batch_deadline_secs {
            Some(secs) => tracing::info!("  batch_deadline:       {}s", secs),
            None => tracing::info!("  batch_deadline:       (none)"),
        }
    }
}
