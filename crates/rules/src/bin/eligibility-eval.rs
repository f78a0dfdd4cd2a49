//! eligibility-eval: evaluate a roster against a directory of eligibility rules.
//!
//! Loads every rule under the rules directory (any broken file aborts the
//! run), lints the rule set, resolves each employee of the roster, and prints
//! a JSON report on stdout. Logs go to stderr and follow `RUST_LOG`.

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use eligibility_core::config::load_dotenv;
use eligibility_core::{load_roster, EngineConfig, MissingFieldPolicy, RejectedEntry};
use eligibility_rules::audit_log::{AuditLog, LogEntry, LogQueryParams};
use eligibility_rules::loader::{LoadResult, RuleLoader};
use eligibility_rules::notifications::{NotificationSink, TracingSink};
use eligibility_rules::validation::{validate_rule_set, ValidationResult};
use eligibility_rules::{BulkEvaluator, BulkReport};

// ── CLI ─────────────────────────────────────────────────────────────

/// Evaluate employee benefit eligibility rules over a roster.
#[derive(Parser, Debug)]
#[command(name = "eligibility-eval", version, about)]
struct Cli {
    /// Directory of rule YAML files.
    #[arg(long, env = "RULES_DIR")]
    rules_dir: Option<PathBuf>,

    /// JSON array of employee profiles. Required unless --lint-only.
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Evaluation date (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Fail (true) or warn (false) when OPD sublimits do not add up to the wallet.
    #[arg(long)]
    strict_invariants: Option<bool>,

    /// `no_match` or `error`.
    #[arg(long)]
    missing_field_policy: Option<MissingFieldPolicy>,

    /// Worker threads (0 = one per core).
    #[arg(long)]
    threads: Option<usize>,

    /// Stop starting new employees after this many seconds.
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Only load and lint the rules.
    #[arg(long)]
    lint_only: bool,

    /// Include the audit entries recorded for this rule id.
    #[arg(long)]
    audit_rule: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut EngineConfig) {
        if let Some(dir) = &self.rules_dir {
            config.rules_dir = dir.clone();
        }
        if let Some(strict) = self.strict_invariants {
            config.strict_invariants = strict;
        }
        if let Some(policy) = self.missing_field_policy {
            config.missing_field_policy = policy;
        }
        if let Some(threads) = self.threads {
            config.worker_threads = threads;
        }
        if let Some(secs) = self.deadline_secs {
            config.batch_deadline_secs = Some(secs);
        }
    }
}

// ── Output ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Output {
    as_of: NaiveDate,
    files: Vec<LoadResult>,
    lint: ValidationResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rejected_employees: Vec<RejectedEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<BulkReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audit: Option<Vec<LogEntry>>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    cli.apply(&mut config);
    config.log_summary();

    let as_of = cli.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let loader = RuleLoader::new(&config.rules_dir);
    let files = loader
        .load_all()
        .with_context(|| format!("scanning {}", config.rules_dir.display()))?;
    let rules = loader.rule_set().context("rule set rejected")?;
    info!(rules = rules.len(), "rule set ready");

    let lint = validate_rule_set(&rules, Some(as_of));
    for w in &lint.warnings {
        warn!(path = %w.path, "{}", w.message);
    }

    let mut output = Output {
        as_of,
        files,
        lint,
        rejected_employees: Vec::new(),
        report: None,
        audit: None,
    };

    if !cli.lint_only {
        let Some(roster_path) = &cli.roster else {
            bail!("--roster is required unless --lint-only is set");
        };
        let roster = load_roster(roster_path)
            .with_context(|| format!("reading roster {}", roster_path.display()))?;

        let report = BulkEvaluator::new(&rules, &config).evaluate_all(&roster.employees, as_of);
        output.rejected_employees = roster.rejected;

        let audit = AuditLog::new();
        let sink = TracingSink;
        let mut delivered = 0;
        for (employee_id, result) in &report.results {
            match result {
                Ok(outcome) => {
                    audit.record_outcome(outcome);
                    delivered += sink.deliver_all(&outcome.notifications);
                }
                Err(e) => audit.record_failure(employee_id, e),
            }
        }
        info!(
            notifications = delivered,
            audited_rules = audit.rule_ids().len(),
            "notifications handed off"
        );

        if let Some(rule_id) = &cli.audit_rule {
            let params = LogQueryParams {
                limit: Some(u32::MAX),
                ..Default::default()
            };
            output.audit = Some(audit.query(rule_id, &params));
        }
        output.report = Some(report);
    }

    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &output).context("writing report")?;
    println!();
    Ok(())
}
