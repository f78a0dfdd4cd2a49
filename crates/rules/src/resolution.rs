//! Per-employee benefit resolution: the output of evaluating a rule set.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::schema::{FamilyCoverage, OpdService};

/// Limits and coverage for one OPD service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpdServiceConfig {
    pub enabled: bool,
    pub sublimit: u64,
    #[serde(default)]
    pub transaction_limit: Option<u64>,
    #[serde(default)]
    pub reimbursement: bool,
    #[serde(default)]
    pub family_access: FamilyCoverage,
}

/// Final benefit outcome for one employee.
///
/// Built incrementally as matching rules apply in priority order, then
/// checked once all rules have been considered. Ordered collections keep
/// serialization deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitResolution {
    pub employee_id: String,
    pub benefit_group: Option<String>,
    pub ahc_packages: BTreeSet<String>,
    pub ahc_includes_spouse: bool,
    pub additional_tests: BTreeSet<String>,
    pub opd_wallet: u64,
    pub opd_services: BTreeMap<OpdService, OpdServiceConfig>,
    pub eligible: bool,
    /// Rules whose conditions matched, in evaluation (priority) order.
    pub matched_rule_ids: Vec<String>,
    pub blocked_by_rule_id: Option<String>,
}

/// OPD sublimits that do not add up to the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpdMismatch {
    pub wallet: u64,
    pub sublimit_total: u64,
}

impl BenefitResolution {
    /// Fresh, eligible resolution with no benefits assigned.
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            benefit_group: None,
            ahc_packages: BTreeSet::new(),
            ahc_includes_spouse: false,
            additional_tests: BTreeSet::new(),
            opd_wallet: 0,
            opd_services: BTreeMap::new(),
            eligible: true,
            matched_rule_ids: Vec::new(),
            blocked_by_rule_id: None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked_by_rule_id.is_some()
    }

    /// Services currently enabled.
    pub fn enabled_services(&self) -> impl Iterator<Item = (&OpdService, &OpdServiceConfig)> {
        self.opd_services.iter().filter(|(_, cfg)| cfg.enabled)
    }

    /// Sum of the sublimits of enabled services.
    pub fn sublimit_total(&self) -> u64 {
        self.enabled_services()
            .map(|(_, cfg)| cfg.sublimit)
            .fold(0u64, u64::saturating_add)
    }

    /// When any OPD service is enabled, its sublimits must sum to the wallet.
    pub fn check_opd_invariant(&self) -> Result<(), OpdMismatch> {
        if self.enabled_services().next().is_none() {
            return Ok(());
        }
        let sublimit_total = self.sublimit_total();
        if sublimit_total == self.opd_wallet {
            Ok(())
        } else {
            Err(OpdMismatch {
                wallet: self.opd_wallet,
                sublimit_total,
            })
        }
    }
}
