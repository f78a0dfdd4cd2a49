//! Benefit actions a matched rule applies to a resolution.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── OPD services ────────────────────────────────────────────────────

/// Outpatient (OPD) services that can carry their own sublimit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpdService {
    Consultation,
    Diagnostics,
    Medicines,
    Dental,
    #[serde(alias = "vision_care")]
    VisionCare,
}

impl OpdService {
    pub const ALL: [OpdService; 5] = [
        OpdService::Consultation,
        OpdService::Diagnostics,
        OpdService::Medicines,
        OpdService::Dental,
        OpdService::VisionCare,
    ];

    /// Name as written in rule documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpdService::Consultation => "consultation",
            OpdService::Diagnostics => "diagnostics",
            OpdService::Medicines => "medicines",
            OpdService::Dental => "dental",
            OpdService::VisionCare => "visionCare",
        }
    }
}

impl fmt::Display for OpdService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which family members may use a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyCoverage {
    #[serde(default)]
    pub spouse: bool,
    #[serde(default)]
    pub parents: bool,
    #[serde(default)]
    pub parents_in_law: bool,
}

// ── Actions ─────────────────────────────────────────────────────────

/// One mutation of a benefit resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    AssignBenefitGroup {
        group: String,
    },
    SetOpdWallet {
        amount: u64,
    },
    EnableAhc {
        packages: BTreeSet<String>,
        #[serde(default)]
        include_spouse: bool,
    },
    /// Enable one OPD service with its limits.
    ConfigureOpdService {
        service: OpdService,
        sublimit: u64,
        #[serde(default)]
        transaction_limit: Option<u64>,
        #[serde(default)]
        reimbursement: bool,
    },
    SetFamilyCoverage {
        service: OpdService,
        #[serde(default)]
        coverage: FamilyCoverage,
    },
    /// Add tests on top of the AHC packages. Additive, never conflicts.
    AddTests {
        tests: BTreeSet<String>,
    },
    BlockEligibility {
        #[serde(default)]
        reason: Option<String>,
    },
    SendNotification {
        template: String,
    },
}

/// Action discriminant, used for impact statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    AssignBenefitGroup,
    SetOpdWallet,
    EnableAhc,
    ConfigureOpdService,
    SetFamilyCoverage,
    AddTests,
    BlockEligibility,
    SendNotification,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::AssignBenefitGroup => "assign_benefit_group",
            ActionKind::SetOpdWallet => "set_opd_wallet",
            ActionKind::EnableAhc => "enable_ahc",
            ActionKind::ConfigureOpdService => "configure_opd_service",
            ActionKind::SetFamilyCoverage => "set_family_coverage",
            ActionKind::AddTests => "add_tests",
            ActionKind::BlockEligibility => "block_eligibility",
            ActionKind::SendNotification => "send_notification",
        }
    }

    pub const ALL: [ActionKind; 8] = [
        ActionKind::AssignBenefitGroup,
        ActionKind::SetOpdWallet,
        ActionKind::EnableAhc,
        ActionKind::ConfigureOpdService,
        ActionKind::SetFamilyCoverage,
        ActionKind::AddTests,
        ActionKind::BlockEligibility,
        ActionKind::SendNotification,
    ];
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolution field that conflicting actions compete for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionField {
    BenefitGroup,
    OpdWallet,
    Ahc,
    OpdService(OpdService),
    FamilyAccess(OpdService),
}

impl fmt::Display for ResolutionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionField::BenefitGroup => write!(f, "benefit_group"),
            ResolutionField::OpdWallet => write!(f, "opd_wallet"),
            ResolutionField::Ahc => write!(f, "ahc"),
            ResolutionField::OpdService(s) => write!(f, "opd_services.{}", s),
            ResolutionField::FamilyAccess(s) => write!(f, "opd_services.{}.family_access", s),
        }
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::AssignBenefitGroup { .. } => ActionKind::AssignBenefitGroup,
            Action::SetOpdWallet { .. } => ActionKind::SetOpdWallet,
            Action::EnableAhc { .. } => ActionKind::EnableAhc,
            Action::ConfigureOpdService { .. } => ActionKind::ConfigureOpdService,
            Action::SetFamilyCoverage { .. } => ActionKind::SetFamilyCoverage,
            Action::AddTests { .. } => ActionKind::AddTests,
            Action::BlockEligibility { .. } => ActionKind::BlockEligibility,
            Action::SendNotification { .. } => ActionKind::SendNotification,
        }
    }

    /// Field this action overwrites, if it competes with other rules for one.
    pub fn field(&self) -> Option<ResolutionField> {
        match self {
            Action::AssignBenefitGroup { .. } => Some(ResolutionField::BenefitGroup),
            Action::SetOpdWallet { .. } => Some(ResolutionField::OpdWallet),
            Action::EnableAhc { .. } => Some(ResolutionField::Ahc),
            Action::ConfigureOpdService { service, .. } => {
                Some(ResolutionField::OpdService(*service))
            }
            Action::SetFamilyCoverage { service, .. } => {
                Some(ResolutionField::FamilyAccess(*service))
            }
            Action::AddTests { .. }
            | Action::BlockEligibility { .. }
            | Action::SendNotification { .. } => None,
        }
    }

    /// Check the action's own fields. Returns a message on failure.
    pub(crate) fn check(&self) -> Result<(), String> {
        match self {
            Action::AssignBenefitGroup { group } if group.trim().is_empty() => {
                Err("benefit group must not be empty".to_string())
            }
            Action::EnableAhc { packages, .. } if packages.is_empty() => {
                Err("enable_ahc needs at least one package".to_string())
            }
            Action::AddTests { tests } if tests.is_empty() => {
                Err("add_tests needs at least one test".to_string())
            }
            Action::ConfigureOpdService {
                service,
                sublimit,
                transaction_limit: Some(limit),
                ..
            } if limit > sublimit => Err(format!(
                "{} transaction limit {} exceeds sublimit {}",
                service, limit, sublimit
            )),
            Action::SendNotification { template } if template.trim().is_empty() => {
                Err("notification template must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}
