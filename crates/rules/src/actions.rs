//! Action applicator: pure transitions of a benefit resolution.
//!
//! [`apply`] never mutates its input; it returns the next state so the
//! resolver can record before/after snapshots in the trace. Conflict
//! handling between rules (priority, tie-break, block short-circuit) lives
//! in the resolver, not here.

use crate::resolution::BenefitResolution;
use crate::schema::Action;

/// Apply one action on behalf of `rule_id`, returning the new resolution.
///
/// `SendNotification` leaves the resolution unchanged; the resolver queues
/// the notification for the caller.
pub fn apply(action: &Action, resolution: &BenefitResolution, rule_id: &str) -> BenefitResolution {
    let mut next = resolution.clone();

    match action {
        Action::AssignBenefitGroup { group } => {
            next.benefit_group = Some(group.clone());
        }
        Action::SetOpdWallet { amount } => {
            next.opd_wallet = *amount;
        }
        Action::EnableAhc {
            packages,
            include_spouse,
        } => {
            next.ahc_packages = packages.clone();
            next.ahc_includes_spouse = *include_spouse;
        }
        Action::ConfigureOpdService {
            service,
            sublimit,
            transaction_limit,
            reimbursement,
        } => {
            let cfg = next.opd_services.entry(*service).or_default();
            cfg.enabled = true;
            cfg.sublimit = *sublimit;
            cfg.transaction_limit = *transaction_limit;
            cfg.reimbursement = *reimbursement;
        }
        Action::SetFamilyCoverage { service, coverage } => {
            // Coverage may be authored before the service itself is configured.
            next.opd_services.entry(*service).or_default().family_access = *coverage;
        }
        Action::AddTests { tests } => {
            next.additional_tests.extend(tests.iter().cloned());
        }
        Action::BlockEligibility { .. } => {
            next.eligible = false;
            next.blocked_by_rule_id = Some(rule_id.to_string());
        }
        Action::SendNotification { .. } => {}
    }

    next
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::schema::{FamilyCoverage, OpdService};

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn apply_does_not_mutate_input() {
        let before = BenefitResolution::new("E1");
        let after = apply(
            &Action::AssignBenefitGroup {
                group: "Executive".to_string(),
            },
            &before,
            "r1",
        );

        assert_eq!(before.benefit_group, None);
        assert_eq!(after.benefit_group.as_deref(), Some("Executive"));
    }

    #[test]
    fn block_sets_ineligible_and_records_rule() {
        let after = apply(
            &Action::BlockEligibility { reason: None },
            &BenefitResolution::new("E1"),
            "contractors-excluded",
        );
        assert!(!after.eligible);
        assert_eq!(after.blocked_by_rule_id.as_deref(), Some("contractors-excluded"));
    }

    #[test]
    fn enable_ahc_replaces_packages() {
        let first = apply(
            &Action::EnableAhc {
                packages: set(&["Basic", "Cardiac"]),
                include_spouse: true,
            },
            &BenefitResolution::new("E1"),
            "r1",
        );
        let second = apply(
            &Action::EnableAhc {
                packages: set(&["Platinum"]),
                include_spouse: false,
            },
            &first,
            "r2",
        );
        assert_eq!(second.ahc_packages, set(&["Platinum"]));
        assert!(!second.ahc_includes_spouse);
    }

    #[test]
    fn add_tests_is_additive() {
        let first = apply(
            &Action::AddTests {
                tests: set(&["HbA1c"]),
            },
            &BenefitResolution::new("E1"),
            "r1",
        );
        let second = apply(
            &Action::AddTests {
                tests: set(&["Lipid Profile"]),
            },
            &first,
            "r2",
        );
        assert_eq!(second.additional_tests, set(&["HbA1c", "Lipid Profile"]));
    }

    #[test]
    fn family_coverage_survives_service_configuration() {
        let coverage = FamilyCoverage {
            spouse: true,
            parents: true,
            parents_in_law: false,
        };
        let covered = apply(
            &Action::SetFamilyCoverage {
                service: OpdService::Dental,
                coverage,
            },
            &BenefitResolution::new("E1"),
            "r1",
        );
        assert!(!covered.opd_services[&OpdService::Dental].enabled);

        let configured = apply(
            &Action::ConfigureOpdService {
                service: OpdService::Dental,
                sublimit: 4_000,
                transaction_limit: None,
                reimbursement: true,
            },
            &covered,
            "r2",
        );
        let dental = &configured.opd_services[&OpdService::Dental];
        assert!(dental.enabled);
        assert_eq!(dental.sublimit, 4_000);
        assert!(dental.reimbursement);
        assert_eq!(dental.family_access, coverage);
    }

    #[test]
    fn notification_leaves_resolution_unchanged() {
        let before = BenefitResolution::new("E1");
        let after = apply(
            &Action::SendNotification {
                template: "welcome".to_string(),
            },
            &before,
            "r1",
        );
        assert_eq!(before, after);
    }
}
