//! Plan builder
//!
//! Turns the matcher's partition into an ordered action list: every
//! create first, then every update with a non-empty diff. The plan is the
//! unit the executor (or a dry-run preview) consumes.

use crate::differ::diff_vm;
use crate::matcher::{MatchOutcome, MatchType};
use netbox_client::{VirtualMachine, VmPatch};
use tracing::info;
use yc_client::CloudVm;

/// One pending mutation against NetBox
#[derive(Debug)]
pub enum Action<'a> {
    /// Create a VM (and its disks, interfaces and IPs) from the cloud record
    Create { cloud: &'a CloudVm },
    /// Patch an existing VM
    Update {
        cmdb: &'a VirtualMachine,
        patch: VmPatch,
        match_type: MatchType,
    },
}

/// Ordered list of actions for one run
#[derive(Debug, Default)]
pub struct SyncPlan<'a> {
    pub actions: Vec<Action<'a>>,
}

impl<'a> SyncPlan<'a> {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn creates(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::Create { .. }))
            .count()
    }

    pub fn updates(&self) -> usize {
        self.actions.len() - self.creates()
    }

    /// Print the pending plan: the first 10 creates and, per match type,
    /// the first 5 updates.
    pub fn log_preview(&self) {
        info!("Plan: {} creates, {} updates", self.creates(), self.updates());

        let creates: Vec<&CloudVm> = self
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::Create { cloud } => Some(*cloud),
                Action::Update { .. } => None,
            })
            .collect();
        for cloud in creates.iter().take(10) {
            info!(
                "  create: {} (folder {}, cloud {})",
                cloud.name, cloud.folder_name, cloud.cloud_name
            );
        }
        if creates.len() > 10 {
            info!("  ... and {} more creates", creates.len() - 10);
        }

        for match_type in [MatchType::Exact, MatchType::NameOnly] {
            let updates: Vec<(&VirtualMachine, &VmPatch)> = self
                .actions
                .iter()
                .filter_map(|a| match a {
                    Action::Update {
                        cmdb,
                        patch,
                        match_type: mt,
                    } if *mt == match_type => Some((*cmdb, patch)),
                    _ => None,
                })
                .collect();
            for (cmdb, patch) in updates.iter().take(5) {
                info!(
                    "  update ({}): {} [{}]",
                    match_type.as_str(),
                    cmdb.name,
                    patch.changed_fields().join(", ")
                );
            }
            if updates.len() > 5 {
                info!(
                    "  ... and {} more {} updates",
                    updates.len() - 5,
                    match_type.as_str()
                );
            }
        }
    }
}

/// Build the action list from the matcher's partition.
///
/// Matched pairs whose diff is empty produce no action. Name-only pairs
/// keep their tag so updates caused by a degraded match stand out in the
/// report.
pub fn build_plan<'a>(outcome: &MatchOutcome<'a>) -> SyncPlan<'a> {
    let mut plan = SyncPlan::default();

    for &cloud in &outcome.unmatched {
        plan.actions.push(Action::Create { cloud });
    }
    for pair in &outcome.matched {
        let patch = diff_vm(pair.cloud, pair.cmdb);
        if !patch.is_empty() {
            plan.actions.push(Action::Update {
                cmdb: pair.cmdb,
                patch,
                match_type: pair.match_type,
            });
        }
    }

    plan
}
