//! VM matcher
//!
//! Pairs cloud VMs with NetBox VMs. The full key is (name, folder name,
//! cloud name) on the cloud side and (name, cluster name, cluster group
//! name) on the NetBox side; a NetBox VM without a cluster cannot take
//! part in full-key matching. A degraded name-only pass can be enabled to
//! re-find VMs that were manually moved between clusters in NetBox.
//!
//! Cloud VMs are walked in inventory order, so the partition is
//! deterministic for a fixed pair of input sets.

use netbox_client::VirtualMachine;
use std::collections::HashMap;
use yc_client::CloudVm;

/// How a pair was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// Matched on (name, cluster, cluster group)
    Exact,
    /// Matched on name alone
    NameOnly,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::NameOnly => "name-only",
        }
    }
}

/// A cloud VM paired with its NetBox counterpart
#[derive(Debug)]
pub struct MatchedPair<'a> {
    pub cloud: &'a CloudVm,
    pub cmdb: &'a VirtualMachine,
    pub match_type: MatchType,
}

/// Partition of the cloud VM set produced by [`match_inventory`]
#[derive(Debug, Default)]
pub struct MatchOutcome<'a> {
    pub matched: Vec<MatchedPair<'a>>,
    /// Cloud VMs with no NetBox counterpart; these become creates.
    pub unmatched: Vec<&'a CloudVm>,
}

type FullKey<'a> = (&'a str, &'a str, &'a str);

/// Partition cloud VMs into matched pairs and create candidates.
///
/// No VM on either side is matched more than once. When several NetBox VMs
/// share a name, the first in enumeration order wins; NetBox names are
/// expected to be unique, so this is a tie-break of last resort rather
/// than a guarantee.
pub fn match_inventory<'a>(
    cloud_vms: &'a [CloudVm],
    cmdb_vms: &'a [VirtualMachine],
    name_fallback: bool,
) -> MatchOutcome<'a> {
    let mut full_keys: HashMap<FullKey<'a>, usize> = HashMap::new();
    let mut names: HashMap<&'a str, Vec<usize>> = HashMap::new();
    for (index, vm) in cmdb_vms.iter().enumerate() {
        if let Some(cluster) = &vm.cluster {
            if let Some(group) = &cluster.group {
                full_keys
                    .entry((vm.name.as_str(), cluster.name.as_str(), group.name.as_str()))
                    .or_insert(index);
            }
        }
        names.entry(vm.name.as_str()).or_default().push(index);
    }

    let mut consumed = vec![false; cmdb_vms.len()];
    let mut outcome = MatchOutcome::default();
    let mut leftover: Vec<&'a CloudVm> = Vec::new();

    for cloud in cloud_vms {
        let key = (
            cloud.name.as_str(),
            cloud.folder_name.as_str(),
            cloud.cloud_name.as_str(),
        );
        match full_keys.get(&key) {
            Some(&index) if !consumed[index] => {
                consumed[index] = true;
                outcome.matched.push(MatchedPair {
                    cloud,
                    cmdb: &cmdb_vms[index],
                    match_type: MatchType::Exact,
                });
            }
            _ => leftover.push(cloud),
        }
    }

    for cloud in leftover {
        let fallback = if name_fallback {
            names
                .get(cloud.name.as_str())
                .and_then(|indices| indices.iter().copied().find(|&i| !consumed[i]))
        } else {
            None
        };
        match fallback {
            Some(index) => {
                consumed[index] = true;
                outcome.matched.push(MatchedPair {
                    cloud,
                    cmdb: &cmdb_vms[index],
                    match_type: MatchType::NameOnly,
                });
            }
            None => outcome.unmatched.push(cloud),
        }
    }

    outcome
}
