//! IP address repair passes
//!
//! Two standalone, idempotent passes over NetBox IPAM state:
//!
//! - deduplication: collapse IP records sharing a host address down to a
//!   single survivor, repairing primary references and interface
//!   assignments before deleting the losers. Runs before planning.
//! - primary backfill: give every VM that has assigned addresses but no
//!   primary IPv4 a primary, preferring internal over public addresses.
//!   Runs after the plan executes so freshly created IPs take part.

use crate::report::{Reporter, RunEvent};
use netbox_client::{IPAddress, NetBoxClientTrait, NetBoxError, VirtualMachine};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

/// Address with any CIDR mask stripped
pub fn host_address(address: &str) -> &str {
    address.split('/').next().unwrap_or(address)
}

/// Mask length of an address, defaulting to /32 when none is present
pub fn mask_len(address: &str) -> u8 {
    address
        .split_once('/')
        .and_then(|(_, mask)| mask.parse().ok())
        .unwrap_or(32)
}

/// Whether a host address falls in a private IPv4 range. Addresses that
/// fail to parse are treated as external.
pub fn is_internal(host: &str) -> bool {
    host.parse::<Ipv4Addr>().is_ok_and(|addr| addr.is_private())
}

/// Set `ip` as the primary IPv4 of `vm`.
///
/// No-op if the address is already primary. A different existing primary
/// is never demoted. Public addresses are refused unless `allow_public` is
/// set; the backfill pass sets it only after establishing that the VM has
/// no internal candidate. Returns whether the primary was changed.
pub async fn set_primary_ip<C: NetBoxClientTrait + ?Sized>(
    client: &C,
    vm: &VirtualMachine,
    ip: &IPAddress,
    allow_public: bool,
) -> Result<bool, NetBoxError> {
    if let Some(primary) = &vm.primary_ip4 {
        if primary.id == ip.id {
            debug!("IP {} is already primary for VM {}", ip.address, vm.name);
        } else {
            warn!(
                "VM {} already has primary {}, not replacing it with {}",
                vm.name, primary.address, ip.address
            );
        }
        return Ok(false);
    }
    if !allow_public && !is_internal(host_address(&ip.address)) {
        warn!(
            "Refusing to set public address {} as primary for VM {}",
            ip.address, vm.name
        );
        return Ok(false);
    }
    client.set_primary_ip4(vm.id, ip.id).await?;
    Ok(true)
}

/// Collapse duplicate IP records so that no two share a host address.
///
/// Within a duplicate group the survivor is the member already assigned
/// to an interface, ties broken by longest mask; deleting the wired-up
/// record would require the most repair. The sort is stable, so a full
/// tie keeps the first record in NetBox enumeration order. Each loser has
/// its primary references repointed and its assignment transferred (when
/// the survivor lacks one) before it is deleted. Failures are
/// per-duplicate: one bad record does not stop the pass.
pub async fn dedup_ip_addresses<C: NetBoxClientTrait + ?Sized>(
    client: &C,
    reporter: &mut Reporter,
) -> Result<usize, NetBoxError> {
    let all = client.query_ip_addresses(&[], true).await?;
    let mut groups: BTreeMap<String, Vec<IPAddress>> = BTreeMap::new();
    for ip in all {
        groups
            .entry(host_address(&ip.address).to_string())
            .or_default()
            .push(ip);
    }

    let mut removed = 0;
    for (host, mut group) in groups {
        if group.len() < 2 {
            continue;
        }
        group.sort_by(|a, b| {
            b.assigned_object_id
                .is_some()
                .cmp(&a.assigned_object_id.is_some())
                .then_with(|| mask_len(&b.address).cmp(&mask_len(&a.address)))
        });
        let keep = &group[0];
        let mut keep_assigned = keep.assigned_object_id.is_some();
        info!(
            "Host {host} has {} IP records, keeping {}",
            group.len(),
            keep.address
        );

        for duplicate in &group[1..] {
            if let Err(err) = remove_duplicate(client, keep, &mut keep_assigned, duplicate).await {
                reporter.warn(format!(
                    "Failed to remove duplicate IP {} for host {host}: {err}",
                    duplicate.address
                ));
                continue;
            }
            reporter.record(RunEvent::DuplicateIpRemoved {
                host: host.clone(),
                kept: keep.address.clone(),
                removed: duplicate.address.clone(),
            });
            removed += 1;
        }
    }
    Ok(removed)
}

async fn remove_duplicate<C: NetBoxClientTrait + ?Sized>(
    client: &C,
    keep: &IPAddress,
    keep_assigned: &mut bool,
    duplicate: &IPAddress,
) -> Result<(), NetBoxError> {
    // Repoint any VM whose primary reference is the record being removed.
    let duplicate_id = duplicate.id.to_string();
    let holders = client
        .query_virtual_machines(&[("primary_ip4_id", &duplicate_id)], true)
        .await?;
    for vm in holders {
        info!(
            "Repointing primary of VM {} from {} to {}",
            vm.name, duplicate.address, keep.address
        );
        client.set_primary_ip4(vm.id, keep.id).await?;
    }

    if let Some(interface_id) = duplicate.assigned_object_id {
        if !*keep_assigned {
            info!(
                "Transferring interface assignment from {} to {}",
                duplicate.address, keep.address
            );
            client.reassign_ip_address(keep.id, interface_id).await?;
            *keep_assigned = true;
        }
    }

    client.delete_ip_address(duplicate.id).await
}

/// Give every VM with assigned addresses but no primary IPv4 a primary.
///
/// Candidates are collected in interface order, then in each interface's
/// IP enumeration order; the first internal address wins, falling back to
/// the first public one only when no internal address exists. VMs with no
/// assigned addresses at all are reported, not failed.
pub async fn backfill_primary_ips<C: NetBoxClientTrait + ?Sized>(
    client: &C,
    reporter: &mut Reporter,
) -> Result<usize, NetBoxError> {
    let vms = client.query_virtual_machines(&[], true).await?;
    let mut assigned = 0;

    for vm in vms.iter().filter(|vm| vm.primary_ip4.is_none()) {
        let vm_id = vm.id.to_string();
        let interfaces = client
            .query_vm_interfaces(&[("virtual_machine_id", &vm_id)], true)
            .await?;

        let mut internal = Vec::new();
        let mut external = Vec::new();
        for interface in &interfaces {
            let interface_id = interface.id.to_string();
            let ips = client
                .query_ip_addresses(&[("assigned_object_id", &interface_id)], true)
                .await?;
            for ip in ips {
                if is_internal(host_address(&ip.address)) {
                    internal.push(ip);
                } else {
                    external.push(ip);
                }
            }
        }

        let Some(candidate) = internal.first().or_else(|| external.first()) else {
            if !interfaces.is_empty() {
                reporter.warn(format!(
                    "VM {} has interfaces but no assigned IPs, cannot backfill a primary",
                    vm.name
                ));
            }
            continue;
        };

        let allow_public = internal.is_empty();
        if set_primary_ip(client, vm, candidate, allow_public).await? {
            reporter.record(RunEvent::PrimaryAssigned {
                vm: vm.name.clone(),
                address: candidate.address.clone(),
            });
            assigned += 1;
        }
    }
    Ok(assigned)
}
