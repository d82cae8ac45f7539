//! Plan executor
//!
//! Applies a plan against NetBox. Create actions resolve the VM's cluster
//! lineage (cluster group = cloud, cluster = folder) via get-or-create,
//! create the VM with mapped fields, then one virtual disk per cloud disk,
//! then one interface per NIC with its internal and NAT addresses. Update
//! actions push the differ's patch. Every action is independently
//! fallible: a failure is recorded and execution moves on to the next
//! action.

use crate::differ::map_status;
use crate::error::SyncError;
use crate::ip_repair::{host_address, set_primary_ip};
use crate::plan::{Action, SyncPlan};
use crate::report::{Reporter, RunEvent};
use ipnet::Ipv4Net;
use netbox_client::{
    Cluster, ClusterGroup, ClusterType, CmdbFeatures, IPAddress, IpStatus, NetBoxClientTrait,
    NetBoxError, NewIPAddress, NewVMInterface, NewVirtualDisk, NewVirtualMachine, Prefix, Site,
    VM_INTERFACE_OBJECT_TYPE,
};
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};
use yc_client::{CloudInventory, CloudVm, NicRecord};

/// Look up a site by name, creating it if absent
pub async fn ensure_site<C: NetBoxClientTrait + ?Sized>(
    client: &C,
    name: &str,
) -> Result<Site, NetBoxError> {
    let existing = client.query_sites(&[("name", name)]).await?;
    if let Some(site) = existing.into_iter().next() {
        return Ok(site);
    }
    info!("Creating site {name}");
    client.create_site(name).await
}

/// Look up a cluster group by name, creating it if absent
pub async fn ensure_cluster_group<C: NetBoxClientTrait + ?Sized>(
    client: &C,
    name: &str,
) -> Result<ClusterGroup, NetBoxError> {
    let existing = client.query_cluster_groups(&[("name", name)]).await?;
    if let Some(group) = existing.into_iter().next() {
        return Ok(group);
    }
    info!("Creating cluster group {name}");
    client.create_cluster_group(name).await
}

/// Look up a cluster type by name, creating it if absent
pub async fn ensure_cluster_type<C: NetBoxClientTrait + ?Sized>(
    client: &C,
    name: &str,
) -> Result<ClusterType, NetBoxError> {
    let existing = client.query_cluster_types(&[("name", name)]).await?;
    if let Some(cluster_type) = existing.into_iter().next() {
        return Ok(cluster_type);
    }
    info!("Creating cluster type {name}");
    client.create_cluster_type(name).await
}

/// Look up a cluster by name, creating it if absent
pub async fn ensure_cluster<C: NetBoxClientTrait + ?Sized>(
    client: &C,
    name: &str,
    type_id: u64,
    group_id: u64,
    site_id: u64,
) -> Result<Cluster, NetBoxError> {
    let existing = client.query_clusters(&[("name", name)]).await?;
    if let Some(cluster) = existing.into_iter().next() {
        return Ok(cluster);
    }
    info!("Creating cluster {name}");
    client.create_cluster(name, type_id, group_id, site_id).await
}

/// Look up a prefix by CIDR, creating it if absent
pub async fn ensure_prefix<C: NetBoxClientTrait + ?Sized>(
    client: &C,
    prefix: &str,
    site_id: u64,
    description: &str,
) -> Result<Prefix, NetBoxError> {
    let existing = client.query_prefixes(&[("prefix", prefix)]).await?;
    if let Some(record) = existing.into_iter().next() {
        return Ok(record);
    }
    info!("Creating prefix {prefix} ({description})");
    client.create_prefix(prefix, site_id, description).await
}

/// Applies plan actions against NetBox
#[derive(Debug)]
pub struct Executor<'a, C: NetBoxClientTrait + ?Sized> {
    client: &'a C,
    inventory: &'a CloudInventory,
    site_id: u64,
    cluster_type_id: u64,
    features: CmdbFeatures,
}

impl<'a, C: NetBoxClientTrait + ?Sized> Executor<'a, C> {
    pub fn new(
        client: &'a C,
        inventory: &'a CloudInventory,
        site_id: u64,
        cluster_type_id: u64,
        features: CmdbFeatures,
    ) -> Self {
        Self {
            client,
            inventory,
            site_id,
            cluster_type_id,
            features,
        }
    }

    /// Apply every action in the plan, recording outcomes on the reporter.
    /// Returns the number of actions that succeeded.
    pub async fn apply(&self, plan: &SyncPlan<'_>, reporter: &mut Reporter) -> usize {
        let mut applied = 0;
        for action in &plan.actions {
            match action {
                Action::Create { cloud } => match self.create_vm(cloud).await {
                    Ok(()) => {
                        reporter.record(RunEvent::VmCreated {
                            name: cloud.name.clone(),
                        });
                        applied += 1;
                    }
                    Err(err) => reporter.record(RunEvent::VmFailed {
                        name: cloud.name.clone(),
                        error: err.to_string(),
                    }),
                },
                Action::Update {
                    cmdb,
                    patch,
                    match_type,
                } => match self.client.update_virtual_machine(cmdb.id, patch).await {
                    Ok(_) => {
                        reporter.record(RunEvent::VmUpdated {
                            name: cmdb.name.clone(),
                            fields: patch.changed_fields(),
                            match_type: *match_type,
                        });
                        applied += 1;
                    }
                    Err(err) => reporter.record(RunEvent::VmFailed {
                        name: cmdb.name.clone(),
                        error: err.to_string(),
                    }),
                },
            }
        }
        applied
    }

    /// Create one VM with its disks, interfaces and IPs.
    ///
    /// Safe against partial prior application: an existing VM in the same
    /// cluster is reused and existing interfaces are not recreated. Local
    /// disks carry no stable id, so a retry after a mid-disk failure can
    /// duplicate their records.
    async fn create_vm(&self, cloud: &CloudVm) -> Result<(), SyncError> {
        let folder = self
            .inventory
            .folder(&cloud.folder_id)
            .ok_or_else(|| SyncError::MissingLineage {
                vm: cloud.name.clone(),
                folder: cloud.folder_id.clone(),
            })?;

        let group = ensure_cluster_group(self.client, &folder.cloud_name).await?;
        let cluster = ensure_cluster(
            self.client,
            &folder.name,
            self.cluster_type_id,
            group.id,
            self.site_id,
        )
        .await?;

        let existing = self
            .client
            .query_virtual_machines(&[("name", &cloud.name)], false)
            .await?;
        let vm = match existing
            .into_iter()
            .find(|vm| vm.cluster.as_ref().is_some_and(|c| c.id == cluster.id))
        {
            Some(vm) => {
                debug!("VM {} already exists in cluster {}, resuming", vm.name, cluster.name);
                vm
            }
            None => {
                self.client
                    .create_virtual_machine(&NewVirtualMachine {
                        name: cloud.name.clone(),
                        status: map_status(cloud),
                        cluster: cluster.id,
                        vcpus: cloud.vcpus(),
                        memory: cloud.memory_mb(),
                        disk: cloud.disk_total_mb(),
                    })
                    .await?
            }
        };

        if self.features.virtual_disks {
            for disk in &cloud.disks {
                let request = NewVirtualDisk {
                    virtual_machine: vm.id,
                    name: disk.name.clone(),
                    size: disk.size_mb(),
                    description: disk.id.clone().unwrap_or_default(),
                };
                if let Err(err) = self.client.create_virtual_disk(&request).await {
                    warn!("Failed to create disk {} on VM {}: {err}", disk.name, vm.name);
                }
            }
        } else {
            debug!(
                "Virtual disks endpoint unavailable, skipping {} disks for VM {}",
                cloud.disks.len(),
                vm.name
            );
        }

        let vm_id = vm.id.to_string();
        let existing_interfaces = self
            .client
            .query_vm_interfaces(&[("virtual_machine_id", &vm_id)], true)
            .await?;
        let mut primary_candidate: Option<IPAddress> = None;

        for nic in &cloud.interfaces {
            let name = format!("eth{}", nic.index);
            let interface = match existing_interfaces.iter().find(|i| i.name == name) {
                Some(interface) => interface.clone(),
                None => {
                    self.client
                        .create_vm_interface(&NewVMInterface {
                            virtual_machine: vm.id,
                            name: name.clone(),
                            kind: "virtual".to_string(),
                        })
                        .await?
                }
            };

            if let Some(address) = nic.internal_address.as_deref() {
                match self.attach_ip(interface.id, address, nic).await {
                    Ok(Some(ip)) => {
                        if primary_candidate.is_none() {
                            primary_candidate = Some(ip);
                        }
                    }
                    Ok(None) => {}
                    Err(err) => warn!(
                        "Failed to attach {address} to {name} on VM {}: {err}",
                        vm.name
                    ),
                }
            }
            if let Some(address) = nic.nat_address.as_deref() {
                if let Err(err) = self.attach_ip(interface.id, address, nic).await {
                    warn!(
                        "Failed to attach NAT address {address} to {name} on VM {}: {err}",
                        vm.name
                    );
                }
            }
        }

        if let Some(ip) = primary_candidate {
            set_primary_ip(self.client, &vm, &ip, false).await?;
        }
        Ok(())
    }

    /// Get-or-create an IP and make sure it is assigned to `interface_id`.
    ///
    /// The lookup tries the canonical address first, then falls back to a
    /// host-address search to catch records stored with a different mask.
    /// An address already assigned to some other interface is left alone.
    /// Returns the attached IP, or `None` when the assignment was skipped.
    async fn attach_ip(
        &self,
        interface_id: u64,
        raw: &str,
        nic: &NicRecord,
    ) -> Result<Option<IPAddress>, NetBoxError> {
        let canonical = self.canonical_address(raw, nic);
        let host = host_address(&canonical);

        let exact = self
            .client
            .query_ip_addresses(&[("address", &canonical)], false)
            .await?;
        let existing = match exact.into_iter().next() {
            Some(ip) => Some(ip),
            None => self
                .client
                .query_ip_addresses(&[("q", host)], false)
                .await?
                .into_iter()
                .find(|ip| host_address(&ip.address) == host),
        };

        match existing {
            Some(ip) => match ip.assigned_object_id {
                Some(assigned) if assigned == interface_id => Ok(Some(ip)),
                Some(assigned) => {
                    warn!(
                        "IP {} is already assigned to interface {assigned}, not reassigning",
                        ip.address
                    );
                    Ok(None)
                }
                None => {
                    let ip = self.client.reassign_ip_address(ip.id, interface_id).await?;
                    Ok(Some(ip))
                }
            },
            None => {
                let ip = self
                    .client
                    .create_ip_address(&NewIPAddress {
                        address: canonical,
                        status: IpStatus::Active,
                        assigned_object_type: VM_INTERFACE_OBJECT_TYPE.to_string(),
                        assigned_object_id: interface_id,
                        description: nic.subnet_name.clone().unwrap_or_default(),
                    })
                    .await?;
                Ok(Some(ip))
            }
        }
    }

    /// Canonicalize an address to CIDR form. The mask comes from the NIC's
    /// own subnet when it contains the address, then from any fetched
    /// subnet that does, then defaults to /32 (which covers NAT addresses,
    /// never part of a fetched subnet).
    fn canonical_address(&self, raw: &str, nic: &NicRecord) -> String {
        if raw.contains('/') {
            return raw.to_string();
        }
        let Ok(addr) = raw.parse::<Ipv4Addr>() else {
            return format!("{raw}/32");
        };

        let own_subnet = nic
            .subnet_id
            .as_deref()
            .and_then(|id| self.inventory.subnet(id))
            .and_then(|subnet| subnet.cidr.as_deref())
            .and_then(|cidr| cidr.parse::<Ipv4Net>().ok())
            .filter(|net| net.contains(&addr));
        let containing = own_subnet.or_else(|| {
            self.inventory
                .subnets
                .iter()
                .filter_map(|subnet| subnet.cidr.as_deref()?.parse::<Ipv4Net>().ok())
                .find(|net| net.contains(&addr))
        });

        match containing {
            Some(net) => format!("{addr}/{}", net.prefix_len()),
            None => format!("{addr}/32"),
        }
    }
}
