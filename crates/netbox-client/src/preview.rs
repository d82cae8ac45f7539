//! Preview-mode client wrapper
//!
//! Wraps any [`NetBoxClientTrait`] implementation, delegating read
//! operations and stubbing every mutating call: the would-be change is
//! logged and a synthetic record with a sentinel id is returned so callers
//! can keep resolving references through a dry run without touching NetBox.

use crate::error::NetBoxError;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Synthetic ids start well above anything a real instance hands out, so a
/// preview log line is recognizable at a glance.
const SYNTHETIC_ID_BASE: u64 = 1_000_000;

/// Read-through, write-stubbing wrapper for dry runs
#[derive(Debug)]
pub struct PreviewClient<C> {
    inner: C,
    next_id: AtomicU64,
}

impl<C> PreviewClient<C> {
    /// Wrap a real client for a preview run
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            next_id: AtomicU64::new(SYNTHETIC_ID_BASE),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn url(&self, endpoint: &str, id: u64) -> String
    where
        C: NetBoxClientTrait,
    {
        format!("{}/api/{}/{}/", self.inner.base_url(), endpoint, id)
    }

    /// Resolve a VM for in-place preview edits. Synthetic ids belong to
    /// records fabricated earlier in the same dry run, so a placeholder is
    /// returned instead of asking the real instance.
    async fn resolve_vm(&self, id: u64) -> Result<VirtualMachine, NetBoxError>
    where
        C: NetBoxClientTrait,
    {
        match self.inner.get_virtual_machine(id).await {
            Ok(vm) => Ok(vm),
            Err(NetBoxError::NotFound(_)) if id >= SYNTHETIC_ID_BASE => Ok(VirtualMachine {
                id,
                url: self.url("virtualization/virtual-machines", id),
                name: String::new(),
                status: VmStatus::Active,
                cluster: None,
                vcpus: None,
                memory: None,
                disk: None,
                primary_ip4: None,
            }),
            Err(err) => Err(err),
        }
    }
}

#[async_trait::async_trait]
impl<C: NetBoxClientTrait> NetBoxClientTrait for PreviewClient<C> {
    fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    async fn validate_token(&self) -> Result<(), NetBoxError> {
        self.inner.validate_token().await
    }

    async fn supported_features(&self) -> Result<CmdbFeatures, NetBoxError> {
        self.inner.supported_features().await
    }

    async fn query_sites(&self, filters: &[(&str, &str)]) -> Result<Vec<Site>, NetBoxError> {
        self.inner.query_sites(filters).await
    }

    async fn create_site(&self, name: &str) -> Result<Site, NetBoxError> {
        info!("[dry-run] Would create site: {name}");
        let id = self.next_id();
        Ok(Site {
            id,
            url: self.url("dcim/sites", id),
            name: name.to_string(),
            slug: slugify(name),
        })
    }

    async fn query_cluster_groups(&self, filters: &[(&str, &str)]) -> Result<Vec<ClusterGroup>, NetBoxError> {
        self.inner.query_cluster_groups(filters).await
    }

    async fn create_cluster_group(&self, name: &str) -> Result<ClusterGroup, NetBoxError> {
        info!("[dry-run] Would create cluster group: {name}");
        let id = self.next_id();
        Ok(ClusterGroup {
            id,
            url: self.url("virtualization/cluster-groups", id),
            name: name.to_string(),
            slug: slugify(name),
        })
    }

    async fn query_cluster_types(&self, filters: &[(&str, &str)]) -> Result<Vec<ClusterType>, NetBoxError> {
        self.inner.query_cluster_types(filters).await
    }

    async fn create_cluster_type(&self, name: &str) -> Result<ClusterType, NetBoxError> {
        info!("[dry-run] Would create cluster type: {name}");
        let id = self.next_id();
        Ok(ClusterType {
            id,
            url: self.url("virtualization/cluster-types", id),
            name: name.to_string(),
            slug: slugify(name),
        })
    }

    async fn query_clusters(&self, filters: &[(&str, &str)]) -> Result<Vec<Cluster>, NetBoxError> {
        self.inner.query_clusters(filters).await
    }

    async fn create_cluster(&self, name: &str, _type_id: u64, group_id: u64, site_id: u64) -> Result<Cluster, NetBoxError> {
        info!("[dry-run] Would create cluster: {name}");
        let id = self.next_id();
        Ok(Cluster {
            id,
            url: self.url("virtualization/clusters", id),
            name: name.to_string(),
            group: Some(NamedRef { id: group_id, name: String::new() }),
            site: Some(NamedRef { id: site_id, name: String::new() }),
        })
    }

    async fn query_virtual_machines(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<VirtualMachine>, NetBoxError> {
        self.inner.query_virtual_machines(filters, fetch_all).await
    }

    async fn get_virtual_machine(&self, id: u64) -> Result<VirtualMachine, NetBoxError> {
        self.inner.get_virtual_machine(id).await
    }

    async fn create_virtual_machine(&self, request: &NewVirtualMachine) -> Result<VirtualMachine, NetBoxError> {
        info!("[dry-run] Would create VM: {} in cluster {}", request.name, request.cluster);
        let id = self.next_id();
        Ok(VirtualMachine {
            id,
            url: self.url("virtualization/virtual-machines", id),
            name: request.name.clone(),
            status: request.status,
            cluster: None,
            vcpus: Some(request.vcpus),
            memory: Some(request.memory),
            disk: Some(request.disk),
            primary_ip4: None,
        })
    }

    async fn update_virtual_machine(&self, id: u64, patch: &VmPatch) -> Result<VirtualMachine, NetBoxError> {
        info!("[dry-run] Would update VM {id} with fields {:?}", patch.changed_fields());
        let mut vm = self.resolve_vm(id).await?;
        if let Some(status) = patch.status {
            vm.status = status;
        }
        if let Some(vcpus) = patch.vcpus {
            vm.vcpus = Some(vcpus);
        }
        if let Some(memory) = patch.memory {
            vm.memory = Some(memory);
        }
        if let Some(disk) = patch.disk {
            vm.disk = Some(disk);
        }
        Ok(vm)
    }

    async fn set_primary_ip4(&self, vm_id: u64, ip_id: u64) -> Result<VirtualMachine, NetBoxError> {
        info!("[dry-run] Would set IP {ip_id} as primary for VM {vm_id}");
        let mut vm = self.resolve_vm(vm_id).await?;
        vm.primary_ip4 = Some(IpRef { id: ip_id, address: String::new() });
        Ok(vm)
    }

    async fn create_virtual_disk(&self, request: &NewVirtualDisk) -> Result<VirtualDisk, NetBoxError> {
        info!("[dry-run] Would create disk: {} for VM {}", request.name, request.virtual_machine);
        let id = self.next_id();
        Ok(VirtualDisk {
            id,
            url: self.url("virtualization/virtual-disks", id),
            name: request.name.clone(),
            size: request.size,
        })
    }

    async fn query_vm_interfaces(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<VMInterface>, NetBoxError> {
        self.inner.query_vm_interfaces(filters, fetch_all).await
    }

    async fn create_vm_interface(&self, request: &NewVMInterface) -> Result<VMInterface, NetBoxError> {
        info!("[dry-run] Would create interface: {} for VM {}", request.name, request.virtual_machine);
        let id = self.next_id();
        Ok(VMInterface {
            id,
            url: self.url("virtualization/interfaces", id),
            name: request.name.clone(),
            virtual_machine: NamedRef { id: request.virtual_machine, name: String::new() },
        })
    }

    async fn query_prefixes(&self, filters: &[(&str, &str)]) -> Result<Vec<Prefix>, NetBoxError> {
        self.inner.query_prefixes(filters).await
    }

    async fn create_prefix(&self, prefix: &str, _site_id: u64, description: &str) -> Result<Prefix, NetBoxError> {
        info!("[dry-run] Would create prefix: {prefix} ({description})");
        let id = self.next_id();
        Ok(Prefix {
            id,
            url: self.url("ipam/prefixes", id),
            prefix: prefix.to_string(),
            description: description.to_string(),
        })
    }

    async fn query_ip_addresses(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<IPAddress>, NetBoxError> {
        self.inner.query_ip_addresses(filters, fetch_all).await
    }

    async fn get_ip_address(&self, id: u64) -> Result<IPAddress, NetBoxError> {
        match self.inner.get_ip_address(id).await {
            Ok(ip) => Ok(ip),
            Err(NetBoxError::NotFound(_)) if id >= SYNTHETIC_ID_BASE => Ok(IPAddress {
                id,
                url: self.url("ipam/ip-addresses", id),
                address: String::new(),
                status: IpStatus::Active,
                assigned_object_type: None,
                assigned_object_id: None,
                description: String::new(),
            }),
            Err(err) => Err(err),
        }
    }

    async fn create_ip_address(&self, request: &NewIPAddress) -> Result<IPAddress, NetBoxError> {
        info!("[dry-run] Would create IP: {} for interface {}", request.address, request.assigned_object_id);
        let id = self.next_id();
        Ok(IPAddress {
            id,
            url: self.url("ipam/ip-addresses", id),
            address: request.address.clone(),
            status: request.status,
            assigned_object_type: Some(request.assigned_object_type.clone()),
            assigned_object_id: Some(request.assigned_object_id),
            description: request.description.clone(),
        })
    }

    async fn reassign_ip_address(&self, id: u64, interface_id: u64) -> Result<IPAddress, NetBoxError> {
        info!("[dry-run] Would reassign IP {id} to interface {interface_id}");
        let mut ip = self.get_ip_address(id).await?;
        ip.assigned_object_type = Some(VM_INTERFACE_OBJECT_TYPE.to_string());
        ip.assigned_object_id = Some(interface_id);
        Ok(ip)
    }

    async fn delete_ip_address(&self, id: u64) -> Result<(), NetBoxError> {
        info!("[dry-run] Would delete IP {id}");
        Ok(())
    }
}
