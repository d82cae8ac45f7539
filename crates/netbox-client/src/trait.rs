//! NetBoxClient trait for mocking
//!
//! Abstracts the CMDB operations the sync performs so tests can substitute
//! an in-memory mock and preview mode can stub out mutations. All async
//! methods must be `Send` to work with Tokio's work-stealing runtime.

use crate::error::NetBoxError;
use crate::models::*;

/// Trait for the NetBox API operations used by the sync
#[async_trait::async_trait]
pub trait NetBoxClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Validate the API token and connectivity
    async fn validate_token(&self) -> Result<(), NetBoxError>;

    /// Report which optional endpoints this NetBox instance supports.
    /// Consulted once per run, not per call.
    async fn supported_features(&self) -> Result<CmdbFeatures, NetBoxError>;

    // DCIM
    async fn query_sites(&self, filters: &[(&str, &str)]) -> Result<Vec<Site>, NetBoxError>;
    async fn create_site(&self, name: &str) -> Result<Site, NetBoxError>;

    // Virtualization: containers
    async fn query_cluster_groups(&self, filters: &[(&str, &str)]) -> Result<Vec<ClusterGroup>, NetBoxError>;
    async fn create_cluster_group(&self, name: &str) -> Result<ClusterGroup, NetBoxError>;
    async fn query_cluster_types(&self, filters: &[(&str, &str)]) -> Result<Vec<ClusterType>, NetBoxError>;
    async fn create_cluster_type(&self, name: &str) -> Result<ClusterType, NetBoxError>;
    async fn query_clusters(&self, filters: &[(&str, &str)]) -> Result<Vec<Cluster>, NetBoxError>;
    async fn create_cluster(&self, name: &str, type_id: u64, group_id: u64, site_id: u64) -> Result<Cluster, NetBoxError>;

    // Virtualization: machines
    async fn query_virtual_machines(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<VirtualMachine>, NetBoxError>;
    async fn get_virtual_machine(&self, id: u64) -> Result<VirtualMachine, NetBoxError>;
    async fn create_virtual_machine(&self, request: &NewVirtualMachine) -> Result<VirtualMachine, NetBoxError>;
    async fn update_virtual_machine(&self, id: u64, patch: &VmPatch) -> Result<VirtualMachine, NetBoxError>;
    async fn set_primary_ip4(&self, vm_id: u64, ip_id: u64) -> Result<VirtualMachine, NetBoxError>;
    async fn create_virtual_disk(&self, request: &NewVirtualDisk) -> Result<VirtualDisk, NetBoxError>;
    async fn query_vm_interfaces(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<VMInterface>, NetBoxError>;
    async fn create_vm_interface(&self, request: &NewVMInterface) -> Result<VMInterface, NetBoxError>;

    // IPAM
    async fn query_prefixes(&self, filters: &[(&str, &str)]) -> Result<Vec<Prefix>, NetBoxError>;
    async fn create_prefix(&self, prefix: &str, site_id: u64, description: &str) -> Result<Prefix, NetBoxError>;
    async fn query_ip_addresses(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<IPAddress>, NetBoxError>;
    async fn get_ip_address(&self, id: u64) -> Result<IPAddress, NetBoxError>;
    async fn create_ip_address(&self, request: &NewIPAddress) -> Result<IPAddress, NetBoxError>;
    async fn reassign_ip_address(&self, id: u64, interface_id: u64) -> Result<IPAddress, NetBoxError>;
    async fn delete_ip_address(&self, id: u64) -> Result<(), NetBoxError>;
}
