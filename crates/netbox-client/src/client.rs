//! NetBox API client
//!
//! Concrete `reqwest`-backed implementation of [`NetBoxClientTrait`] against
//! the NetBox REST API (`/api/virtualization/...`, `/api/ipam/...`).

use crate::error::NetBoxError;
use crate::http::HttpClient;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// NetBox API client
#[derive(Debug)]
pub struct NetBoxClient {
    http: HttpClient,
}

impl NetBoxClient {
    /// Create a new NetBox client
    ///
    /// # Arguments
    /// * `base_url` - NetBox base URL (e.g. "http://netbox:80")
    /// * `token` - API token for authentication
    pub fn new(base_url: String, token: String) -> Result<Self, NetBoxError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http: HttpClient::new(client, base_url, token),
        })
    }
}

#[async_trait::async_trait]
impl NetBoxClientTrait for NetBoxClient {
    fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Validate the API token by hitting the lightweight status endpoint.
    async fn validate_token(&self) -> Result<(), NetBoxError> {
        debug!("Validating NetBox token and connectivity");
        let status = self.http.probe("/api/status/").await?;
        if status == 401 || status == 403 {
            return Err(NetBoxError::Api(format!("Invalid token: {status}")));
        }
        if !status.is_success() {
            return Err(NetBoxError::Api(format!("Failed to validate token: {status}")));
        }
        Ok(())
    }

    /// Probe optional endpoints once. The virtual-disks endpoint only exists
    /// on NetBox 3.7+; a 404 there means disks cannot be tracked.
    async fn supported_features(&self) -> Result<CmdbFeatures, NetBoxError> {
        let status = self.http.probe("/api/virtualization/virtual-disks/?limit=1").await?;
        let virtual_disks = status.is_success();
        if !virtual_disks {
            debug!("Virtual disks endpoint not available (status {status})");
        }
        Ok(CmdbFeatures { virtual_disks })
    }

    async fn query_sites(&self, filters: &[(&str, &str)]) -> Result<Vec<Site>, NetBoxError> {
        self.http.query("dcim/sites", filters, false).await
    }

    async fn create_site(&self, name: &str) -> Result<Site, NetBoxError> {
        let body = serde_json::json!({
            "name": name,
            "slug": slugify(name),
            "status": "active",
        });
        self.http.post("/api/dcim/sites/", &body).await
    }

    async fn query_cluster_groups(&self, filters: &[(&str, &str)]) -> Result<Vec<ClusterGroup>, NetBoxError> {
        self.http.query("virtualization/cluster-groups", filters, false).await
    }

    async fn create_cluster_group(&self, name: &str) -> Result<ClusterGroup, NetBoxError> {
        let body = serde_json::json!({
            "name": name,
            "slug": slugify(name),
        });
        self.http.post("/api/virtualization/cluster-groups/", &body).await
    }

    async fn query_cluster_types(&self, filters: &[(&str, &str)]) -> Result<Vec<ClusterType>, NetBoxError> {
        self.http.query("virtualization/cluster-types", filters, false).await
    }

    async fn create_cluster_type(&self, name: &str) -> Result<ClusterType, NetBoxError> {
        let body = serde_json::json!({
            "name": name,
            "slug": slugify(name),
        });
        self.http.post("/api/virtualization/cluster-types/", &body).await
    }

    async fn query_clusters(&self, filters: &[(&str, &str)]) -> Result<Vec<Cluster>, NetBoxError> {
        self.http.query("virtualization/clusters", filters, false).await
    }

    async fn create_cluster(&self, name: &str, type_id: u64, group_id: u64, site_id: u64) -> Result<Cluster, NetBoxError> {
        let body = serde_json::json!({
            "name": name,
            "slug": slugify(name),
            "type": type_id,
            "group": group_id,
            "site": site_id,
        });
        self.http.post("/api/virtualization/clusters/", &body).await
    }

    async fn query_virtual_machines(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<VirtualMachine>, NetBoxError> {
        self.http.query("virtualization/virtual-machines", filters, fetch_all).await
    }

    async fn get_virtual_machine(&self, id: u64) -> Result<VirtualMachine, NetBoxError> {
        self.http.get(&format!("/api/virtualization/virtual-machines/{id}/")).await
    }

    async fn create_virtual_machine(&self, request: &NewVirtualMachine) -> Result<VirtualMachine, NetBoxError> {
        let body = serde_json::to_value(request)?;
        self.http.post("/api/virtualization/virtual-machines/", &body).await
    }

    async fn update_virtual_machine(&self, id: u64, patch: &VmPatch) -> Result<VirtualMachine, NetBoxError> {
        if patch.is_empty() {
            return Err(NetBoxError::InvalidRequest(format!("empty patch for VM {id}")));
        }
        let body = serde_json::to_value(patch)?;
        self.http.patch(&format!("/api/virtualization/virtual-machines/{id}/"), &body).await
    }

    async fn set_primary_ip4(&self, vm_id: u64, ip_id: u64) -> Result<VirtualMachine, NetBoxError> {
        let body = serde_json::json!({ "primary_ip4": ip_id });
        self.http.patch(&format!("/api/virtualization/virtual-machines/{vm_id}/"), &body).await
    }

    async fn create_virtual_disk(&self, request: &NewVirtualDisk) -> Result<VirtualDisk, NetBoxError> {
        let body = serde_json::to_value(request)?;
        self.http.post("/api/virtualization/virtual-disks/", &body).await
    }

    async fn query_vm_interfaces(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<VMInterface>, NetBoxError> {
        self.http.query("virtualization/interfaces", filters, fetch_all).await
    }

    async fn create_vm_interface(&self, request: &NewVMInterface) -> Result<VMInterface, NetBoxError> {
        let body = serde_json::to_value(request)?;
        self.http.post("/api/virtualization/interfaces/", &body).await
    }

    async fn query_prefixes(&self, filters: &[(&str, &str)]) -> Result<Vec<Prefix>, NetBoxError> {
        self.http.query("ipam/prefixes", filters, false).await
    }

    async fn create_prefix(&self, prefix: &str, site_id: u64, description: &str) -> Result<Prefix, NetBoxError> {
        let body = serde_json::json!({
            "prefix": prefix,
            "site": site_id,
            "description": description,
        });
        self.http.post("/api/ipam/prefixes/", &body).await
    }

    async fn query_ip_addresses(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<IPAddress>, NetBoxError> {
        self.http.query("ipam/ip-addresses", filters, fetch_all).await
    }

    async fn get_ip_address(&self, id: u64) -> Result<IPAddress, NetBoxError> {
        self.http.get(&format!("/api/ipam/ip-addresses/{id}/")).await
    }

    async fn create_ip_address(&self, request: &NewIPAddress) -> Result<IPAddress, NetBoxError> {
        let body = serde_json::to_value(request)?;
        self.http.post("/api/ipam/ip-addresses/", &body).await
    }

    async fn reassign_ip_address(&self, id: u64, interface_id: u64) -> Result<IPAddress, NetBoxError> {
        let body = serde_json::json!({
            "assigned_object_type": VM_INTERFACE_OBJECT_TYPE,
            "assigned_object_id": interface_id,
        });
        self.http.patch(&format!("/api/ipam/ip-addresses/{id}/"), &body).await
    }

    async fn delete_ip_address(&self, id: u64) -> Result<(), NetBoxError> {
        self.http.delete(&format!("/api/ipam/ip-addresses/{id}/")).await
    }
}
