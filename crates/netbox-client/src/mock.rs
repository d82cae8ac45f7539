//! Mock NetBoxClient for unit testing
//!
//! In-memory implementation of [`NetBoxClientTrait`] so the sync logic can
//! be tested without a running NetBox instance. Resources live in `Vec`s in
//! insertion order, which keeps enumeration deterministic for tests.

use crate::error::NetBoxError;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct State {
    sites: Vec<Site>,
    cluster_groups: Vec<ClusterGroup>,
    cluster_types: Vec<ClusterType>,
    clusters: Vec<Cluster>,
    prefixes: Vec<Prefix>,
    vms: Vec<VirtualMachine>,
    disks: Vec<VirtualDisk>,
    interfaces: Vec<VMInterface>,
    ips: Vec<IPAddress>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Mock NetBox client backed by in-memory stores
#[derive(Debug, Clone)]
pub struct MockNetBoxClient {
    base_url: String,
    virtual_disks: bool,
    state: Arc<Mutex<State>>,
}

impl MockNetBoxClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            virtual_disks: true,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Toggle virtual-disk endpoint support (for capability-check tests)
    pub fn with_virtual_disks(mut self, supported: bool) -> Self {
        self.virtual_disks = supported;
        self
    }

    fn url(&self, endpoint: &str, id: u64) -> String {
        format!("{}/api/{}/{}/", self.base_url, endpoint, id)
    }

    // Test-setup helpers: insert pre-existing records with caller-chosen ids.

    pub fn add_virtual_machine(&self, vm: VirtualMachine) {
        self.state.lock().unwrap().vms.push(vm);
    }

    pub fn add_vm_interface(&self, iface: VMInterface) {
        self.state.lock().unwrap().interfaces.push(iface);
    }

    pub fn add_ip_address(&self, ip: IPAddress) {
        self.state.lock().unwrap().ips.push(ip);
    }

    pub fn add_cluster(&self, cluster: Cluster) {
        self.state.lock().unwrap().clusters.push(cluster);
    }

    /// Reserve ids below this for test fixtures, so generated ids never clash.
    pub fn set_id_floor(&self, floor: u64) {
        self.state.lock().unwrap().next_id = floor;
    }

    // Snapshot accessors for assertions.

    pub fn sites(&self) -> Vec<Site> {
        self.state.lock().unwrap().sites.clone()
    }

    pub fn cluster_groups(&self) -> Vec<ClusterGroup> {
        self.state.lock().unwrap().cluster_groups.clone()
    }

    pub fn clusters(&self) -> Vec<Cluster> {
        self.state.lock().unwrap().clusters.clone()
    }

    pub fn prefixes(&self) -> Vec<Prefix> {
        self.state.lock().unwrap().prefixes.clone()
    }

    pub fn vms(&self) -> Vec<VirtualMachine> {
        self.state.lock().unwrap().vms.clone()
    }

    pub fn disks(&self) -> Vec<VirtualDisk> {
        self.state.lock().unwrap().disks.clone()
    }

    pub fn interfaces(&self) -> Vec<VMInterface> {
        self.state.lock().unwrap().interfaces.clone()
    }

    pub fn ips(&self) -> Vec<IPAddress> {
        self.state.lock().unwrap().ips.clone()
    }
}

fn matches_name(name: &str, filters: &[(&str, &str)]) -> bool {
    filters.iter().all(|(k, v)| match *k {
        "name" => name == *v,
        _ => true,
    })
}

fn matches_vm(vm: &VirtualMachine, filters: &[(&str, &str)]) -> bool {
    filters.iter().all(|(k, v)| match *k {
        "name" => vm.name == *v,
        "primary_ip4_id" => vm.primary_ip4.as_ref().map(|ip| ip.id.to_string()).as_deref() == Some(*v),
        _ => true,
    })
}

fn matches_interface(iface: &VMInterface, filters: &[(&str, &str)]) -> bool {
    filters.iter().all(|(k, v)| match *k {
        "virtual_machine_id" => iface.virtual_machine.id.to_string() == *v,
        _ => true,
    })
}

fn matches_ip(ip: &IPAddress, filters: &[(&str, &str)]) -> bool {
    filters.iter().all(|(k, v)| match *k {
        "address" => ip.address == *v,
        "q" => ip.address.contains(*v),
        "assigned_object_id" => ip.assigned_object_id.map(|id| id.to_string()).as_deref() == Some(*v),
        _ => true,
    })
}

#[async_trait::async_trait]
impl NetBoxClientTrait for MockNetBoxClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn validate_token(&self) -> Result<(), NetBoxError> {
        Ok(())
    }

    async fn supported_features(&self) -> Result<CmdbFeatures, NetBoxError> {
        Ok(CmdbFeatures {
            virtual_disks: self.virtual_disks,
        })
    }

    async fn query_sites(&self, filters: &[(&str, &str)]) -> Result<Vec<Site>, NetBoxError> {
        let state = self.state.lock().unwrap();
        Ok(state.sites.iter().filter(|s| matches_name(&s.name, filters)).cloned().collect())
    }

    async fn create_site(&self, name: &str) -> Result<Site, NetBoxError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let site = Site {
            id,
            url: self.url("dcim/sites", id),
            name: name.to_string(),
            slug: slugify(name),
        };
        state.sites.push(site.clone());
        Ok(site)
    }

    async fn query_cluster_groups(&self, filters: &[(&str, &str)]) -> Result<Vec<ClusterGroup>, NetBoxError> {
        let state = self.state.lock().unwrap();
        Ok(state.cluster_groups.iter().filter(|g| matches_name(&g.name, filters)).cloned().collect())
    }

    async fn create_cluster_group(&self, name: &str) -> Result<ClusterGroup, NetBoxError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let group = ClusterGroup {
            id,
            url: self.url("virtualization/cluster-groups", id),
            name: name.to_string(),
            slug: slugify(name),
        };
        state.cluster_groups.push(group.clone());
        Ok(group)
    }

    async fn query_cluster_types(&self, filters: &[(&str, &str)]) -> Result<Vec<ClusterType>, NetBoxError> {
        let state = self.state.lock().unwrap();
        Ok(state.cluster_types.iter().filter(|t| matches_name(&t.name, filters)).cloned().collect())
    }

    async fn create_cluster_type(&self, name: &str) -> Result<ClusterType, NetBoxError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let cluster_type = ClusterType {
            id,
            url: self.url("virtualization/cluster-types", id),
            name: name.to_string(),
            slug: slugify(name),
        };
        state.cluster_types.push(cluster_type.clone());
        Ok(cluster_type)
    }

    async fn query_clusters(&self, filters: &[(&str, &str)]) -> Result<Vec<Cluster>, NetBoxError> {
        let state = self.state.lock().unwrap();
        Ok(state.clusters.iter().filter(|c| matches_name(&c.name, filters)).cloned().collect())
    }

    async fn create_cluster(&self, name: &str, _type_id: u64, group_id: u64, site_id: u64) -> Result<Cluster, NetBoxError> {
        let mut state = self.state.lock().unwrap();
        let group = state
            .cluster_groups
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| NamedRef { id: g.id, name: g.name.clone() });
        let site = state
            .sites
            .iter()
            .find(|s| s.id == site_id)
            .map(|s| NamedRef { id: s.id, name: s.name.clone() });
        let id = state.next_id();
        let cluster = Cluster {
            id,
            url: self.url("virtualization/clusters", id),
            name: name.to_string(),
            group,
            site,
        };
        state.clusters.push(cluster.clone());
        Ok(cluster)
    }

    async fn query_virtual_machines(&self, filters: &[(&str, &str)], _fetch_all: bool) -> Result<Vec<VirtualMachine>, NetBoxError> {
        let state = self.state.lock().unwrap();
        Ok(state.vms.iter().filter(|vm| matches_vm(vm, filters)).cloned().collect())
    }

    async fn get_virtual_machine(&self, id: u64) -> Result<VirtualMachine, NetBoxError> {
        let state = self.state.lock().unwrap();
        state
            .vms
            .iter()
            .find(|vm| vm.id == id)
            .cloned()
            .ok_or_else(|| NetBoxError::NotFound(format!("VM {id} not found")))
    }

    async fn create_virtual_machine(&self, request: &NewVirtualMachine) -> Result<VirtualMachine, NetBoxError> {
        let mut state = self.state.lock().unwrap();
        let cluster = state
            .clusters
            .iter()
            .find(|c| c.id == request.cluster)
            .map(|c| VmCluster {
                id: c.id,
                name: c.name.clone(),
                group: c.group.clone(),
            })
            .ok_or_else(|| NetBoxError::InvalidRequest(format!("cluster {} not found", request.cluster)))?;
        let id = state.next_id();
        let vm = VirtualMachine {
            id,
            url: self.url("virtualization/virtual-machines", id),
            name: request.name.clone(),
            status: request.status,
            cluster: Some(cluster),
            vcpus: Some(request.vcpus),
            memory: Some(request.memory),
            disk: Some(request.disk),
            primary_ip4: None,
        };
        state.vms.push(vm.clone());
        Ok(vm)
    }

    async fn update_virtual_machine(&self, id: u64, patch: &VmPatch) -> Result<VirtualMachine, NetBoxError> {
        let mut state = self.state.lock().unwrap();
        let vm = state
            .vms
            .iter_mut()
            .find(|vm| vm.id == id)
            .ok_or_else(|| NetBoxError::NotFound(format!("VM {id} not found")))?;
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
        Ok(vm.clone())
    }

    async fn set_primary_ip4(&self, vm_id: u64, ip_id: u64) -> Result<VirtualMachine, NetBoxError> {
        let mut state = self.state.lock().unwrap();
        let address = state
            .ips
            .iter()
            .find(|ip| ip.id == ip_id)
            .map(|ip| ip.address.clone())
            .ok_or_else(|| NetBoxError::NotFound(format!("IP {ip_id} not found")))?;
        let vm = state
            .vms
            .iter_mut()
            .find(|vm| vm.id == vm_id)
            .ok_or_else(|| NetBoxError::NotFound(format!("VM {vm_id} not found")))?;
        vm.primary_ip4 = Some(IpRef { id: ip_id, address });
        Ok(vm.clone())
    }

    async fn create_virtual_disk(&self, request: &NewVirtualDisk) -> Result<VirtualDisk, NetBoxError> {
        if !self.virtual_disks {
            return Err(NetBoxError::NotFound("virtual disks endpoint not available".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let disk = VirtualDisk {
            id,
            url: self.url("virtualization/virtual-disks", id),
            name: request.name.clone(),
            size: request.size,
        };
        state.disks.push(disk.clone());
        Ok(disk)
    }

    async fn query_vm_interfaces(&self, filters: &[(&str, &str)], _fetch_all: bool) -> Result<Vec<VMInterface>, NetBoxError> {
        let state = self.state.lock().unwrap();
        Ok(state.interfaces.iter().filter(|i| matches_interface(i, filters)).cloned().collect())
    }

    async fn create_vm_interface(&self, request: &NewVMInterface) -> Result<VMInterface, NetBoxError> {
        let mut state = self.state.lock().unwrap();
        let vm = state
            .vms
            .iter()
            .find(|vm| vm.id == request.virtual_machine)
            .map(|vm| NamedRef { id: vm.id, name: vm.name.clone() })
            .ok_or_else(|| NetBoxError::InvalidRequest(format!("VM {} not found", request.virtual_machine)))?;
        let id = state.next_id();
        let iface = VMInterface {
            id,
            url: self.url("virtualization/interfaces", id),
            name: request.name.clone(),
            virtual_machine: vm,
        };
        state.interfaces.push(iface.clone());
        Ok(iface)
    }

    async fn query_prefixes(&self, filters: &[(&str, &str)]) -> Result<Vec<Prefix>, NetBoxError> {
        let state = self.state.lock().unwrap();
        let matches = |p: &&Prefix| {
            filters.iter().all(|(k, v)| match *k {
                "prefix" => p.prefix == *v,
                _ => true,
            })
        };
        Ok(state.prefixes.iter().filter(matches).cloned().collect())
    }

    async fn create_prefix(&self, prefix: &str, _site_id: u64, description: &str) -> Result<Prefix, NetBoxError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let record = Prefix {
            id,
            url: self.url("ipam/prefixes", id),
            prefix: prefix.to_string(),
            description: description.to_string(),
        };
        state.prefixes.push(record.clone());
        Ok(record)
    }

    async fn query_ip_addresses(&self, filters: &[(&str, &str)], _fetch_all: bool) -> Result<Vec<IPAddress>, NetBoxError> {
        let state = self.state.lock().unwrap();
        Ok(state.ips.iter().filter(|ip| matches_ip(ip, filters)).cloned().collect())
    }

    async fn get_ip_address(&self, id: u64) -> Result<IPAddress, NetBoxError> {
        let state = self.state.lock().unwrap();
        state
            .ips
            .iter()
            .find(|ip| ip.id == id)
            .cloned()
            .ok_or_else(|| NetBoxError::NotFound(format!("IP {id} not found")))
    }

    async fn create_ip_address(&self, request: &NewIPAddress) -> Result<IPAddress, NetBoxError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let ip = IPAddress {
            id,
            url: self.url("ipam/ip-addresses", id),
            address: request.address.clone(),
            status: request.status,
            assigned_object_type: Some(request.assigned_object_type.clone()),
            assigned_object_id: Some(request.assigned_object_id),
            description: request.description.clone(),
        };
        state.ips.push(ip.clone());
        Ok(ip)
    }

    async fn reassign_ip_address(&self, id: u64, interface_id: u64) -> Result<IPAddress, NetBoxError> {
        let mut state = self.state.lock().unwrap();
        let ip = state
            .ips
            .iter_mut()
            .find(|ip| ip.id == id)
            .ok_or_else(|| NetBoxError::NotFound(format!("IP {id} not found")))?;
        ip.assigned_object_type = Some(VM_INTERFACE_OBJECT_TYPE.to_string());
        ip.assigned_object_id = Some(interface_id);
        Ok(ip.clone())
    }

    async fn delete_ip_address(&self, id: u64) -> Result<(), NetBoxError> {
        let mut state = self.state.lock().unwrap();
        let before = state.ips.len();
        state.ips.retain(|ip| ip.id != id);
        if state.ips.len() == before {
            return Err(NetBoxError::NotFound(format!("IP {id} not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(id: u64, address: &str, assigned: Option<u64>) -> IPAddress {
        IPAddress {
            id,
            url: format!("http://mock/api/ipam/ip-addresses/{id}/"),
            address: address.to_string(),
            status: IpStatus::Active,
            assigned_object_type: assigned.map(|_| VM_INTERFACE_OBJECT_TYPE.to_string()),
            assigned_object_id: assigned,
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn ip_query_filters_by_host_substring_and_assignment() {
        let mock = MockNetBoxClient::new("http://mock");
        mock.add_ip_address(ip(1, "10.0.0.5/32", None));
        mock.add_ip_address(ip(2, "10.0.0.5/24", Some(7)));
        mock.add_ip_address(ip(3, "10.0.1.5/24", Some(7)));

        let by_host = mock.query_ip_addresses(&[("q", "10.0.0.5")], false).await.unwrap();
        assert_eq!(by_host.len(), 2);

        let by_iface = mock.query_ip_addresses(&[("assigned_object_id", "7")], false).await.unwrap();
        assert_eq!(by_iface.iter().map(|i| i.id).collect::<Vec<_>>(), vec![2, 3]);

        let exact = mock.query_ip_addresses(&[("address", "10.0.0.5/24")], false).await.unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].id, 2);
    }

    #[tokio::test]
    async fn ip_lookup_by_id_resolves_a_single_record() {
        let mock = MockNetBoxClient::new("http://mock");
        mock.add_ip_address(ip(1, "10.0.0.5/24", None));

        let found = mock.get_ip_address(1).await.unwrap();
        assert_eq!(found.address, "10.0.0.5/24");
        assert!(matches!(mock.get_ip_address(99).await, Err(NetBoxError::NotFound(_))));
    }

    #[tokio::test]
    async fn preview_reassign_resolves_the_ip_by_id() {
        let mock = MockNetBoxClient::new("http://mock");
        mock.add_ip_address(ip(5, "10.0.0.9/24", None));
        let preview = crate::preview::PreviewClient::new(mock.clone());

        let reassigned = preview.reassign_ip_address(5, 42).await.unwrap();
        assert_eq!(reassigned.assigned_object_id, Some(42));
        // The underlying record stays untouched.
        assert_eq!(mock.ips()[0].assigned_object_id, None);
    }

    #[tokio::test]
    async fn vm_query_filters_by_primary_ip() {
        let mock = MockNetBoxClient::new("http://mock");
        mock.add_ip_address(ip(10, "10.0.0.5/24", None));
        mock.add_virtual_machine(VirtualMachine {
            id: 1,
            url: "http://mock/api/virtualization/virtual-machines/1/".to_string(),
            name: "vm1".to_string(),
            status: VmStatus::Active,
            cluster: None,
            vcpus: None,
            memory: None,
            disk: None,
            primary_ip4: Some(IpRef { id: 10, address: "10.0.0.5/24".to_string() }),
        });

        let holders = mock.query_virtual_machines(&[("primary_ip4_id", "10")], false).await.unwrap();
        assert_eq!(holders.len(), 1);
        let none = mock.query_virtual_machines(&[("primary_ip4_id", "99")], false).await.unwrap();
        assert!(none.is_empty());
    }
}
