//! Test utilities for sync unit tests
//!
//! Builders for cloud and NetBox fixtures. The defaults describe one
//! running VM with 2 cores, 2 GiB of memory, a 10 GiB boot disk and a
//! single NIC at 10.0.0.5 in the 10.0.0.0/24 subnet, so a matching NetBox
//! VM carries vcpus=2, memory=2048, disk=10240.

#[cfg(test)]
use netbox_client::{
    IPAddress, IpStatus, NamedRef, VMInterface, VirtualMachine, VmCluster, VmStatus,
    VM_INTERFACE_OBJECT_TYPE,
};
#[cfg(test)]
use yc_client::{
    CloudInventory, CloudRef, CloudVm, DiskKind, DiskRecord, FolderRef, NicRecord, SubnetRecord,
    VpcRef,
};

#[cfg(test)]
pub const GIB: u64 = 1024 * 1024 * 1024;

/// Cloud VM fixture with default resources and one NIC at 10.0.0.5
#[cfg(test)]
pub fn cloud_vm(name: &str, folder: &str, cloud: &str) -> CloudVm {
    CloudVm {
        id: format!("vm-{name}"),
        name: name.to_string(),
        status: "RUNNING".to_string(),
        folder_id: format!("id-{folder}"),
        folder_name: folder.to_string(),
        cloud_id: format!("id-{cloud}"),
        cloud_name: cloud.to_string(),
        cores: 2,
        memory_bytes: 2 * GIB,
        disks: vec![DiskRecord {
            id: Some(format!("disk-{name}")),
            name: "boot".to_string(),
            size_bytes: 10 * GIB,
            kind: DiskKind::Cloud,
        }],
        interfaces: vec![nic(0, Some("10.0.0.5"), None)],
    }
}

/// NIC fixture wired to the default test subnet
#[cfg(test)]
pub fn nic(index: usize, internal: Option<&str>, nat: Option<&str>) -> NicRecord {
    NicRecord {
        index,
        vpc_id: Some("net-1".to_string()),
        vpc_name: Some("default".to_string()),
        subnet_id: Some("subnet-1".to_string()),
        subnet_name: Some("default-a".to_string()),
        internal_address: internal.map(str::to_string),
        nat_address: nat.map(str::to_string),
    }
}

/// Inventory snapshot around the given VMs, deriving cloud and folder
/// lineage from them and providing the default 10.0.0.0/24 subnet
#[cfg(test)]
pub fn test_inventory(vms: Vec<CloudVm>) -> CloudInventory {
    let mut inventory = CloudInventory {
        vpcs: vec![VpcRef {
            id: "net-1".to_string(),
            name: "default".to_string(),
            folder_id: String::new(),
            folder_name: String::new(),
        }],
        subnets: vec![SubnetRecord {
            id: "subnet-1".to_string(),
            name: "default-a".to_string(),
            cidr: Some("10.0.0.0/24".to_string()),
            vpc_id: Some("net-1".to_string()),
            vpc_name: Some("default".to_string()),
            folder_id: String::new(),
            folder_name: String::new(),
            cloud_id: String::new(),
            cloud_name: String::new(),
            zone: None,
            description: None,
        }],
        ..CloudInventory::default()
    };
    for vm in &vms {
        if !inventory.clouds.iter().any(|c| c.id == vm.cloud_id) {
            inventory.clouds.push(CloudRef {
                id: vm.cloud_id.clone(),
                name: vm.cloud_name.clone(),
            });
        }
        if inventory.folder(&vm.folder_id).is_none() {
            inventory.folders.push(FolderRef {
                id: vm.folder_id.clone(),
                name: vm.folder_name.clone(),
                cloud_id: vm.cloud_id.clone(),
                cloud_name: vm.cloud_name.clone(),
            });
        }
    }
    inventory.vms = vms;
    inventory
}

/// NetBox VM fixture mirroring the [`cloud_vm`] defaults
#[cfg(test)]
pub fn cmdb_vm(id: u64, name: &str, cluster: Option<(&str, Option<&str>)>) -> VirtualMachine {
    VirtualMachine {
        id,
        url: format!("http://mock/api/virtualization/virtual-machines/{id}/"),
        name: name.to_string(),
        status: VmStatus::Active,
        cluster: cluster.map(|(cluster_name, group_name)| VmCluster {
            id: 1,
            name: cluster_name.to_string(),
            group: group_name.map(|g| NamedRef {
                id: 2,
                name: g.to_string(),
            }),
        }),
        vcpus: Some(2),
        memory: Some(2048),
        disk: Some(10240),
        primary_ip4: None,
    }
}

/// IP address fixture
#[cfg(test)]
pub fn ip(id: u64, address: &str, assigned: Option<u64>) -> IPAddress {
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

/// VM interface fixture
#[cfg(test)]
pub fn iface(id: u64, vm_id: u64, vm_name: &str, name: &str) -> VMInterface {
    VMInterface {
        id,
        url: format!("http://mock/api/virtualization/interfaces/{id}/"),
        name: name.to_string(),
        virtual_machine: NamedRef {
            id: vm_id,
            name: vm_name.to_string(),
        },
    }
}
