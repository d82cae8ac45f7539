//! Normalized cloud inventory snapshot
//!
//! [`fetch_inventory`] walks every cloud visible to the token, then every
//! folder, and collects networks, subnets and instances into flat,
//! deterministic lists. Instances are normalized into [`CloudVm`] records
//! that already carry the cloud/folder lineage, so later stages never have
//! to join against raw API objects.

use crate::client::YandexCloudClient;
use crate::error::CloudError;
use std::collections::HashMap;
use tracing::{info, warn};

const MIB: u64 = 1_048_576;

/// Cloud the token can see
#[derive(Debug, Clone)]
pub struct CloudRef {
    pub id: String,
    pub name: String,
}

/// Folder with its cloud lineage resolved
#[derive(Debug, Clone)]
pub struct FolderRef {
    pub id: String,
    pub name: String,
    pub cloud_id: String,
    pub cloud_name: String,
}

/// VPC network with its folder lineage resolved
#[derive(Debug, Clone)]
pub struct VpcRef {
    pub id: String,
    pub name: String,
    pub folder_id: String,
    pub folder_name: String,
}

/// Subnet with lineage and its first IPv4 CIDR block
#[derive(Debug, Clone)]
pub struct SubnetRecord {
    pub id: String,
    pub name: String,
    /// First v4 CIDR block, if the subnet has one.
    pub cidr: Option<String>,
    pub vpc_id: Option<String>,
    pub vpc_name: Option<String>,
    pub folder_id: String,
    pub folder_name: String,
    pub cloud_id: String,
    pub cloud_name: String,
    pub zone: Option<String>,
    pub description: Option<String>,
}

/// Kind of disk attached to an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskKind {
    /// Network disk with its own resource id
    Cloud,
    /// Host-local NVMe disk, inlined on the instance
    Local,
}

/// Disk attached to a VM
#[derive(Debug, Clone)]
pub struct DiskRecord {
    /// Resource id for cloud disks; local disks have none.
    pub id: Option<String>,
    pub name: String,
    pub size_bytes: u64,
    pub kind: DiskKind,
}

impl DiskRecord {
    /// Size in mebibytes, rounded down.
    pub fn size_mb(&self) -> u64 {
        self.size_bytes / MIB
    }
}

/// Network interface of a VM
#[derive(Debug, Clone)]
pub struct NicRecord {
    /// Position of the interface on the instance, used to derive `eth{N}`.
    pub index: usize,
    pub vpc_id: Option<String>,
    pub vpc_name: Option<String>,
    pub subnet_id: Option<String>,
    pub subnet_name: Option<String>,
    /// Address inside the VPC.
    pub internal_address: Option<String>,
    /// Public one-to-one NAT address, if attached.
    pub nat_address: Option<String>,
}

/// Normalized compute instance
#[derive(Debug, Clone)]
pub struct CloudVm {
    pub id: String,
    pub name: String,
    pub status: String,
    pub folder_id: String,
    pub folder_name: String,
    pub cloud_id: String,
    pub cloud_name: String,
    pub cores: u64,
    pub memory_bytes: u64,
    pub disks: Vec<DiskRecord>,
    pub interfaces: Vec<NicRecord>,
}

impl CloudVm {
    pub fn is_running(&self) -> bool {
        self.status == "RUNNING"
    }

    pub fn vcpus(&self) -> u64 {
        self.cores
    }

    /// Memory in mebibytes, rounded down.
    pub fn memory_mb(&self) -> u64 {
        self.memory_bytes / MIB
    }

    /// Total disk capacity in mebibytes. Each disk is rounded down
    /// individually before summing.
    pub fn disk_total_mb(&self) -> u64 {
        self.disks.iter().map(DiskRecord::size_mb).sum()
    }
}

/// Immutable snapshot of the cloud side, produced once per run
#[derive(Debug, Clone, Default)]
pub struct CloudInventory {
    pub clouds: Vec<CloudRef>,
    pub folders: Vec<FolderRef>,
    pub vpcs: Vec<VpcRef>,
    pub subnets: Vec<SubnetRecord>,
    pub vms: Vec<CloudVm>,
}

impl CloudInventory {
    pub fn folder(&self, id: &str) -> Option<&FolderRef> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn subnet(&self, id: &str) -> Option<&SubnetRecord> {
        self.subnets.iter().find(|s| s.id == id)
    }
}

/// Walk every cloud and folder visible to the token and build the snapshot.
///
/// Disks referenced by instances are resolved via the compute disks
/// endpoint; a disk that fails to resolve is skipped with a warning rather
/// than failing the whole fetch.
pub async fn fetch_inventory(client: &YandexCloudClient) -> Result<CloudInventory, CloudError> {
    let mut inventory = CloudInventory::default();
    // Cache disk lookups: the same disk id never repeats across instances,
    // but retries after partial failures would.
    let mut disk_sizes: HashMap<String, (String, u64)> = HashMap::new();

    let clouds = client.list_clouds().await?;
    info!("Fetched {} clouds", clouds.len());

    for cloud in clouds {
        let folders = client.list_folders(&cloud.id).await?;
        info!("Cloud {}: {} folders", cloud.name, folders.len());

        for folder in folders {
            inventory.folders.push(FolderRef {
                id: folder.id.clone(),
                name: folder.name.clone(),
                cloud_id: cloud.id.clone(),
                cloud_name: cloud.name.clone(),
            });

            let networks = client.list_networks(&folder.id).await?;
            for network in &networks {
                inventory.vpcs.push(VpcRef {
                    id: network.id.clone(),
                    name: network.name.clone(),
                    folder_id: folder.id.clone(),
                    folder_name: folder.name.clone(),
                });
            }
            let network_names: HashMap<&str, &str> =
                networks.iter().map(|n| (n.id.as_str(), n.name.as_str())).collect();

            let subnets = client.list_subnets(&folder.id).await?;
            let mut subnet_names: HashMap<String, String> = HashMap::new();
            for subnet in subnets {
                subnet_names.insert(subnet.id.clone(), subnet.name.clone());
                inventory.subnets.push(SubnetRecord {
                    cidr: subnet.v4_cidr_blocks.first().cloned(),
                    vpc_name: network_names.get(subnet.network_id.as_str()).map(|n| n.to_string()),
                    vpc_id: Some(subnet.network_id),
                    id: subnet.id,
                    name: subnet.name,
                    folder_id: folder.id.clone(),
                    folder_name: folder.name.clone(),
                    cloud_id: cloud.id.clone(),
                    cloud_name: cloud.name.clone(),
                    zone: subnet.zone_id,
                    description: subnet.description,
                });
            }

            let instances = client.list_instances(&folder.id).await?;
            info!("Folder {}: {} instances", folder.name, instances.len());

            for instance in instances {
                let mut disks = Vec::new();

                let attached = instance
                    .boot_disk
                    .iter()
                    .chain(instance.secondary_disks.iter());
                for disk_ref in attached {
                    let Some(disk_id) = disk_ref.disk_id.as_deref() else {
                        continue;
                    };
                    let resolved = match disk_sizes.get(disk_id) {
                        Some(cached) => Some(cached.clone()),
                        None => match client.get_disk(disk_id).await {
                            Ok(disk) => {
                                let name = disk.name.unwrap_or_else(|| disk.id.clone());
                                disk_sizes.insert(disk_id.to_string(), (name.clone(), disk.size));
                                Some((name, disk.size))
                            }
                            Err(err) => {
                                warn!("Failed to fetch disk {disk_id} for VM {}: {err}", instance.name);
                                None
                            }
                        },
                    };
                    if let Some((name, size)) = resolved {
                        disks.push(DiskRecord {
                            id: Some(disk_id.to_string()),
                            name,
                            size_bytes: size,
                            kind: DiskKind::Cloud,
                        });
                    }
                }

                for local in &instance.local_disks {
                    disks.push(DiskRecord {
                        id: None,
                        name: local.device_name.clone().unwrap_or_else(|| "local".to_string()),
                        size_bytes: local.size,
                        kind: DiskKind::Local,
                    });
                }

                let interfaces = instance
                    .network_interfaces
                    .iter()
                    .enumerate()
                    .map(|(index, nic)| NicRecord {
                        index,
                        vpc_name: nic
                            .network_id
                            .as_deref()
                            .and_then(|id| network_names.get(id).map(|n| n.to_string())),
                        vpc_id: nic.network_id.clone(),
                        subnet_name: nic
                            .subnet_id
                            .as_deref()
                            .and_then(|id| subnet_names.get(id).cloned()),
                        subnet_id: nic.subnet_id.clone(),
                        internal_address: nic
                            .primary_v4_address
                            .as_ref()
                            .and_then(|a| a.address.clone()),
                        nat_address: nic
                            .primary_v4_address
                            .as_ref()
                            .and_then(|a| a.one_to_one_nat.as_ref())
                            .and_then(|n| n.address.clone()),
                    })
                    .collect();

                let resources = instance.resources.unwrap_or_default();
                inventory.vms.push(CloudVm {
                    id: instance.id,
                    name: instance.name,
                    status: instance.status,
                    folder_id: folder.id.clone(),
                    folder_name: folder.name.clone(),
                    cloud_id: cloud.id.clone(),
                    cloud_name: cloud.name.clone(),
                    cores: resources.cores,
                    memory_bytes: resources.memory,
                    disks,
                    interfaces,
                });
            }
        }
        inventory.clouds.push(CloudRef {
            id: cloud.id,
            name: cloud.name,
        });
    }

    info!(
        "Inventory: {} VMs across {} folders, {} subnets",
        inventory.vms.len(),
        inventory.folders.len(),
        inventory.subnets.len()
    );
    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm_with_disks(disks: Vec<DiskRecord>) -> CloudVm {
        CloudVm {
            id: "vm-1".to_string(),
            name: "web".to_string(),
            status: "RUNNING".to_string(),
            folder_id: "folder-1".to_string(),
            folder_name: "prod".to_string(),
            cloud_id: "cloud-1".to_string(),
            cloud_name: "main".to_string(),
            cores: 2,
            memory_bytes: 2 * 1024 * 1024 * 1024,
            disks,
            interfaces: Vec::new(),
        }
    }

    #[test]
    fn memory_converts_to_mebibytes() {
        let vm = vm_with_disks(Vec::new());
        assert_eq!(vm.memory_mb(), 2048);
    }

    #[test]
    fn disk_total_rounds_each_disk_down() {
        let vm = vm_with_disks(vec![
            DiskRecord {
                id: Some("disk-1".to_string()),
                name: "boot".to_string(),
                size_bytes: 10 * 1024 * 1024 * 1024 + 500_000,
                kind: DiskKind::Cloud,
            },
            DiskRecord {
                id: None,
                name: "nvme0".to_string(),
                size_bytes: 1024 * 1024 * 1024 + 700_000,
                kind: DiskKind::Local,
            },
        ]);
        // 10240 + 1024; the sub-MiB remainders do not accumulate.
        assert_eq!(vm.disk_total_mb(), 10240 + 1024);
    }

    #[test]
    fn running_status_is_case_sensitive() {
        let mut vm = vm_with_disks(Vec::new());
        assert!(vm.is_running());
        vm.status = "STOPPED".to_string();
        assert!(!vm.is_running());
    }
}
