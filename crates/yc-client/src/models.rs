//! Raw Yandex Cloud API models
//!
//! Field names follow the REST API's camelCase. Per the proto3 JSON
//! mapping, int64 values (memory, disk sizes, core counts) arrive as JSON
//! strings; [`u64_from_string_or_number`] tolerates both encodings.

use serde::{Deserialize, Deserializer};

/// Deserialize a u64 that the API may encode as a number or a string.
pub fn u64_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cloud {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudList {
    #[serde(default)]
    pub clouds: Vec<Cloud>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderList {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkList {
    #[serde(default)]
    pub networks: Vec<Network>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub network_id: String,
    /// Absent for CIDR-less subnets; those are tolerated downstream.
    #[serde(default)]
    pub v4_cidr_blocks: Vec<String>,
    #[serde(default)]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetList {
    #[serde(default)]
    pub subnets: Vec<Subnet>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Resources {
    #[serde(default, deserialize_with = "u64_from_string_or_number")]
    pub cores: u64,
    #[serde(default, deserialize_with = "u64_from_string_or_number")]
    pub memory: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    #[serde(default)]
    pub disk_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalDisk {
    #[serde(default, deserialize_with = "u64_from_string_or_number")]
    pub size: u64,
    #[serde(default)]
    pub device_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatAddress {
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryV4Address {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub one_to_one_nat: Option<NatAddress>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceNic {
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub subnet_id: Option<String>,
    #[serde(default)]
    pub primary_v4_address: Option<PrimaryV4Address>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub resources: Option<Resources>,
    #[serde(default)]
    pub boot_disk: Option<AttachedDisk>,
    #[serde(default)]
    pub secondary_disks: Vec<AttachedDisk>,
    #[serde(default)]
    pub local_disks: Vec<LocalDisk>,
    #[serde(default)]
    pub network_interfaces: Vec<InstanceNic>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceList {
    #[serde(default)]
    pub instances: Vec<Instance>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Standalone disk resource returned by the compute disks endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Disk {
    pub id: String,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub size: u64,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int64_fields_decode_from_strings() {
        let raw = r#"{"cores": "2", "memory": "2147483648"}"#;
        let resources: Resources = serde_json::from_str(raw).unwrap();
        assert_eq!(resources.cores, 2);
        assert_eq!(resources.memory, 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn int64_fields_decode_from_numbers() {
        let raw = r#"{"cores": 4, "memory": 1073741824}"#;
        let resources: Resources = serde_json::from_str(raw).unwrap();
        assert_eq!(resources.cores, 4);
        assert_eq!(resources.memory, 1024 * 1024 * 1024);
    }

    #[test]
    fn instance_decodes_with_sparse_fields() {
        let raw = r#"{
            "id": "vm-1",
            "name": "web",
            "status": "RUNNING",
            "bootDisk": {"diskId": "disk-1"},
            "localDisks": [{"size": "107374182400", "deviceName": "nvme0"}],
            "networkInterfaces": [{
                "networkId": "net-1",
                "subnetId": "subnet-1",
                "primaryV4Address": {"address": "10.0.0.5", "oneToOneNat": {"address": "203.0.113.9"}}
            }]
        }"#;
        let instance: Instance = serde_json::from_str(raw).unwrap();
        assert!(instance.resources.is_none());
        assert_eq!(instance.local_disks[0].size, 100 * 1024 * 1024 * 1024);
        let nic = &instance.network_interfaces[0];
        let primary = nic.primary_v4_address.as_ref().unwrap();
        assert_eq!(primary.address.as_deref(), Some("10.0.0.5"));
        assert_eq!(
            primary.one_to_one_nat.as_ref().unwrap().address.as_deref(),
            Some("203.0.113.9")
        );
    }
}
