//! NetBox API models
//!
//! Covers the serializers the sync reads and writes: DCIM sites,
//! virtualization (cluster groups, cluster types, clusters, virtual
//! machines, virtual disks, VM interfaces) and IPAM (prefixes, IP
//! addresses). Only the fields the sync consumes are modeled; unknown
//! fields in responses are ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize NetBox's `vcpus` field into whole cores. The API serializes
/// it as a JSON float (`2.0`, it is a decimal field upstream), so going
/// through `f64` tolerates both `2` and `2.0`.
fn cores_from_decimal<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.map(|v| v.round().max(0.0) as u64))
}

/// Object type string NetBox expects when assigning an IP to a VM interface.
pub const VM_INTERFACE_OBJECT_TYPE: &str = "virtualization.vminterface";

/// Minimal nested reference (id + name) used by several serializers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: u64,
    pub name: String,
}

/// Nested IP address reference as embedded in VM serializers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpRef {
    pub id: u64,
    pub address: String,
}

/// Site model (DCIM)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: u64,
    pub url: String,
    pub name: String,
    pub slug: String,
}

/// Cluster group model (virtualization). A cluster group corresponds to a
/// cloud on the provider side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterGroup {
    pub id: u64,
    pub url: String,
    pub name: String,
    pub slug: String,
}

/// Cluster type model (virtualization)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterType {
    pub id: u64,
    pub url: String,
    pub name: String,
    pub slug: String,
}

/// Cluster model (virtualization). A cluster corresponds to a folder on the
/// provider side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: u64,
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub group: Option<NamedRef>,
    #[serde(default)]
    pub site: Option<NamedRef>,
}

/// Cluster reference nested inside a virtual machine, carrying the cluster
/// group so VMs can be matched on (name, cluster, group) without extra
/// round-trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmCluster {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub group: Option<NamedRef>,
}

/// Virtual machine status choices
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum VmStatus {
    Active,
    Offline,
    Planned,
    Staged,
    Failed,
    Decommissioning,
    /// Any status value this client does not model (custom choices, newer
    /// releases). Read-tolerated, never written back.
    #[serde(other)]
    Other,
}

impl VmStatus {
    /// Kebab-case API value, for log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            VmStatus::Active => "active",
            VmStatus::Offline => "offline",
            VmStatus::Planned => "planned",
            VmStatus::Staged => "staged",
            VmStatus::Failed => "failed",
            VmStatus::Decommissioning => "decommissioning",
            VmStatus::Other => "other",
        }
    }
}

/// Virtual machine model (virtualization).
///
/// `memory` and `disk` are megabytes, per the NetBox data model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualMachine {
    pub id: u64,
    pub url: String,
    pub name: String,
    pub status: VmStatus,
    #[serde(default)]
    pub cluster: Option<VmCluster>,
    #[serde(default, deserialize_with = "cores_from_decimal")]
    pub vcpus: Option<u64>,
    #[serde(default)]
    pub memory: Option<u64>,
    #[serde(default)]
    pub disk: Option<u64>,
    #[serde(default)]
    pub primary_ip4: Option<IpRef>,
}

/// Virtual disk model (virtualization, NetBox 3.7+)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualDisk {
    pub id: u64,
    pub url: String,
    pub name: String,
    pub size: u64,
}

/// VM interface model (virtualization)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VMInterface {
    pub id: u64,
    pub url: String,
    pub name: String,
    pub virtual_machine: NamedRef,
}

/// Prefix model (IPAM)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prefix {
    pub id: u64,
    pub url: String,
    pub prefix: String,
    #[serde(default)]
    pub description: String,
}

/// IP address status choices
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IpStatus {
    Active,
    Reserved,
    Deprecated,
    Dhcp,
    #[serde(rename = "slaac")]
    Slaac,
    /// Any status value this client does not model. Read-tolerated, never
    /// written back.
    #[serde(other)]
    Other,
}

/// IP address model (IPAM).
///
/// `address` always carries a CIDR suffix in NetBox (e.g. `10.0.0.5/24`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IPAddress {
    pub id: u64,
    pub url: String,
    pub address: String,
    pub status: IpStatus,
    #[serde(default)]
    pub assigned_object_type: Option<String>,
    #[serde(default)]
    pub assigned_object_id: Option<u64>,
    #[serde(default)]
    pub description: String,
}

/// Optional API surface reported by the connected NetBox instance.
///
/// Probed once at connection time instead of per call; older NetBox
/// releases lack the virtual-disks endpoint.
#[derive(Debug, Clone, Copy)]
pub struct CmdbFeatures {
    pub virtual_disks: bool,
}

// Request bodies

/// Body for creating a virtual machine.
#[derive(Debug, Clone, Serialize)]
pub struct NewVirtualMachine {
    pub name: String,
    pub status: VmStatus,
    pub cluster: u64,
    pub vcpus: u64,
    pub memory: u64,
    pub disk: u64,
}

/// Field-level update for a virtual machine, produced by the differ.
/// `None` fields are omitted from the PATCH body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VmPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VmStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcpus: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
}

impl VmPatch {
    /// True when no field differs and no update call is needed.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.vcpus.is_none() && self.memory.is_none() && self.disk.is_none()
    }

    /// Names of the fields this patch would change.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.status.is_some() {
            fields.push("status");
        }
        if self.vcpus.is_some() {
            fields.push("vcpus");
        }
        if self.memory.is_some() {
            fields.push("memory");
        }
        if self.disk.is_some() {
            fields.push("disk");
        }
        fields
    }
}

/// Body for creating a virtual disk. `size` is megabytes.
#[derive(Debug, Clone, Serialize)]
pub struct NewVirtualDisk {
    pub virtual_machine: u64,
    pub name: String,
    pub size: u64,
    pub description: String,
}

/// Body for creating a VM interface.
#[derive(Debug, Clone, Serialize)]
pub struct NewVMInterface {
    pub virtual_machine: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Body for creating an IP address assigned to a VM interface.
#[derive(Debug, Clone, Serialize)]
pub struct NewIPAddress {
    pub address: String,
    pub status: IpStatus,
    pub assigned_object_type: String,
    pub assigned_object_id: u64,
    pub description: String,
}

/// Derive a URL slug from a display name, the way the NetBox UI does.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vm_patch_empty_when_default() {
        let patch = VmPatch::default();
        assert!(patch.is_empty());
        assert!(patch.changed_fields().is_empty());
    }

    #[test]
    fn vm_patch_serializes_only_set_fields() {
        let patch = VmPatch {
            status: Some(VmStatus::Active),
            disk: Some(10240),
            ..VmPatch::default()
        };
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, serde_json::json!({"status": "active", "disk": 10240}));
        assert_eq!(patch.changed_fields(), vec!["status", "disk"]);
    }

    #[test]
    fn vm_status_round_trips_kebab_case() {
        let status: VmStatus = serde_json::from_str("\"offline\"").unwrap();
        assert_eq!(status, VmStatus::Offline);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"offline\"");
    }

    #[test]
    fn vcpus_parses_the_decimal_wire_encoding() {
        // NetBox serializes vcpus as a float, e.g. "vcpus": 2.0.
        let vm: VirtualMachine = serde_json::from_value(serde_json::json!({
            "id": 1,
            "url": "http://netbox/api/virtualization/virtual-machines/1/",
            "name": "vm1",
            "status": "active",
            "vcpus": 2.0,
            "memory": 2048,
            "disk": 10240,
        }))
        .unwrap();
        assert_eq!(vm.vcpus, Some(2));
    }

    #[test]
    fn vcpus_tolerates_integer_and_null() {
        let with_int: VirtualMachine = serde_json::from_value(serde_json::json!({
            "id": 1,
            "url": "http://netbox/api/virtualization/virtual-machines/1/",
            "name": "vm1",
            "status": "active",
            "vcpus": 4,
        }))
        .unwrap();
        assert_eq!(with_int.vcpus, Some(4));

        let with_null: VirtualMachine = serde_json::from_value(serde_json::json!({
            "id": 2,
            "url": "http://netbox/api/virtualization/virtual-machines/2/",
            "name": "vm2",
            "status": "active",
            "vcpus": null,
        }))
        .unwrap();
        assert_eq!(with_null.vcpus, None);
    }

    #[test]
    fn unrecognized_status_values_do_not_fail_deserialization() {
        let vm_status: VmStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(vm_status, VmStatus::Other);

        let ip_status: IpStatus = serde_json::from_str("\"quarantined\"").unwrap();
        assert_eq!(ip_status, IpStatus::Other);
    }

    #[test]
    fn slugify_lowercases_and_dashes() {
        assert_eq!(slugify("Yandex Cloud RU"), "yandex-cloud-ru");
    }
}
