//! VM differ
//!
//! Computes the field-level patch for one matched pair. Only status,
//! vCPUs, memory and aggregate disk are compared; name and cluster are
//! match keys, not diffable fields. Memory and disk are compared in whole
//! megabytes, the unit NetBox stores.

use netbox_client::{VirtualMachine, VmPatch, VmStatus};
use yc_client::CloudVm;

/// Map a cloud status string onto the NetBox status choice.
pub fn map_status(cloud: &CloudVm) -> VmStatus {
    if cloud.is_running() {
        VmStatus::Active
    } else {
        VmStatus::Offline
    }
}

/// Compute the patch that brings `cmdb` in line with `cloud`.
///
/// An empty patch means the pair already agrees; a second run over
/// unchanged inventory therefore performs zero updates. Absent NetBox
/// fields compare as zero.
pub fn diff_vm(cloud: &CloudVm, cmdb: &VirtualMachine) -> VmPatch {
    let mut patch = VmPatch::default();

    let status = map_status(cloud);
    if status != cmdb.status {
        patch.status = Some(status);
    }
    if cmdb.vcpus.unwrap_or(0) != cloud.vcpus() {
        patch.vcpus = Some(cloud.vcpus());
    }
    if cmdb.memory.unwrap_or(0) != cloud.memory_mb() {
        patch.memory = Some(cloud.memory_mb());
    }
    if cmdb.disk.unwrap_or(0) != cloud.disk_total_mb() {
        patch.disk = Some(cloud.disk_total_mb());
    }

    patch
}
