//! Yandex Cloud inventory client
//!
//! Pulls the compute inventory (clouds, folders, networks, subnets,
//! instances, disks) from the Yandex Cloud REST APIs and normalizes it into
//! an immutable [`CloudInventory`] snapshot consumed by the sync pipeline.
//!
//! The snapshot is produced once per run by [`fetch_inventory`] and passed
//! by reference to every later stage; no stage mutates it.

pub mod client;
pub mod error;
pub mod inventory;
pub mod models;

pub use client::YandexCloudClient;
pub use error::CloudError;
pub use inventory::{
    fetch_inventory, CloudInventory, CloudRef, CloudVm, DiskKind, DiskRecord, FolderRef, NicRecord,
    SubnetRecord, VpcRef,
};
