//! NetBox REST API Client
//!
//! A Rust client for the subset of the NetBox REST API used by the
//! Yandex Cloud inventory sync: virtualization (clusters, virtual machines,
//! disks, interfaces) and IPAM (prefixes, IP addresses).
//!
//! # Example
//!
//! ```no_run
//! use netbox_client::{NetBoxClient, NetBoxClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NetBoxClient::new(
//!     "http://netbox:80".to_string(),
//!     "your-api-token".to_string(),
//! )?;
//!
//! // List all virtual machines, following pagination
//! let vms = client.query_virtual_machines(&[], true).await?;
//!
//! // Look up an IP address record by exact address
//! let ips = client.query_ip_addresses(&[("address", "10.0.0.5/24")], false).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Virtualization**: clusters, cluster groups, VMs, virtual disks, interfaces
//! - **IPAM**: prefixes, IP addresses, primary-IP assignment
//! - **Pagination**: follows the `next` link of paginated responses
//! - **Capability detection**: one-shot probe for optional endpoints
//! - **Preview mode**: [`PreviewClient`] stubs out every mutating call

pub mod client;
pub mod error;
pub mod http;
pub mod models;
#[path = "trait.rs"]
pub mod netbox_trait;
pub mod preview;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::NetBoxClient;
pub use error::NetBoxError;
pub use http::{HttpClient, PaginatedResponse};
pub use models::*;
pub use netbox_trait::NetBoxClientTrait;
pub use preview::PreviewClient;
#[cfg(feature = "test-util")]
pub use mock::MockNetBoxClient;
