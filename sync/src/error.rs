//! Sync error types

use thiserror::Error;

/// Errors surfaced by the sync pipeline
#[derive(Debug, Error)]
pub enum SyncError {
    /// Required configuration is missing or malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Yandex Cloud inventory fetch failed. Fatal for the run; there is no
    /// partial-inventory mode.
    #[error("Yandex Cloud error: {0}")]
    Cloud(#[from] yc_client::CloudError),

    /// NetBox API call failed
    #[error("NetBox error: {0}")]
    NetBox(#[from] netbox_client::NetBoxError),

    /// A VM references a folder that was not present in the fetched
    /// inventory
    #[error("VM {vm} references unknown folder {folder}")]
    MissingLineage { vm: String, folder: String },

    /// The plan had actions but every one of them failed
    #[error("Plan contained {planned} actions but none could be executed")]
    NothingApplied { planned: usize },
}
