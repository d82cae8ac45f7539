//! Environment-based configuration

use crate::error::SyncError;
use std::env;

const DEFAULT_SITE_NAME: &str = "Yandex Cloud RU";

/// Credentials and endpoints loaded from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// IAM/OAuth token for the Yandex Cloud APIs
    pub yc_token: String,
    /// Base URL of the NetBox instance
    pub netbox_url: String,
    /// NetBox API token
    pub netbox_token: String,
    /// Site all synced clusters are attached to
    pub site_name: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `YC_TOKEN` and `NETBOX_TOKEN` are required; `NETBOX_URL` defaults to
    /// a local instance and `NETBOX_SITE` to the standard site name.
    pub fn from_env() -> Result<Self, SyncError> {
        let yc_token = env::var("YC_TOKEN").map_err(|_| {
            SyncError::InvalidConfig("YC_TOKEN environment variable is required".to_string())
        })?;
        let netbox_url =
            env::var("NETBOX_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
        let netbox_token = env::var("NETBOX_TOKEN").map_err(|_| {
            SyncError::InvalidConfig("NETBOX_TOKEN environment variable is required".to_string())
        })?;
        let site_name =
            env::var("NETBOX_SITE").unwrap_or_else(|_| DEFAULT_SITE_NAME.to_string());
        Ok(Self {
            yc_token,
            netbox_url,
            netbox_token,
            site_name,
        })
    }
}
