//! Yandex Cloud API client
//!
//! Thin wrappers over the resource-manager, VPC and compute REST endpoints.
//! Listing endpoints are paginated with a `nextPageToken` continuation
//! token; each list method follows the token until it is absent.

use crate::error::CloudError;
use crate::models::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const RESOURCE_MANAGER_URL: &str = "https://resource-manager.api.cloud.yandex.net/resource-manager/v1";
const VPC_URL: &str = "https://vpc.api.cloud.yandex.net/vpc/v1";
const COMPUTE_URL: &str = "https://compute.api.cloud.yandex.net/compute/v1";

/// Yandex Cloud API client
#[derive(Debug)]
pub struct YandexCloudClient {
    client: Client,
    token: String,
}

impl YandexCloudClient {
    /// Create a client authenticating with an IAM/OAuth bearer token
    pub fn new(token: String) -> Result<Self, CloudError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, token })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, params: &[(&str, &str)]) -> Result<T, CloudError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::Api(format!("GET {url} failed: {status} - {body}")));
        }
        Ok(response.json().await?)
    }

    /// Follow `nextPageToken` pagination over a list endpoint.
    async fn list_paged<T, L, F>(&self, url: &str, params: &[(&str, &str)], extract: F) -> Result<Vec<T>, CloudError>
    where
        L: DeserializeOwned,
        F: Fn(L) -> (Vec<T>, Option<String>),
    {
        let mut results = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query: Vec<(&str, &str)> = params.to_vec();
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let page: L = self.get(url, &query).await?;
            let (items, next) = extract(page);
            results.extend(items);
            match next {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(results)
    }

    /// List all clouds visible to the token
    pub async fn list_clouds(&self) -> Result<Vec<Cloud>, CloudError> {
        let url = format!("{RESOURCE_MANAGER_URL}/clouds");
        self.list_paged(&url, &[], |page: CloudList| (page.clouds, page.next_page_token)).await
    }

    /// List folders belonging to a cloud
    pub async fn list_folders(&self, cloud_id: &str) -> Result<Vec<Folder>, CloudError> {
        let url = format!("{RESOURCE_MANAGER_URL}/folders");
        self.list_paged(&url, &[("cloudId", cloud_id)], |page: FolderList| {
            (page.folders, page.next_page_token)
        })
        .await
    }

    /// List VPC networks in a folder
    pub async fn list_networks(&self, folder_id: &str) -> Result<Vec<Network>, CloudError> {
        let url = format!("{VPC_URL}/networks");
        self.list_paged(&url, &[("folderId", folder_id)], |page: NetworkList| {
            (page.networks, page.next_page_token)
        })
        .await
    }

    /// List subnets in a folder
    pub async fn list_subnets(&self, folder_id: &str) -> Result<Vec<Subnet>, CloudError> {
        let url = format!("{VPC_URL}/subnets");
        self.list_paged(&url, &[("folderId", folder_id)], |page: SubnetList| {
            (page.subnets, page.next_page_token)
        })
        .await
    }

    /// List compute instances in a folder
    pub async fn list_instances(&self, folder_id: &str) -> Result<Vec<Instance>, CloudError> {
        let url = format!("{COMPUTE_URL}/instances");
        self.list_paged(&url, &[("folderId", folder_id)], |page: InstanceList| {
            (page.instances, page.next_page_token)
        })
        .await
    }

    /// Fetch a single disk by id (boot and secondary disks carry only a
    /// reference on the instance)
    pub async fn get_disk(&self, disk_id: &str) -> Result<Disk, CloudError> {
        let url = format!("{COMPUTE_URL}/disks/{disk_id}");
        self.get(&url, &[]).await
    }
}
