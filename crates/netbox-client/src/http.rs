//! HTTP plumbing shared by the NetBox API methods
//!
//! Wraps a `reqwest::Client` with token authentication, error mapping and
//! paginated-response walking.

use crate::error::NetBoxError;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Paginated response wrapper returned by NetBox list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Authenticated HTTP client for a single NetBox instance
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpClient {
    pub fn new(client: Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a path or an absolute `next` link against the base URL.
    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
    }

    async fn check(response: reqwest::Response, context: &str) -> Result<reqwest::Response, NetBoxError> {
        let status = response.status();
        if status == 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(NetBoxError::NotFound(format!("{context}: {body}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetBoxError::Api(format!("{context} failed: {status} - {body}")));
        }
        Ok(response)
    }

    /// GET a single resource.
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, NetBoxError> {
        let url = self.absolute(path);
        debug!("GET {url}");
        let response = self.request(Method::GET, &url).send().await?;
        let response = Self::check(response, &format!("GET {path}")).await?;
        Ok(response.json().await?)
    }

    /// GET returning the raw status code, for endpoint probing.
    pub async fn probe(&self, path: &str) -> Result<reqwest::StatusCode, NetBoxError> {
        let url = self.absolute(path);
        debug!("GET {url} (probe)");
        let response = self.request(Method::GET, &url).send().await?;
        Ok(response.status())
    }

    /// POST a JSON body and decode the created resource.
    pub async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, NetBoxError> {
        let url = self.absolute(path);
        debug!("POST {url}");
        let response = self.request(Method::POST, &url).json(body).send().await?;
        let response = Self::check(response, &format!("POST {path}")).await?;
        Ok(response.json().await?)
    }

    /// PATCH a JSON body and decode the updated resource.
    pub async fn patch<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, NetBoxError> {
        let url = self.absolute(path);
        debug!("PATCH {url}");
        let response = self.request(Method::PATCH, &url).json(body).send().await?;
        let response = Self::check(response, &format!("PATCH {path}")).await?;
        Ok(response.json().await?)
    }

    /// DELETE a resource. NetBox answers 204 on success.
    pub async fn delete(&self, path: &str) -> Result<(), NetBoxError> {
        let url = self.absolute(path);
        debug!("DELETE {url}");
        let response = self.request(Method::DELETE, &url).send().await?;
        Self::check(response, &format!("DELETE {path}")).await?;
        Ok(())
    }

    /// Query a list endpoint with filters. With `fetch_all` the `next` link
    /// is followed until exhausted, otherwise one page is returned.
    pub async fn query<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        filters: &[(&str, &str)],
        fetch_all: bool,
    ) -> Result<Vec<T>, NetBoxError> {
        let mut path = format!("/api/{endpoint}/");
        if !filters.is_empty() {
            let query = filters
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            path = format!("{path}?{query}");
        }

        if !fetch_all {
            let page: PaginatedResponse<T> = self.get(&path).await?;
            return Ok(page.results);
        }

        let mut url = self.absolute(&path);
        let mut results = Vec::new();
        loop {
            let page: PaginatedResponse<T> = self.get(&url).await?;
            results.extend(page.results);
            match page.next {
                Some(next) => url = self.absolute(&next),
                None => break,
            }
        }
        Ok(results)
    }
}
