use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ApiClient, ApiClientFactory, AssistantFilters, AssistantSummary, OrganizationInfo};
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct OrganizationsResponse {
    #[serde(default)]
    organizations: Vec<OrganizationInfo>,
}

/// HTTP client for the hub API, authenticated with a bearer token.
pub struct HubClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl HubClient {
    pub fn new(base: &str, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base, path);
        tracing::debug!(%url, "api request");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("User-Agent", "mcp-hand")
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::api(format!("GET {path} returned {status}")));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ApiClient for HubClient {
    async fn list_assistants(&self, filters: &AssistantFilters) -> Result<Vec<AssistantSummary>> {
        self.get_json("/ide/list-assistants", &filters.to_query())
            .await
    }

    async fn list_organizations(&self) -> Result<Vec<OrganizationInfo>> {
        let resp: OrganizationsResponse = self.get_json("/ide/list-organizations", &[]).await?;
        Ok(resp.organizations)
    }
}

/// Produces [`HubClient`]s against a fixed API base.
#[derive(Debug, Clone)]
pub struct HubClientFactory {
    base: String,
}

impl HubClientFactory {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl ApiClientFactory for HubClientFactory {
    fn client(&self, access_token: &str) -> Result<Arc<dyn ApiClient>> {
        Ok(Arc::new(HubClient::new(&self.base, access_token)?))
    }
}
