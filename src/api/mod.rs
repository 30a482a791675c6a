//! Control-plane API used by the profile selector.

mod client;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use client::{HubClient, HubClientFactory};

/// Organization as returned by the organization listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Assistant package as returned by the assistant listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantSummary {
    pub owner_slug: String,
    pub package_slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantFilters {
    pub always_use_proxy: bool,
    pub organization_id: Option<String>,
}

impl AssistantFilters {
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("alwaysUseProxy", self.always_use_proxy.to_string())];
        if let Some(org) = &self.organization_id {
            query.push(("organizationId", org.clone()));
        }
        query
    }
}

#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn list_assistants(&self, filters: &AssistantFilters) -> Result<Vec<AssistantSummary>>;

    async fn list_organizations(&self) -> Result<Vec<OrganizationInfo>>;
}

/// Builds an [`ApiClient`] bound to an access token.
pub trait ApiClientFactory: Send + Sync {
    fn client(&self, access_token: &str) -> Result<Arc<dyn ApiClient>>;
}
