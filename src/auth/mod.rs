mod store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::OrganizationInfo;
use crate::error::Result;

pub use store::FileAuthStore;

/// Signed-in session as persisted in `auth.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedConfig {
    #[serde(default)]
    pub user_id: String,
    pub user_email: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` selects the personal scope.
    #[serde(default)]
    pub organization_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    Unauthenticated,
    Authenticated(AuthenticatedConfig),
}

impl AuthConfig {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthConfig::Authenticated(_))
    }

    pub fn as_authenticated(&self) -> Option<&AuthenticatedConfig> {
        match self {
            AuthConfig::Authenticated(cfg) => Some(cfg),
            AuthConfig::Unauthenticated => None,
        }
    }

    /// Usable access token; absent when empty or past its expiry.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token_at(Utc::now())
    }

    fn access_token_at(&self, now: DateTime<Utc>) -> Option<&str> {
        let cfg = self.as_authenticated()?;
        if cfg.access_token.is_empty() {
            return None;
        }
        if cfg.expires_at.is_some_and(|exp| exp <= now) {
            return None;
        }
        Some(cfg.access_token.as_str())
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.as_authenticated()?.organization_id.as_deref()
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn load_auth_config(&self) -> Result<AuthConfig>;

    async fn save_auth_config(&self, config: &AuthConfig) -> Result<()>;

    /// Clear the stored session.
    async fn logout(&self) -> Result<()>;

    async fn list_user_organizations(&self) -> Result<Vec<OrganizationInfo>>;
}
