use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

pub const START_AUTHENTICATION: &str = "mcp/startAuthentication";
pub const REMOVE_AUTHENTICATION: &str = "mcp/removeAuthentication";
pub const RELOAD_SERVER: &str = "mcp/reloadServer";
pub const OPEN_PROFILE: &str = "config/openProfile";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Message channel to the host that owns the MCP connections.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn request(&self, topic: &str, payload: Value) -> Result<Value>;

    /// Fire-and-forget; failures are only logged.
    fn post(&self, topic: &str, payload: Value);
}

/// Posts each message as JSON to `{host}/{topic}`.
#[derive(Clone)]
pub struct HttpMessenger {
    http: reqwest::Client,
    host: String,
}

impl HttpMessenger {
    pub fn new(host: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            host: host.trim_end_matches('/').to_string(),
        })
    }

    async fn send(&self, topic: &str, payload: &Value) -> Result<Value> {
        let url = format!("{}/{}", self.host, topic);
        let resp = self.http.post(&url).json(payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::mcp(format!("{topic} failed ({status}): {}", body.trim())));
        }

        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Messenger for HttpMessenger {
    async fn request(&self, topic: &str, payload: Value) -> Result<Value> {
        tracing::debug!(topic, "messenger request");
        let reply = self.send(topic, &payload).await?;

        // Hosts wrap replies as {"status": "error", "error": "..."} on failure.
        if reply.get("status").and_then(Value::as_str) == Some("error") {
            let msg = reply
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            return Err(Error::mcp(format!("{topic}: {msg}")));
        }
        Ok(reply.get("content").cloned().unwrap_or(reply))
    }

    fn post(&self, topic: &str, payload: Value) {
        let this = self.clone();
        let topic = topic.to_string();
        tokio::spawn(async move {
            if let Err(e) = this.send(&topic, &payload).await {
                tracing::warn!(topic = %topic, error = %e, "post failed");
            }
        });
    }
}
