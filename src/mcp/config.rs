use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::status::MCPServerStatus;
use crate::error::Result;

/// One `mcpServers` entry of a profile's inline config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerBlock {
    pub name: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "type")]
    pub transport: Option<String>,
}

impl McpServerBlock {
    /// Short launch description for the server card.
    pub fn summary(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        match &self.command {
            Some(cmd) if self.args.is_empty() => cmd.clone(),
            Some(cmd) => format!("{} {}", cmd, self.args.join(" ")),
            None => String::new(),
        }
    }
}

/// Parsed inline profile config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "mcpServers")]
    pub mcp_servers: Vec<McpServerBlock>,
}

impl ConfigDocument {
    /// JSON when the text opens with `{`, TOML otherwise.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim_start().starts_with('{') {
            Ok(serde_json::from_str(text)?)
        } else {
            Ok(toml::from_str(text)?)
        }
    }

    /// Block for a live server, matched by name, then by id.
    pub fn block_for(&self, server: &MCPServerStatus) -> Option<&McpServerBlock> {
        self.mcp_servers
            .iter()
            .find(|b| b.name == server.name)
            .or_else(|| self.mcp_servers.iter().find(|b| b.name == server.id))
    }
}
