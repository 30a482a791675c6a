use std::fmt;

use serde::{Deserialize, Serialize};

/// Connection state reported by the host for an MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerState {
    Connected,
    Connecting,
    Authenticating,
    Error,
    NotConnected,
}

impl ServerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerState::Connected => "connected",
            ServerState::Connecting => "connecting",
            ServerState::Authenticating => "authenticating",
            ServerState::Error => "error",
            ServerState::NotConnected => "not-connected",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, ServerState::Connecting | ServerState::Authenticating)
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpResource {
    pub name: String,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpResourceTemplate {
    pub name: String,
    #[serde(default)]
    pub uri_template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpPrompt {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Live status of one configured MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MCPServerStatus {
    pub id: String,
    pub name: String,
    pub status: ServerState,
    #[serde(default)]
    pub tools: Vec<McpTool>,
    #[serde(default)]
    pub resources: Vec<McpResource>,
    #[serde(default)]
    pub resource_templates: Vec<McpResourceTemplate>,
    #[serde(default)]
    pub prompts: Vec<McpPrompt>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub is_protected_resource: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl MCPServerStatus {
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: ServerState) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            tools: Vec::new(),
            resources: Vec::new(),
            resource_templates: Vec::new(),
            prompts: Vec::new(),
            errors: Vec::new(),
            is_protected_resource: false,
            source_file: None,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
