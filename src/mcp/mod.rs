pub mod config;
pub mod fixtures;
pub mod messenger;
pub mod status;

pub use config::{ConfigDocument, McpServerBlock};
pub use fixtures::fallback_servers;
pub use messenger::{HttpMessenger, Messenger};
pub use status::{MCPServerStatus, McpPrompt, McpResource, McpResourceTemplate, McpTool, ServerState};
