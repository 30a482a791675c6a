//! Sample servers shown when the host has not reported any.

use super::status::{MCPServerStatus, McpTool, ServerState};

const SAMPLE_SOURCE: &str = "config.yaml";

fn tools(count: usize) -> Vec<McpTool> {
    (0..count)
        .map(|i| McpTool {
            name: format!("tool-{i}"),
            description: None,
        })
        .collect()
}

fn sample(id: &str, name: &str, status: ServerState, tool_count: usize) -> MCPServerStatus {
    let mut s = MCPServerStatus::new(id, name, status);
    s.tools = tools(tool_count);
    s.source_file = Some(SAMPLE_SOURCE.to_string());
    s
}

pub fn fallback_servers() -> Vec<MCPServerStatus> {
    let mut sentry = sample("sentry-mcp", "Sentry MCP", ServerState::Error, 0);
    sentry.errors = vec!["Connection failed".to_string()];
    sentry.is_protected_resource = true;

    vec![
        sample("linear-mcp", "Linear MCP", ServerState::Connected, 24),
        sentry,
        sample("deepwiki-mcp", "DeepWiki MCP", ServerState::Connected, 3),
        sample("context7-mcp", "Context7 MCP", ServerState::Connected, 2),
    ]
}
