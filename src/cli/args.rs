use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mcp-hand")]
#[command(version, about = "Terminal profile menu and MCP server dashboard", long_about = None)]
pub struct Args {
    /// State snapshot written by the host
    #[arg(long, global = true, env = "MCPHAND_STATE")]
    pub state: Option<PathBuf>,

    /// Hub API base URL
    #[arg(long, global = true, env = "MCPHAND_API_BASE")]
    pub api_base: Option<String>,

    /// Host messenger URL
    #[arg(long, global = true, env = "MCPHAND_HOST")]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Profile menu (popup when no action is given)
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },

    /// MCP server status
    Mcp {
        #[command(subcommand)]
        action: McpAction,
    },

    /// Show version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// Show the signed-in account and organization
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum McpAction {
    /// List MCP servers
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    /// Whether this invocation takes over the terminal.
    pub fn is_interactive(&self) -> bool {
        matches!(
            self.command,
            None | Some(Command::Profile { action: None })
        )
    }
}
