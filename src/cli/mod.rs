mod args;
mod commands;

pub use args::{Args, Command, McpAction, ProfileAction};
pub use commands::run_cli;
