pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod state;
pub mod ui;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result};

/// Version of mcp-hand
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
