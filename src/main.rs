use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use clap::Parser;
use mcp_hand::cli::{run_cli, Args};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    // Parse CLI args
    let args = Args::parse();

    init_logging(args.is_interactive());

    // Run CLI or TUI
    if let Err(e) = run_cli(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(interactive: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The TUI owns the terminal, so its logs go to a file.
    if interactive {
        if let Some(file) = log_file() {
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
            return;
        }
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn log_file() -> Option<File> {
    let dir = mcp_hand::config::app_dir().ok()?;
    std::fs::create_dir_all(&dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("mcp-hand.log"))
        .ok()
}
