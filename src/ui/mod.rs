mod app;
mod popup;
mod render;
pub mod selector;
pub mod servers;

pub use app::{App, Services};
pub use popup::run_profile_popup;
pub use selector::{ProfileSelector, SelectAction, SelectorHooks};
pub use servers::{server_cards, McpServersPage, PageOutcome, ServerCard};

/// Top-level views of the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    McpServers,
}

/// Commands the selector hooks send to whoever hosts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
    Close,
    Reload,
    Selected(SelectAction),
}
