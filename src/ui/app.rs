use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{Event as CrosstermEvent, EventStream, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::api::ApiClientFactory;
use crate::auth::AuthProvider;
use crate::config::KeyBindings;
use crate::error::Result;
use crate::mcp::Messenger;
use crate::state::{load_snapshot, Action, Store};

use super::selector::{ProfileSelector, SelectAction, SelectorHooks};
use super::servers::{McpServersPage, PageOutcome};
use super::{Route, ShellEvent};

/// Collaborators shared by every view.
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn AuthProvider>,
    pub api: Arc<dyn ApiClientFactory>,
    pub messenger: Arc<dyn Messenger>,
    pub store: Store,
    pub keys: KeyBindings,
}

impl Services {
    pub(super) fn mount_selector(&self, events: mpsc::UnboundedSender<ShellEvent>) -> ProfileSelector {
        ProfileSelector::mount(
            self.auth.clone(),
            self.api.clone(),
            shell_hooks(events),
            self.keys.clone(),
        )
    }
}

/// Selector hooks that forward to the shell's event channel.
fn shell_hooks(events: mpsc::UnboundedSender<ShellEvent>) -> SelectorHooks {
    let cancel = events.clone();
    let select = events.clone();
    SelectorHooks::new(move || {
        let _ = cancel.send(ShellEvent::Close);
    })
    .on_select(move |action| {
        let _ = select.send(ShellEvent::Selected(action));
    })
    .on_reload(move || {
        let _ = events.send(ShellEvent::Reload);
    })
}

pub(super) fn is_interrupt(code: &KeyCode, modifiers: KeyModifiers) -> bool {
    *code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL)
}

/// Full-screen shell: home, MCP servers, and the profile menu overlay.
pub struct App {
    services: Services,
    state_path: Option<PathBuf>,

    route: Route,
    servers: McpServersPage,
    selector: Option<ProfileSelector>,

    events_tx: mpsc::UnboundedSender<ShellEvent>,
    events_rx: mpsc::UnboundedReceiver<ShellEvent>,

    status_message: Option<String>,
    should_quit: bool,
    tick_count: u64,
}

impl App {
    pub fn new(services: Services) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let servers = McpServersPage::new(
            services.store.clone(),
            services.messenger.clone(),
            services.keys.clone(),
        );
        Self {
            services,
            state_path: None,
            route: Route::Home,
            servers,
            selector: None,
            events_tx,
            events_rx,
            status_message: None,
            should_quit: false,
            tick_count: 0,
        }
    }

    /// Re-read this snapshot file when the view is reloaded.
    pub fn with_snapshot(mut self, path: PathBuf) -> Self {
        self.state_path = Some(path);
        self
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn servers(&self) -> &McpServersPage {
        &self.servers
    }

    pub fn selector(&self) -> Option<&ProfileSelector> {
        self.selector.as_ref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn profile_title(&self) -> Option<String> {
        self.services.store.selected_profile().map(|p| p.title)
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        terminal.clear()?;

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let mut events = EventStream::new();
        let mut ticker = tokio::time::interval(Duration::from_millis(250));

        loop {
            terminal.draw(|f| super::render::draw(f, self))?;

            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                event = events.next() => match event {
                    Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key.code, key.modifiers).await;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    pub async fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
        if let Some(selector) = self.selector.as_mut() {
            selector.poll_loaded();
        }
        self.servers.tick();
        self.drain_shell_events().await;
    }

    pub async fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if is_interrupt(&code, modifiers) {
            self.should_quit = true;
            return;
        }

        if let Some(selector) = self.selector.as_mut() {
            selector.handle_key(code, modifiers).await;
            self.drain_shell_events().await;
            return;
        }

        let keys = &self.services.keys;
        if keys.matches("quit", &code, modifiers) {
            self.should_quit = true;
            return;
        }
        if keys.matches("profile", &code, modifiers) {
            self.open_selector();
            return;
        }

        match self.route {
            Route::Home => {
                if keys.matches("servers", &code, modifiers) {
                    self.route = Route::McpServers;
                }
            }
            Route::McpServers => {
                if let PageOutcome::Navigate(route) = self.servers.handle_key(code, modifiers) {
                    self.route = route;
                }
            }
        }
    }

    fn open_selector(&mut self) {
        self.status_message = None;
        self.selector = Some(self.services.mount_selector(self.events_tx.clone()));
    }

    async fn drain_shell_events(&mut self) {
        let mut reload = false;
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                ShellEvent::Close => self.selector = None,
                ShellEvent::Reload => reload = true,
                ShellEvent::Selected(action) => {
                    tracing::info!(action = action.as_str(), "profile menu selection");
                    self.status_message = Some(
                        match action {
                            SelectAction::Organization => "Organization switched",
                            SelectAction::Assistant => "Assistant selected",
                            SelectAction::Logout => "Logged out",
                        }
                        .to_string(),
                    );
                }
            }
        }

        if reload {
            self.reload().await;
        }
    }

    /// Rebuild the view: re-read shared state and reopen the menu with fresh data.
    async fn reload(&mut self) {
        if let Some(path) = &self.state_path {
            match load_snapshot(path).await {
                Ok(state) => {
                    self.services.store.dispatch(Action::ReplaceState(state));
                }
                Err(e) => tracing::warn!(error = %e, "failed to reload state snapshot"),
            }
        }
        self.servers.tick();
        self.open_selector();
    }
}
