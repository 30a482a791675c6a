use std::collections::HashMap;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyModifiers};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::KeyBindings;
use crate::mcp::messenger::{
    OPEN_PROFILE, RELOAD_SERVER, REMOVE_AUTHENTICATION, START_AUTHENTICATION,
};
use crate::mcp::{fallback_servers, ConfigDocument, MCPServerStatus, McpServerBlock, Messenger, ServerState};
use crate::state::{Action, ProfileDescription, Store};

use super::Route;

/// A server status joined with its config block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCard {
    pub server: MCPServerStatus,
    pub block: Option<McpServerBlock>,
    /// True for the built-in sample list shown when nothing is reported.
    pub sample: bool,
}

/// Build the cards for a server list, falling back to the samples when empty.
pub fn server_cards(
    servers: Vec<MCPServerStatus>,
    profile: Option<&ProfileDescription>,
) -> Vec<ServerCard> {
    let document = profile
        .and_then(|p| p.raw_config.as_deref())
        .and_then(|raw| match ConfigDocument::parse(raw) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::debug!(error = %e, "profile config not parseable");
                None
            }
        });

    let (servers, sample) = if servers.is_empty() {
        (fallback_servers(), true)
    } else {
        (servers, false)
    };

    servers
        .into_iter()
        .map(|server| {
            let block = document
                .as_ref()
                .and_then(|doc| doc.block_for(&server))
                .cloned();
            ServerCard {
                server,
                block,
                sample,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Start,
    Remove,
}

/// The auth affordance for a server, if it has one.
pub fn auth_action(server: &MCPServerStatus) -> Option<AuthAction> {
    if !server.is_protected_resource {
        return None;
    }
    Some(if server.status == ServerState::Error {
        AuthAction::Start
    } else {
        AuthAction::Remove
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackedKind {
    Auth(AuthAction),
    Reload,
}

impl TrackedKind {
    fn topic(&self) -> &'static str {
        match self {
            TrackedKind::Auth(AuthAction::Start) => START_AUTHENTICATION,
            TrackedKind::Auth(AuthAction::Remove) => REMOVE_AUTHENTICATION,
            TrackedKind::Reload => RELOAD_SERVER,
        }
    }

    fn in_flight(&self) -> ServerState {
        match self {
            TrackedKind::Auth(_) => ServerState::Authenticating,
            TrackedKind::Reload => ServerState::Connecting,
        }
    }

    fn payload(&self, server: &MCPServerStatus) -> Value {
        match self {
            TrackedKind::Auth(_) => serde_json::to_value(server).unwrap_or(Value::Null),
            TrackedKind::Reload => json!({ "id": server.id }),
        }
    }
}

#[derive(Debug)]
struct Outcome {
    request_id: Uuid,
    server_id: String,
    kind: TrackedKind,
    previous: ServerState,
    // Store revision for this server right after the in-flight status landed.
    revision: u64,
    result: std::result::Result<(), String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    None,
    Navigate(Route),
}

/// MCP server status page.
pub struct McpServersPage {
    store: Store,
    messenger: Arc<dyn Messenger>,
    keys: KeyBindings,

    cards: Vec<ServerCard>,
    seen_revision: Option<u64>,
    selected: usize,
    notice: Option<String>,

    in_flight: HashMap<String, Uuid>,
    outcomes_tx: mpsc::UnboundedSender<Outcome>,
    outcomes_rx: mpsc::UnboundedReceiver<Outcome>,
}

impl McpServersPage {
    pub fn new(store: Store, messenger: Arc<dyn Messenger>, keys: KeyBindings) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let mut page = Self {
            store,
            messenger,
            keys,
            cards: Vec::new(),
            seen_revision: None,
            selected: 0,
            notice: None,
            in_flight: HashMap::new(),
            outcomes_tx,
            outcomes_rx,
        };
        page.sync();
        page
    }

    pub fn cards(&self) -> &[ServerCard] {
        &self.cards
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_card(&self) -> Option<&ServerCard> {
        self.cards.get(self.selected)
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_showing_samples(&self) -> bool {
        self.cards.first().is_some_and(|c| c.sample)
    }

    pub fn is_in_flight(&self, server_id: &str) -> bool {
        self.in_flight.contains_key(server_id)
    }

    /// Apply finished requests and pick up store changes. Call once per tick.
    pub fn tick(&mut self) {
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.apply_outcome(outcome);
        }
        self.sync();
    }

    /// Wait for the next tracked request to finish and apply it.
    pub async fn settle(&mut self) {
        if let Some(outcome) = self.outcomes_rx.recv().await {
            self.apply_outcome(outcome);
        }
        self.sync();
    }

    fn sync(&mut self) {
        let revision = self.store.revision();
        if self.seen_revision == Some(revision) {
            return;
        }
        self.seen_revision = Some(revision);

        let state = self.store.snapshot();
        self.cards = server_cards(
            state.config.mcp_server_statuses,
            state.selected_profile.as_ref(),
        );
        if self.selected >= self.cards.len() {
            self.selected = self.cards.len().saturating_sub(1);
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> PageOutcome {
        if self.keys.matches("back", &code, modifiers) {
            return PageOutcome::Navigate(Route::Home);
        }

        if self.keys.matches("up", &code, modifiers) {
            self.selected = self.selected.saturating_sub(1);
        } else if self.keys.matches("down", &code, modifiers) {
            self.selected = (self.selected + 1).min(self.cards.len().saturating_sub(1));
        } else if self.keys.matches("authenticate", &code, modifiers) {
            self.authenticate();
        } else if self.keys.matches("refresh", &code, modifiers) {
            self.refresh();
        } else if self.keys.matches("edit", &code, modifiers) {
            self.edit();
        }

        PageOutcome::None
    }

    fn live_card(&mut self) -> Option<ServerCard> {
        let card = self.selected_card()?.clone();
        if card.sample {
            self.notice = Some("Sample server: connect a host to manage MCP servers".to_string());
            return None;
        }
        Some(card)
    }

    /// Start or remove authentication for the selected protected server.
    pub fn authenticate(&mut self) {
        let Some(card) = self.live_card() else {
            return;
        };
        let Some(action) = auth_action(&card.server) else {
            return;
        };
        self.track(&card.server, TrackedKind::Auth(action));
    }

    /// Ask the host to reconnect the selected server.
    pub fn refresh(&mut self) {
        let Some(card) = self.live_card() else {
            return;
        };
        self.track(&card.server, TrackedKind::Reload);
    }

    /// Open the selected server's config source in the host.
    pub fn edit(&mut self) {
        let Some(card) = self.live_card() else {
            return;
        };
        let profile_id = self.store.selected_profile().map(|p| p.id);
        self.messenger.post(
            OPEN_PROFILE,
            json!({
                "profileId": profile_id,
                "sourceFile": card.server.source_file,
            }),
        );
    }

    fn track(&mut self, server: &MCPServerStatus, kind: TrackedKind) {
        if self.in_flight.contains_key(&server.id) {
            tracing::debug!(server = %server.id, "request already in flight");
            return;
        }

        let request_id = Uuid::new_v4();
        self.in_flight.insert(server.id.clone(), request_id);
        self.notice = None;

        let previous = server.status;
        let revision = self.store.dispatch(Action::SetServerStatus {
            id: server.id.clone(),
            status: kind.in_flight(),
        });
        self.sync();

        let payload = kind.payload(server);
        let server_id = server.id.clone();
        let messenger = self.messenger.clone();
        let tx = self.outcomes_tx.clone();
        tracing::info!(server = %server_id, topic = kind.topic(), "mcp request");

        tokio::spawn(async move {
            let result = messenger
                .request(kind.topic(), payload)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string());
            let _ = tx.send(Outcome {
                request_id,
                server_id,
                kind,
                previous,
                revision,
                result,
            });
        });
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        if self.in_flight.get(&outcome.server_id) == Some(&outcome.request_id) {
            self.in_flight.remove(&outcome.server_id);
        }

        let error = match outcome.result {
            Ok(()) => {
                tracing::debug!(server = %outcome.server_id, topic = outcome.kind.topic(), "mcp request done");
                return;
            }
            Err(e) => e,
        };

        tracing::warn!(server = %outcome.server_id, topic = outcome.kind.topic(), error = %error, "mcp request failed");

        // Only roll back if nothing has touched the server since the request went out.
        let untouched = self.store.server_revision(&outcome.server_id) == outcome.revision
            && self
                .store
                .server(&outcome.server_id)
                .is_some_and(|s| s.status == outcome.kind.in_flight());
        if untouched {
            self.store.dispatch(Action::SetServerStatus {
                id: outcome.server_id.clone(),
                status: outcome.previous,
            });
        }
        self.store.dispatch(Action::RecordServerError {
            id: outcome.server_id,
            error,
        });
    }
}
