use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::mcp::{MCPServerStatus, ServerState};

/// Host-side config as seen by the views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    #[serde(default)]
    pub mcp_server_statuses: Vec<MCPServerStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDescription {
    pub id: String,
    pub title: String,
    /// Inline config text, when the profile carries one.
    #[serde(default)]
    pub raw_config: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub config: BrowserConfig,
    #[serde(default)]
    pub selected_profile: Option<ProfileDescription>,
}

#[derive(Debug, Clone)]
pub enum Action {
    ReplaceState(AppState),
    UpdateConfig(BrowserConfig),
    SetServerStatus { id: String, status: ServerState },
    RecordServerError { id: String, error: String },
    SelectProfile(Option<ProfileDescription>),
}

fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::ReplaceState(next) => *state = next,
        Action::UpdateConfig(config) => state.config = config,
        Action::SetServerStatus { id, status } => {
            for s in state
                .config
                .mcp_server_statuses
                .iter_mut()
                .filter(|s| s.id == id)
            {
                s.status = status;
            }
        }
        Action::RecordServerError { id, error } => {
            for s in state
                .config
                .mcp_server_statuses
                .iter_mut()
                .filter(|s| s.id == id)
            {
                s.errors.push(error.clone());
            }
        }
        Action::SelectProfile(profile) => state.selected_profile = profile,
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: AppState,
    // Revision of the last action that touched each server.
    touched: HashMap<String, u64>,
    // Revision of the last whole-list replacement.
    replaced_at: u64,
}

/// Shared application state; cheap to clone, single writer per dispatch.
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<Inner>>,
    revision: Arc<AtomicU64>,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                state,
                ..Inner::default()
            })),
            revision: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Apply an action and return the revision it was assigned.
    pub fn dispatch(&self, action: Action) -> u64 {
        let mut inner = self.inner.write();
        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        match &action {
            Action::ReplaceState(_) | Action::UpdateConfig(_) => inner.replaced_at = revision,
            Action::SetServerStatus { id, .. } | Action::RecordServerError { id, .. } => {
                inner.touched.insert(id.clone(), revision);
            }
            Action::SelectProfile(_) => {}
        }
        reduce(&mut inner.state, action);
        revision
    }

    /// Bumped on every dispatch.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Revision of the last change that could have affected this server.
    pub fn server_revision(&self, id: &str) -> u64 {
        let inner = self.inner.read();
        inner
            .touched
            .get(id)
            .copied()
            .unwrap_or(0)
            .max(inner.replaced_at)
    }

    pub fn snapshot(&self) -> AppState {
        self.inner.read().state.clone()
    }

    pub fn servers(&self) -> Vec<MCPServerStatus> {
        self.inner.read().state.config.mcp_server_statuses.clone()
    }

    pub fn server(&self, id: &str) -> Option<MCPServerStatus> {
        self.inner
            .read()
            .state
            .config
            .mcp_server_statuses
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn selected_profile(&self) -> Option<ProfileDescription> {
        self.inner.read().state.selected_profile.clone()
    }
}
