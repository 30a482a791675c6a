use std::sync::Arc;

use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::oneshot;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::api::{ApiClientFactory, AssistantFilters, AssistantSummary, OrganizationInfo};
use crate::auth::{AuthConfig, AuthProvider};
use crate::config::KeyBindings;
use crate::error::Result;

/// What the user picked, reported through `on_select`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAction {
    Organization,
    Assistant,
    Logout,
}

impl SelectAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectAction::Organization => "organization",
            SelectAction::Assistant => "assistant",
            SelectAction::Logout => "logout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    /// `None` is the personal scope.
    pub id: Option<String>,
    pub name: String,
    pub slug: Option<String>,
    pub icon: &'static str,
}

impl Organization {
    pub fn personal() -> Self {
        Self {
            id: None,
            name: "Personal".to_string(),
            slug: None,
            icon: "👤",
        }
    }
}

impl From<OrganizationInfo> for Organization {
    fn from(info: OrganizationInfo) -> Self {
        Self {
            id: Some(info.id),
            name: info.name,
            slug: info.slug,
            icon: "◆",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantAction {
    Create,
    Reload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantOption {
    pub id: String,
    pub name: String,
    pub slug: Option<String>,
    pub icon: &'static str,
    /// Set on the two sentinel entries.
    pub action: Option<AssistantAction>,
}

impl From<AssistantSummary> for AssistantOption {
    fn from(a: AssistantSummary) -> Self {
        let full = format!("{}/{}", a.owner_slug, a.package_slug);
        Self {
            id: a.package_slug,
            name: full.clone(),
            slug: Some(full),
            icon: "🤖",
            action: None,
        }
    }
}

fn assistant_options(list: Vec<AssistantSummary>) -> Vec<AssistantOption> {
    let mut options: Vec<AssistantOption> = list.into_iter().map(Into::into).collect();
    options.push(AssistantOption {
        id: "new".to_string(),
        name: "+ New Assistant".to_string(),
        slug: None,
        icon: "➕",
        action: Some(AssistantAction::Create),
    });
    options.push(AssistantOption {
        id: "reload".to_string(),
        name: "Reload assistants".to_string(),
        slug: None,
        icon: "🔄",
        action: Some(AssistantAction::Reload),
    });
    options
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSection {
    Organizations,
    Assistants,
    Actions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Organization(Organization),
    Assistant(AssistantOption),
    Logout,
}

impl MenuItem {
    pub fn section(&self) -> MenuSection {
        match self {
            MenuItem::Organization(_) => MenuSection::Organizations,
            MenuItem::Assistant(_) => MenuSection::Assistants,
            MenuItem::Logout => MenuSection::Actions,
        }
    }
}

/// One rendered menu line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRow {
    pub section: MenuSection,
    pub label: String,
    pub selected: bool,
    pub current: bool,
}

/// Everything fetched on mount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileData {
    pub user_email: String,
    pub current_org_id: Option<String>,
    pub organizations: Vec<Organization>,
    pub assistants: Vec<AssistantOption>,
}

/// Fetch the selector's data. `Ok(None)` means nobody is signed in.
///
/// Organization and assistant failures are logged and leave their section empty.
pub async fn load_profile_data(
    auth: &dyn AuthProvider,
    api: &dyn ApiClientFactory,
) -> Result<Option<ProfileData>> {
    let config = auth.load_auth_config().await?;
    let Some(session) = config.as_authenticated() else {
        return Ok(None);
    };

    let mut data = ProfileData {
        user_email: session.user_email.clone(),
        current_org_id: session.organization_id.clone(),
        ..ProfileData::default()
    };

    let orgs = match auth.list_user_organizations().await {
        Ok(orgs) => orgs,
        Err(e) => {
            tracing::error!(error = %e, "failed to load organizations");
            return Ok(Some(data));
        }
    };
    data.organizations = std::iter::once(Organization::personal())
        .chain(orgs.into_iter().map(Organization::from))
        .collect();

    if let Some(token) = config.access_token() {
        let filters = AssistantFilters {
            always_use_proxy: false,
            organization_id: data.current_org_id.clone(),
        };
        let listed = match api.client(token) {
            Ok(client) => client.list_assistants(&filters).await,
            Err(e) => Err(e),
        };
        match listed {
            Ok(list) => data.assistants = assistant_options(list),
            Err(e) => tracing::warn!(error = %e, "failed to load assistants"),
        }
    }

    Ok(Some(data))
}

type SelectHook = Box<dyn FnMut(SelectAction) + Send>;
type PlainHook = Box<dyn FnMut() + Send>;

/// Callbacks the host wires into the selector.
pub struct SelectorHooks {
    on_select: Option<SelectHook>,
    on_cancel: PlainHook,
    on_reload: Option<PlainHook>,
}

impl SelectorHooks {
    pub fn new(on_cancel: impl FnMut() + Send + 'static) -> Self {
        Self {
            on_select: None,
            on_cancel: Box::new(on_cancel),
            on_reload: None,
        }
    }

    pub fn on_select(mut self, f: impl FnMut(SelectAction) + Send + 'static) -> Self {
        self.on_select = Some(Box::new(f));
        self
    }

    /// Host command to rebuild the surrounding view.
    pub fn on_reload(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_reload = Some(Box::new(f));
        self
    }

    fn select(&mut self, action: SelectAction) {
        if let Some(f) = self.on_select.as_mut() {
            f(action);
        }
    }

    fn cancel(&mut self) {
        (self.on_cancel)();
    }

    fn reload(&mut self) {
        if let Some(f) = self.on_reload.as_mut() {
            f();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Loading,
    Unauthenticated,
    Ready,
}

/// Organization / assistant / account menu.
pub struct ProfileSelector {
    auth: Arc<dyn AuthProvider>,
    hooks: SelectorHooks,
    keys: KeyBindings,

    phase: Phase,
    selected_index: usize,
    user_email: String,
    current_org_id: Option<String>,
    organizations: Vec<Organization>,
    assistants: Vec<AssistantOption>,

    pending: Option<oneshot::Receiver<Result<Option<ProfileData>>>>,
    // Cancels the loader when the selector goes away.
    _alive: DropGuard,
}

impl ProfileSelector {
    /// Create the selector and start loading its data in the background.
    pub fn mount(
        auth: Arc<dyn AuthProvider>,
        api: Arc<dyn ApiClientFactory>,
        hooks: SelectorHooks,
        keys: KeyBindings,
    ) -> Self {
        let token = CancellationToken::new();
        let (tx, rx) = oneshot::channel();

        let loader_token = token.clone();
        let loader_auth = auth.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = loader_token.cancelled() => return,
                r = load_profile_data(loader_auth.as_ref(), api.as_ref()) => r,
            };
            if loader_token.is_cancelled() {
                tracing::debug!("profile selector gone, dropping load result");
                return;
            }
            let _ = tx.send(result);
        });

        Self {
            auth,
            hooks,
            keys,
            phase: Phase::Loading,
            selected_index: 0,
            user_email: String::new(),
            current_org_id: None,
            organizations: Vec::new(),
            assistants: Vec::new(),
            pending: Some(rx),
            _alive: token.drop_guard(),
        }
    }

    /// Apply the load result if it has arrived. Returns true when state changed.
    pub fn poll_loaded(&mut self) -> bool {
        let Some(rx) = self.pending.as_mut() else {
            return false;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.pending = None;
                self.apply_loaded(result);
                true
            }
            Err(oneshot::error::TryRecvError::Empty) => false,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.pending = None;
                self.apply_loaded(Ok(None));
                true
            }
        }
    }

    /// Wait for the initial load to finish.
    pub async fn loaded(&mut self) {
        let Some(rx) = self.pending.take() else {
            return;
        };
        let result = rx.await.unwrap_or(Ok(None));
        self.apply_loaded(result);
    }

    fn apply_loaded(&mut self, result: Result<Option<ProfileData>>) {
        match result {
            Ok(Some(data)) => {
                self.user_email = data.user_email;
                self.current_org_id = data.current_org_id;
                self.organizations = data.organizations;
                self.assistants = data.assistants;
                self.selected_index = self.current_index().unwrap_or(0);
                self.phase = Phase::Ready;
            }
            Ok(None) => {
                self.phase = Phase::Unauthenticated;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load profile data");
                self.phase = Phase::Unauthenticated;
            }
        }
        self.clamp_selection();
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    pub fn current_org_id(&self) -> Option<&str> {
        self.current_org_id.as_deref()
    }

    pub fn organizations(&self) -> &[Organization] {
        &self.organizations
    }

    pub fn assistants(&self) -> &[AssistantOption] {
        &self.assistants
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    /// Number of navigable items.
    pub fn len(&self) -> usize {
        if self.phase != Phase::Ready {
            return 0;
        }
        self.organizations.len() + self.assistants.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the current organization; the first match wins.
    pub fn current_index(&self) -> Option<usize> {
        self.organizations
            .iter()
            .position(|o| o.id == self.current_org_id)
    }

    pub fn item_at(&self, index: usize) -> Option<MenuItem> {
        if index >= self.len() {
            return None;
        }
        let orgs = self.organizations.len();
        let assistants = self.assistants.len();
        if index < orgs {
            Some(MenuItem::Organization(self.organizations[index].clone()))
        } else if index < orgs + assistants {
            Some(MenuItem::Assistant(self.assistants[index - orgs].clone()))
        } else {
            Some(MenuItem::Logout)
        }
    }

    pub fn rows(&self) -> Vec<MenuRow> {
        let current = self.current_index();
        (0..self.len())
            .filter_map(|i| self.item_at(i).map(|item| (i, item)))
            .map(|(i, item)| {
                let selected = i == self.selected_index;
                let is_current = current == Some(i);
                let mut label = match &item {
                    MenuItem::Organization(o) => format!("{} {}", o.icon, o.name),
                    MenuItem::Assistant(a) => format!("{} {}", a.icon, a.name),
                    MenuItem::Logout => "Log out".to_string(),
                };
                if is_current {
                    label.push_str(" ✓");
                }
                if selected {
                    label.push_str(" →");
                }
                MenuRow {
                    section: item.section(),
                    label,
                    selected,
                    current: is_current,
                }
            })
            .collect()
    }

    fn clamp_selection(&mut self) {
        let len = self.len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    pub fn move_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.selected_index = (self.selected_index + 1).min(self.len().saturating_sub(1));
    }

    pub async fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if self.keys.matches("cancel", &code, modifiers) {
            self.hooks.cancel();
            return;
        }

        if self.keys.matches("up", &code, modifiers) {
            self.move_up();
        } else if self.keys.matches("down", &code, modifiers) {
            self.move_down();
        } else if self.keys.matches("select", &code, modifiers) {
            self.activate().await;
        }
    }

    /// Act on the selected item; closes the menu when the action succeeded.
    pub async fn activate(&mut self) {
        let Some(item) = self.item_at(self.selected_index) else {
            return;
        };

        let done = match item {
            MenuItem::Organization(org) => match self.switch_organization(org.id).await {
                Ok(switched) => switched,
                Err(e) => {
                    tracing::error!(error = %e, "failed to switch organization");
                    false
                }
            },
            MenuItem::Assistant(a) if a.action == Some(AssistantAction::Reload) => {
                self.hooks.reload();
                true
            }
            MenuItem::Assistant(_) => {
                self.hooks.select(SelectAction::Assistant);
                true
            }
            MenuItem::Logout => match self.auth.logout().await {
                Ok(()) => {
                    self.hooks.select(SelectAction::Logout);
                    true
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to log out");
                    false
                }
            },
        };

        if done {
            self.hooks.cancel();
        }
    }

    async fn switch_organization(&mut self, org_id: Option<String>) -> Result<bool> {
        let AuthConfig::Authenticated(mut session) = self.auth.load_auth_config().await? else {
            tracing::warn!("cannot switch organization while signed out");
            return Ok(false);
        };

        session.organization_id = org_id.clone();
        self.auth
            .save_auth_config(&AuthConfig::Authenticated(session))
            .await?;

        tracing::info!(organization = org_id.as_deref().unwrap_or("personal"), "switched organization");
        self.current_org_id = org_id;
        self.hooks.select(SelectAction::Organization);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::auth::AuthenticatedConfig;
    use crate::error::Error;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeAuth {
        config: Mutex<Option<AuthenticatedConfig>>,
        orgs: Vec<OrganizationInfo>,
        fail_orgs: bool,
        fail_save: bool,
        gate: Option<Arc<Notify>>,
        org_calls: AtomicUsize,
        logout_calls: AtomicUsize,
    }

    impl FakeAuth {
        fn signed_in(email: &str, org: Option<&str>) -> Self {
            Self {
                config: Mutex::new(Some(AuthenticatedConfig {
                    user_id: "u1".to_string(),
                    user_email: email.to_string(),
                    access_token: "tok".to_string(),
                    refresh_token: None,
                    expires_at: None,
                    organization_id: org.map(str::to_string),
                })),
                ..Self::default()
            }
        }

        fn with_orgs(mut self, orgs: &[(&str, &str)]) -> Self {
            self.orgs = orgs
                .iter()
                .map(|(id, name)| OrganizationInfo {
                    id: id.to_string(),
                    name: name.to_string(),
                    slug: None,
                })
                .collect();
            self
        }
    }

    #[async_trait]
    impl AuthProvider for FakeAuth {
        async fn load_auth_config(&self) -> Result<AuthConfig> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(match self.config.lock().clone() {
                Some(cfg) => AuthConfig::Authenticated(cfg),
                None => AuthConfig::Unauthenticated,
            })
        }

        async fn save_auth_config(&self, config: &AuthConfig) -> Result<()> {
            if self.fail_save {
                return Err(Error::auth("disk full"));
            }
            *self.config.lock() = config.as_authenticated().cloned();
            Ok(())
        }

        async fn logout(&self) -> Result<()> {
            self.logout_calls.fetch_add(1, Ordering::SeqCst);
            *self.config.lock() = None;
            Ok(())
        }

        async fn list_user_organizations(&self) -> Result<Vec<OrganizationInfo>> {
            self.org_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_orgs {
                return Err(Error::api("offline"));
            }
            Ok(self.orgs.clone())
        }
    }

    struct FakeApi {
        assistants: Option<Vec<AssistantSummary>>,
        seen_filters: Arc<Mutex<Vec<AssistantFilters>>>,
    }

    impl FakeApi {
        fn with(assistants: &[(&str, &str)]) -> Self {
            Self {
                assistants: Some(
                    assistants
                        .iter()
                        .map(|(o, p)| AssistantSummary {
                            owner_slug: o.to_string(),
                            package_slug: p.to_string(),
                        })
                        .collect(),
                ),
                seen_filters: Arc::default(),
            }
        }

        fn failing() -> Self {
            Self {
                assistants: None,
                seen_filters: Arc::default(),
            }
        }
    }

    struct FakeClient {
        assistants: Option<Vec<AssistantSummary>>,
        seen_filters: Arc<Mutex<Vec<AssistantFilters>>>,
    }

    #[async_trait]
    impl ApiClient for FakeClient {
        async fn list_assistants(&self, filters: &AssistantFilters) -> Result<Vec<AssistantSummary>> {
            self.seen_filters.lock().push(filters.clone());
            self.assistants
                .clone()
                .ok_or_else(|| Error::api("assistants unavailable"))
        }

        async fn list_organizations(&self) -> Result<Vec<OrganizationInfo>> {
            Ok(Vec::new())
        }
    }

    impl ApiClientFactory for FakeApi {
        fn client(&self, _access_token: &str) -> Result<Arc<dyn ApiClient>> {
            Ok(Arc::new(FakeClient {
                assistants: self.assistants.clone(),
                seen_filters: self.seen_filters.clone(),
            }))
        }
    }

    fn recording_hooks() -> (SelectorHooks, Arc<Mutex<Vec<String>>>) {
        let log: Arc<Mutex<Vec<String>>> = Arc::default();
        let (a, b, c) = (log.clone(), log.clone(), log.clone());
        let hooks = SelectorHooks::new(move || a.lock().push("cancel".to_string()))
            .on_select(move |action| b.lock().push(format!("select:{}", action.as_str())))
            .on_reload(move || c.lock().push("reload".to_string()));
        (hooks, log)
    }

    async fn mounted(auth: FakeAuth, api: FakeApi) -> (ProfileSelector, Arc<Mutex<Vec<String>>>) {
        let (hooks, log) = recording_hooks();
        let mut sel = ProfileSelector::mount(
            Arc::new(auth),
            Arc::new(api),
            hooks,
            KeyBindings::default(),
        );
        sel.loaded().await;
        (sel, log)
    }

    async fn press(sel: &mut ProfileSelector, code: KeyCode) {
        sel.handle_key(code, KeyModifiers::NONE).await;
    }

    #[tokio::test]
    async fn test_personal_scope_scenario() {
        let auth = FakeAuth::signed_in("a@b.com", None).with_orgs(&[("org-1", "Acme")]);
        let (sel, _log) = mounted(auth, FakeApi::with(&[])).await;

        let rows = sel.rows();
        assert_eq!(rows[0].label, "👤 Personal ✓ →");
        assert_eq!(rows[1].label, "◆ Acme");
        assert!(!rows[1].current);
        assert_eq!(sel.selected_index(), 0);
        assert_eq!(sel.user_email(), "a@b.com");
    }

    #[tokio::test]
    async fn test_flattened_length_and_order() {
        let auth = FakeAuth::signed_in("a@b.com", None).with_orgs(&[("o1", "One"), ("o2", "Two")]);
        let api = FakeApi::with(&[("acme", "a"), ("acme", "b"), ("me", "c")]);
        let (sel, _log) = mounted(auth, api).await;

        assert_eq!(sel.len(), 1 + 2 + 3 + 2 + 1);

        let sections: Vec<MenuSection> = sel.rows().iter().map(|r| r.section).collect();
        assert_eq!(sections[..3], [MenuSection::Organizations; 3]);
        assert_eq!(sections[3..8], [MenuSection::Assistants; 5]);
        assert_eq!(sections[8], MenuSection::Actions);

        let names: Vec<String> = sel.assistants().iter().map(|a| a.name.clone()).collect();
        assert_eq!(
            names,
            ["acme/a", "acme/b", "me/c", "+ New Assistant", "Reload assistants"]
        );
        assert_eq!(sel.item_at(8), Some(MenuItem::Logout));
        assert_eq!(sel.item_at(9), None);
    }

    #[tokio::test]
    async fn test_preselects_current_organization() {
        let auth =
            FakeAuth::signed_in("a@b.com", Some("o2")).with_orgs(&[("o1", "One"), ("o2", "Two")]);
        let api = FakeApi::with(&[]);
        let filters = api.seen_filters.clone();
        let (sel, _log) = mounted(auth, api).await;

        assert_eq!(sel.selected_index(), 2);
        assert_eq!(sel.current_index(), Some(2));
        assert_eq!(filters.lock()[0].organization_id.as_deref(), Some("o2"));
        assert!(!filters.lock()[0].always_use_proxy);
    }

    #[tokio::test]
    async fn test_at_most_one_current() {
        let auth =
            FakeAuth::signed_in("a@b.com", Some("dup")).with_orgs(&[("dup", "A"), ("dup", "B")]);
        let (sel, _log) = mounted(auth, FakeApi::with(&[])).await;

        let current: Vec<usize> = sel
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.current)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(current, [1]);
    }

    #[tokio::test]
    async fn test_navigation_is_clamped() {
        let auth = FakeAuth::signed_in("a@b.com", None).with_orgs(&[("o1", "One")]);
        let (mut sel, _log) = mounted(auth, FakeApi::with(&[])).await;
        let len = sel.len();
        assert_eq!(len, 5);

        press(&mut sel, KeyCode::Up).await;
        assert_eq!(sel.selected_index(), 0);

        for n in 1..=8 {
            press(&mut sel, KeyCode::Down).await;
            assert_eq!(sel.selected_index(), n.min(len - 1));
        }

        for _ in 0..20 {
            press(&mut sel, KeyCode::Up).await;
        }
        assert_eq!(sel.selected_index(), 0);
    }

    #[tokio::test]
    async fn test_logout_fires_each_hook_once() {
        let auth = Arc::new(FakeAuth::signed_in("a@b.com", None).with_orgs(&[("o1", "One")]));
        let (hooks, log) = recording_hooks();
        let mut sel = ProfileSelector::mount(
            auth.clone(),
            Arc::new(FakeApi::with(&[])),
            hooks,
            KeyBindings::default(),
        );
        sel.loaded().await;

        for _ in 0..sel.len() {
            press(&mut sel, KeyCode::Down).await;
        }
        assert_eq!(sel.item_at(sel.selected_index()), Some(MenuItem::Logout));
        press(&mut sel, KeyCode::Enter).await;

        assert_eq!(auth.logout_calls.load(Ordering::SeqCst), 1);
        assert_eq!(*log.lock(), ["select:logout", "cancel"]);
    }

    #[tokio::test]
    async fn test_switch_organization_persists() {
        let auth = Arc::new(FakeAuth::signed_in("a@b.com", None).with_orgs(&[("org-1", "Acme")]));
        let (hooks, log) = recording_hooks();
        let mut sel = ProfileSelector::mount(
            auth.clone(),
            Arc::new(FakeApi::with(&[])),
            hooks,
            KeyBindings::default(),
        );
        sel.loaded().await;

        press(&mut sel, KeyCode::Down).await;
        press(&mut sel, KeyCode::Enter).await;

        let saved = auth.config.lock().clone().unwrap();
        assert_eq!(saved.organization_id.as_deref(), Some("org-1"));
        assert_eq!(sel.current_org_id(), Some("org-1"));
        assert_eq!(*log.lock(), ["select:organization", "cancel"]);
    }

    #[tokio::test]
    async fn test_failed_switch_keeps_menu_open() {
        let mut auth = FakeAuth::signed_in("a@b.com", None).with_orgs(&[("org-1", "Acme")]);
        auth.fail_save = true;
        let (mut sel, log) = mounted(auth, FakeApi::with(&[])).await;

        press(&mut sel, KeyCode::Down).await;
        press(&mut sel, KeyCode::Enter).await;

        assert!(log.lock().is_empty());
        assert_eq!(sel.current_org_id(), None);
        assert_eq!(sel.selected_index(), 1);
    }

    #[tokio::test]
    async fn test_assistant_and_create_select_assistant() {
        let auth = FakeAuth::signed_in("a@b.com", None);
        let (mut sel, log) = mounted(auth, FakeApi::with(&[("acme", "bot")])).await;

        // Personal, acme/bot, + New, Reload, Log out
        press(&mut sel, KeyCode::Down).await;
        press(&mut sel, KeyCode::Enter).await;
        press(&mut sel, KeyCode::Down).await;
        press(&mut sel, KeyCode::Enter).await;

        assert_eq!(
            *log.lock(),
            ["select:assistant", "cancel", "select:assistant", "cancel"]
        );
    }

    #[tokio::test]
    async fn test_reload_sentinel_asks_host() {
        let auth = FakeAuth::signed_in("a@b.com", None);
        let (mut sel, log) = mounted(auth, FakeApi::with(&[])).await;

        // Personal, + New, Reload, Log out
        press(&mut sel, KeyCode::Down).await;
        press(&mut sel, KeyCode::Down).await;
        press(&mut sel, KeyCode::Enter).await;

        assert_eq!(*log.lock(), ["reload", "cancel"]);
    }

    #[tokio::test]
    async fn test_unauthenticated_is_inert() {
        let (mut sel, log) = mounted(FakeAuth::default(), FakeApi::with(&[])).await;

        assert!(!sel.is_loading());
        assert!(!sel.is_authenticated());
        assert!(sel.is_empty());

        press(&mut sel, KeyCode::Down).await;
        press(&mut sel, KeyCode::Enter).await;
        assert!(log.lock().is_empty());

        press(&mut sel, KeyCode::Esc).await;
        assert_eq!(*log.lock(), ["cancel"]);
    }

    #[tokio::test]
    async fn test_no_token_skips_assistants() {
        let auth = FakeAuth::signed_in("a@b.com", None).with_orgs(&[("o1", "One")]);
        auth.config.lock().as_mut().unwrap().access_token.clear();
        let (sel, _log) = mounted(auth, FakeApi::with(&[("acme", "bot")])).await;

        assert!(sel.assistants().is_empty());
        assert_eq!(sel.len(), 1 + 1 + 1);
    }

    #[tokio::test]
    async fn test_assistant_failure_leaves_section_empty() {
        let auth = FakeAuth::signed_in("a@b.com", None).with_orgs(&[("o1", "One")]);
        let (sel, _log) = mounted(auth, FakeApi::failing()).await;

        assert!(sel.assistants().is_empty());
        assert_eq!(sel.len(), 3);
    }

    #[tokio::test]
    async fn test_organization_failure_keeps_account_actions() {
        let mut auth = FakeAuth::signed_in("a@b.com", None);
        auth.fail_orgs = true;
        let (sel, _log) = mounted(auth, FakeApi::with(&[])).await;

        assert!(sel.is_authenticated());
        assert_eq!(sel.user_email(), "a@b.com");
        assert_eq!(sel.len(), 1);
        assert_eq!(sel.item_at(0), Some(MenuItem::Logout));
    }

    #[tokio::test]
    async fn test_escape_while_loading() {
        let mut auth = FakeAuth::signed_in("a@b.com", None);
        auth.gate = Some(Arc::new(Notify::new()));
        let (hooks, log) = recording_hooks();
        let mut sel = ProfileSelector::mount(
            Arc::new(auth),
            Arc::new(FakeApi::with(&[])),
            hooks,
            KeyBindings::default(),
        );

        assert!(sel.is_loading());
        assert!(!sel.poll_loaded());
        press(&mut sel, KeyCode::Enter).await;
        press(&mut sel, KeyCode::Esc).await;
        assert_eq!(*log.lock(), ["cancel"]);
    }

    #[tokio::test]
    async fn test_dropped_selector_discards_load() {
        let gate = Arc::new(Notify::new());
        let mut auth = FakeAuth::signed_in("a@b.com", None).with_orgs(&[("o1", "One")]);
        auth.gate = Some(gate.clone());
        let auth = Arc::new(auth);

        let sel = ProfileSelector::mount(
            auth.clone(),
            Arc::new(FakeApi::with(&[])),
            SelectorHooks::new(|| {}),
            KeyBindings::default(),
        );
        tokio::task::yield_now().await;
        drop(sel);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        gate.notify_one();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert_eq!(auth.org_calls.load(Ordering::SeqCst), 0);
    }
}
