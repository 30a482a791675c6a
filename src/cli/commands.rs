use std::sync::Arc;

use serde_json::json;

use crate::api::{ApiClientFactory, HubClientFactory};
use crate::auth::{AuthProvider, FileAuthStore};
use crate::cli::{Args, Command, McpAction, ProfileAction};
use crate::config::{ConfigFile, KeyBindings, Settings};
use crate::error::Result;
use crate::mcp::{HttpMessenger, ServerState};
use crate::state::{load_snapshot, watch_snapshot, Store};
use crate::ui::{run_profile_popup, server_cards, App, ServerCard, Services};

pub async fn run_cli(args: Args) -> Result<()> {
    let Args {
        state,
        api_base,
        host,
        command,
    } = args;

    if let Some(Command::Version) = command {
        println!("mcp-hand v{}", crate::VERSION);
        return Ok(());
    }

    let file = match ConfigFile::load().await {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable config file");
            None
        }
    };
    let settings = Settings::resolve(file.as_ref(), api_base, host, state)?;
    let keys = file
        .as_ref()
        .map(KeyBindings::from_config)
        .unwrap_or_default();

    match command {
        Some(Command::Profile { action: None }) => {
            let services = build_services(&settings, keys).await?;
            if let Some(action) = run_profile_popup(services).await? {
                println!("{}", action.as_str());
            }
            Ok(())
        }

        Some(Command::Profile {
            action: Some(ProfileAction::Show { json }),
        }) => handle_profile_show(&settings, json).await,

        Some(Command::Mcp {
            action: McpAction::List { json },
        }) => handle_mcp_list(&settings, json).await,

        Some(Command::Version) => Ok(()),

        None => {
            let services = build_services(&settings, keys).await?;
            // Host status updates stream in through the snapshot file.
            let _watcher = match watch_snapshot(services.store.clone(), settings.state_path.clone()) {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::warn!(error = %e, "state snapshot watch disabled");
                    None
                }
            };

            let mut app = App::new(services).with_snapshot(settings.state_path.clone());
            app.run().await
        }
    }
}

fn api_factory(settings: &Settings) -> Arc<dyn ApiClientFactory> {
    Arc::new(HubClientFactory::new(settings.api_base.clone()))
}

async fn build_services(settings: &Settings, keys: KeyBindings) -> Result<Services> {
    let api = api_factory(settings);
    let auth = Arc::new(FileAuthStore::default_location(api.clone())?);
    let messenger = Arc::new(HttpMessenger::new(&settings.host)?);
    let store = Store::new(load_snapshot(&settings.state_path).await?);

    tracing::debug!(
        api_base = %settings.api_base,
        host = %settings.host,
        state = %settings.state_path.display(),
        "services ready"
    );

    Ok(Services {
        auth,
        api,
        messenger,
        store,
        keys,
    })
}

async fn handle_profile_show(settings: &Settings, json: bool) -> Result<()> {
    let auth = FileAuthStore::default_location(api_factory(settings))?;
    let config = auth.load_auth_config().await?;
    let session = config.as_authenticated();

    if json {
        let out = json!({
            "authenticated": session.is_some(),
            "userEmail": session.map(|s| s.user_email.as_str()),
            "organizationId": config.organization_id(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match session {
        Some(s) => println!(
            "Signed in as {} (organization: {})",
            s.user_email,
            s.organization_id.as_deref().unwrap_or("personal")
        ),
        None => println!("Not signed in"),
    }
    Ok(())
}

async fn handle_mcp_list(settings: &Settings, json: bool) -> Result<()> {
    let state = load_snapshot(&settings.state_path).await?;
    let cards = server_cards(
        state.config.mcp_server_statuses,
        state.selected_profile.as_ref(),
    );
    let sample = cards.first().is_some_and(|c| c.sample);

    if json {
        let servers: Vec<_> = cards.iter().map(|c| &c.server).collect();
        let out = json!({ "sample": sample, "servers": servers });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if sample {
        println!("No MCP servers reported; showing sample servers.");
    }
    for card in &cards {
        print_card(card);
    }
    Ok(())
}

fn print_card(card: &ServerCard) {
    let s = &card.server;
    let icon = match s.status {
        ServerState::Connected => "●",
        ServerState::Connecting | ServerState::Authenticating => "◐",
        ServerState::Error => "✗",
        ServerState::NotConnected => "○",
    };

    println!(
        "{} {:<24} {:<14} tools {} · resources {} · templates {}{}",
        icon,
        truncate(&s.name, 24),
        s.status.as_str(),
        s.tools.len(),
        s.resources.len(),
        s.resource_templates.len(),
        if card.sample { "  (sample)" } else { "" }
    );
    if let Some(source) = &s.source_file {
        println!("    source: {}", source);
    }
    if let Some(block) = &card.block {
        let summary = block.summary();
        if !summary.is_empty() {
            println!("    launch: {}", summary);
        }
    }
    for err in &s.errors {
        println!("    error: {}", err);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
