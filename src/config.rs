use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyModifiers};
use serde::Deserialize;
use tokio::fs;

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.continue.dev";
pub const DEFAULT_HOST: &str = "http://127.0.0.1:6189";

/// Base directory for mcp-hand state (`~/.mcp-hand`).
pub fn app_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| Error::config("Cannot determine home directory"))?;
    Ok(home.join(".mcp-hand"))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub state_path: Option<PathBuf>,
    #[serde(default)]
    keybindings: HashMap<String, OneOrMany>,
}

impl ConfigFile {
    pub async fn load() -> Result<Option<Self>> {
        Self::load_from(&app_dir()?.join("config.json")).await
    }

    pub async fn load_from(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(_) => return Ok(None),
        };
        let cfg = serde_json::from_str::<Self>(&content)?;
        Ok(Some(cfg))
    }
}

/// Resolved runtime settings: CLI/env overrides win over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    pub host: String,
    pub state_path: PathBuf,
}

impl Settings {
    pub fn resolve(
        file: Option<&ConfigFile>,
        api_base: Option<String>,
        host: Option<String>,
        state_path: Option<PathBuf>,
    ) -> Result<Self> {
        let api_base = api_base
            .or_else(|| file.and_then(|f| f.api_base.clone()))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let host = host
            .or_else(|| file.and_then(|f| f.host.clone()))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let state_path = match state_path.or_else(|| file.and_then(|f| f.state_path.clone())) {
            Some(p) => p,
            None => app_dir()?.join("state.json"),
        };

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            host: host.trim_end_matches('/').to_string(),
            state_path,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<&'static str, Vec<KeySpec>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut kb = Self {
            bindings: HashMap::new(),
        };

        kb.bindings.insert(
            "quit",
            vec![
                KeySpec::plain(KeyCode::Char('q')),
                KeySpec {
                    code: KeyCode::Char('c'),
                    modifiers: KeyModifiers::CONTROL,
                },
            ],
        );
        kb.bindings
            .insert("cancel", vec![KeySpec::plain(KeyCode::Esc)]);
        kb.bindings.insert(
            "up",
            vec![
                KeySpec::plain(KeyCode::Up),
                KeySpec::plain(KeyCode::Char('k')),
            ],
        );
        kb.bindings.insert(
            "down",
            vec![
                KeySpec::plain(KeyCode::Down),
                KeySpec::plain(KeyCode::Char('j')),
            ],
        );
        kb.bindings
            .insert("select", vec![KeySpec::plain(KeyCode::Enter)]);
        kb.bindings
            .insert("authenticate", vec![KeySpec::plain(KeyCode::Char('a'))]);
        kb.bindings
            .insert("refresh", vec![KeySpec::plain(KeyCode::Char('r'))]);
        kb.bindings
            .insert("edit", vec![KeySpec::plain(KeyCode::Char('e'))]);
        kb.bindings.insert(
            "back",
            vec![
                KeySpec::plain(KeyCode::Esc),
                KeySpec::plain(KeyCode::Left),
                KeySpec::plain(KeyCode::Backspace),
            ],
        );
        kb.bindings
            .insert("profile", vec![KeySpec::plain(KeyCode::Char('p'))]);
        kb.bindings
            .insert("servers", vec![KeySpec::plain(KeyCode::Char('m'))]);

        kb
    }
}

impl KeyBindings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut kb = Self::default();

        for (action, spec) in cfg.keybindings.clone() {
            let mut parsed = Vec::new();
            for s in spec.into_vec() {
                match parse_key_spec(&s) {
                    Some(k) => parsed.push(k),
                    None => tracing::warn!(action = %action, spec = %s, "ignoring unparsable key binding"),
                }
            }
            if !parsed.is_empty() {
                if let Some(slot) = kb.bindings.get_mut(action.as_str()) {
                    *slot = parsed;
                }
            }
        }

        kb
    }

    pub fn matches(&self, action: &'static str, code: &KeyCode, modifiers: KeyModifiers) -> bool {
        // Shift is implied by the character for printable keys.
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        self.bindings
            .get(action)
            .is_some_and(|v| v.iter().any(|k| &k.code == code && k.modifiers == modifiers))
    }
}

fn parse_key_spec(s: &str) -> Option<KeySpec> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let mut modifiers = KeyModifiers::NONE;
    let parts: Vec<&str> = s.split('+').map(|p| p.trim()).collect();
    let (mods, key_part) = if parts.len() >= 2 {
        (&parts[..parts.len() - 1], parts[parts.len() - 1])
    } else {
        (&[][..], parts[0])
    };

    for m in mods {
        match m.to_lowercase().as_str() {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "alt" => modifiers |= KeyModifiers::ALT,
            "shift" => modifiers |= KeyModifiers::SHIFT,
            _ => return None,
        }
    }

    let lower = key_part.to_lowercase();

    let code = match lower.as_str() {
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backtab" => KeyCode::BackTab,
        "backspace" => KeyCode::Backspace,
        "space" => KeyCode::Char(' '),
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        _ => {
            // Single-character fallback (keeps case for e.g. "R")
            if key_part.chars().count() == 1 {
                KeyCode::Char(key_part.chars().next()?)
            } else {
                return None;
            }
        }
    };

    // Mirrors `matches`, which ignores Shift on printable keys.
    if let KeyCode::Char(_) = code {
        modifiers = modifiers.difference(KeyModifiers::SHIFT);
    }

    Some(KeySpec { code, modifiers })
}
