use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::fs;

use super::store::{Action, AppState, Store};
use crate::error::{Error, Result};

/// Read a host-written state snapshot; a missing file is an empty state.
pub async fn load_snapshot(path: &Path) -> Result<AppState> {
    let content = match fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppState::default()),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&content)?)
}

fn load_snapshot_blocking(path: &Path) -> Result<AppState> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Replace the store's state whenever the snapshot file changes.
///
/// The returned watcher must be kept alive for updates to keep flowing.
pub fn watch_snapshot(store: Store, path: PathBuf) -> Result<RecommendedWatcher> {
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::config(format!("invalid state path: {}", path.display())))?;
    std::fs::create_dir_all(&dir)?;

    let target = path.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let event = match res {
            Ok(ev) => ev,
            Err(e) => {
                tracing::warn!(error = %e, "state watcher error");
                return;
            }
        };
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            return;
        }
        if !event.paths.iter().any(|p| p.file_name() == target.file_name()) {
            return;
        }

        match load_snapshot_blocking(&target) {
            Ok(state) => {
                tracing::debug!(path = %target.display(), "state snapshot reloaded");
                store.dispatch(Action::ReplaceState(state));
            }
            // Partial writes show up as parse errors; the next event retries.
            Err(e) => tracing::debug!(error = %e, "state snapshot not readable yet"),
        }
    })
    .map_err(|e| Error::Other(e.to_string()))?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(watcher)
}
