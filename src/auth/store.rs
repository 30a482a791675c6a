use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use fs2::FileExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{AuthConfig, AuthProvider, AuthenticatedConfig};
use crate::api::{ApiClientFactory, OrganizationInfo};
use crate::config::app_dir;
use crate::error::{Error, Result};

/// Auth session stored as JSON next to the rest of the app state.
pub struct FileAuthStore {
    path: PathBuf,
    api: Arc<dyn ApiClientFactory>,
}

impl FileAuthStore {
    pub fn new(path: PathBuf, api: Arc<dyn ApiClientFactory>) -> Self {
        Self { path, api }
    }

    /// Store at `~/.mcp-hand/auth.json`.
    pub fn default_location(api: Arc<dyn ApiClientFactory>) -> Result<Self> {
        Ok(Self::new(app_dir()?.join("auth.json"), api))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exclusive advisory lock so concurrent instances don't interleave writes.
    ///
    /// Waiting for the lock happens on the blocking pool.
    async fn lock(&self) -> Result<std::fs::File> {
        let lock_path = self.path.with_extension("lock");
        tokio::task::spawn_blocking(move || -> Result<std::fs::File> {
            if let Some(dir) = lock_path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let lock = std::fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            lock.lock_exclusive()?;
            Ok(lock)
        })
        .await
        .map_err(|e| Error::Other(format!("auth lock task failed: {e}")))?
    }

    async fn write_atomic(&self, cfg: &AuthenticatedConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(cfg)?;

        // A leftover temp file may carry looser permissions; start fresh.
        let temp_path = self.path.with_extension("tmp");
        match fs::remove_file(&temp_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&temp_path).await?;

        let written = async {
            file.write_all(json.as_bytes()).await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for FileAuthStore {
    async fn load_auth_config(&self) -> Result<AuthConfig> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AuthConfig::Unauthenticated)
            }
            Err(e) => return Err(e.into()),
        };

        let parsed: Option<AuthenticatedConfig> = serde_json::from_str(&content)?;
        Ok(match parsed {
            Some(cfg) => AuthConfig::Authenticated(cfg),
            None => AuthConfig::Unauthenticated,
        })
    }

    async fn save_auth_config(&self, config: &AuthConfig) -> Result<()> {
        let lock = self.lock().await?;

        let result = match config {
            AuthConfig::Authenticated(cfg) => self.write_atomic(cfg).await,
            AuthConfig::Unauthenticated => match fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
        };

        FileExt::unlock(&lock)?;
        result
    }

    async fn logout(&self) -> Result<()> {
        self.save_auth_config(&AuthConfig::Unauthenticated).await?;
        tracing::info!("signed out");
        Ok(())
    }

    async fn list_user_organizations(&self) -> Result<Vec<OrganizationInfo>> {
        let cfg = self.load_auth_config().await?;
        let token = cfg
            .access_token()
            .ok_or_else(|| Error::auth("not signed in"))?;
        self.api.client(token)?.list_organizations().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HubClientFactory;
    use tempfile::tempdir;

    fn store(dir: &Path) -> FileAuthStore {
        FileAuthStore::new(
            dir.join("auth.json"),
            Arc::new(HubClientFactory::new("http://127.0.0.1:9")),
        )
    }

    fn session(org: Option<&str>) -> AuthConfig {
        AuthConfig::Authenticated(AuthenticatedConfig {
            user_id: "u1".to_string(),
            user_email: "a@b.com".to_string(),
            access_token: "tok".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: None,
            organization_id: org.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_missing_file_is_unauthenticated() {
        let dir = tempdir().unwrap();
        let cfg = store(dir.path()).load_auth_config().await.unwrap();
        assert_eq!(cfg, AuthConfig::Unauthenticated);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        store.save_auth_config(&session(Some("org-9"))).await.unwrap();
        let loaded = store.load_auth_config().await.unwrap();

        assert_eq!(loaded, session(Some("org-9")));
        assert_eq!(loaded.organization_id(), Some("org-9"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_session_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = store(dir.path());
        // stale, world-readable temp file from an interrupted save
        let temp = dir.path().join("auth.tmp");
        std::fs::write(&temp, "partial").unwrap();
        std::fs::set_permissions(&temp, std::fs::Permissions::from_mode(0o644)).unwrap();

        store.save_auth_config(&session(None)).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!temp.exists());
        assert_eq!(store.load_auth_config().await.unwrap(), session(None));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_save_waits_for_lock_without_blocking_runtime() {
        use fs2::FileExt;
        use std::time::Duration;

        let dir = tempdir().unwrap();
        let store = Arc::new(store(dir.path()));

        // another instance holds the lock
        let held = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(dir.path().join("auth.lock"))
            .unwrap();
        held.lock_exclusive().unwrap();

        let saver = {
            let store = store.clone();
            tokio::spawn(async move { store.save_auth_config(&session(Some("org-1"))).await })
        };

        // the runtime keeps serving other tasks while the save waits
        let ticked = tokio::spawn(async { tokio::time::sleep(Duration::from_millis(50)).await });
        tokio::time::timeout(Duration::from_secs(2), ticked)
            .await
            .unwrap()
            .unwrap();
        assert!(!saver.is_finished());

        FileExt::unlock(&held).unwrap();
        saver.await.unwrap().unwrap();
        assert_eq!(
            store.load_auth_config().await.unwrap().organization_id(),
            Some("org-1")
        );
    }

    #[tokio::test]
    async fn test_null_file_is_unauthenticated() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("auth.json"), "null").unwrap();
        let cfg = store(dir.path()).load_auth_config().await.unwrap();
        assert!(!cfg.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        store.save_auth_config(&session(None)).await.unwrap();
        store.logout().await.unwrap();

        assert!(!store.path().exists());
        assert_eq!(
            store.load_auth_config().await.unwrap(),
            AuthConfig::Unauthenticated
        );
        // logging out twice is fine
        store.logout().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_organizations_requires_session() {
        let dir = tempdir().unwrap();
        let err = store(dir.path())
            .list_user_organizations()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
