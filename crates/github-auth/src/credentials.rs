//! Credential manager
//!
//! Owns the decision of which backend is authoritative. After any
//! successful write exactly one of the keyring entry and the token file
//! holds the token:
//!
//! - vault mode writes the keyring, then removes any stale token file
//! - file mode removes any keyring entry, then writes the token file
//!
//! Reads probe the keyring first and fall through to the file. Deletes
//! always attempt both backends because external state may have changed
//! since the last write.
//!
//! Cross-process races (two invocations interleaving a delete with a write)
//! are not guarded against.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constants::{APP_NAME, VAULT_ACCOUNT, VAULT_SERVICE};
use crate::error::{Error, Result};
use crate::file_store::FileStore;
use crate::platform::PlatformPaths;
use crate::probe::{Probe, Removal, Token, TokenLocation, TokenSource};
use crate::vault_store::{VaultBackend, VaultStore};

/// Identities and paths for both backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialConfig {
    pub service: String,
    pub account: String,
    pub token_path: PathBuf,
}

impl CredentialConfig {
    pub fn new(
        service: impl Into<String>,
        account: impl Into<String>,
        token_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
            token_path: token_path.into(),
        }
    }

    /// Default identities with the token file placed by the platform strategy.
    pub fn for_platform(paths: &dyn PlatformPaths) -> Result<Self> {
        let token_path = paths.token_path(APP_NAME).ok_or_else(|| {
            Error::Config(format!(
                "cannot determine the configuration directory ({} paths)",
                paths.name()
            ))
        })?;
        Ok(Self::new(VAULT_SERVICE, VAULT_ACCOUNT, token_path))
    }
}

/// A backend that could not be consulted during a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeError {
    pub location: TokenLocation,
    pub message: String,
}

/// Full result of a token read.
#[derive(Debug)]
pub struct Resolution {
    pub token: Option<Token>,
    pub location: TokenLocation,
    /// Backends that failed before the token was found (or before giving up).
    pub probe_errors: Vec<ProbeError>,
}

/// What `delete_token` did.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub removed_from: Vec<TokenLocation>,
    /// Backends that may still hold the token and need manual cleanup.
    pub warnings: Vec<String>,
}

impl DeleteReport {
    pub fn removed_anything(&self) -> bool {
        !self.removed_from.is_empty()
    }
}

/// What `set_token` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreReport {
    pub location: TokenLocation,
    /// Stale copies that could not be cleaned up.
    pub warnings: Vec<String>,
}

/// Orchestrates the keyring and file backends.
#[derive(Debug, Clone)]
pub struct CredentialManager {
    vault: VaultStore,
    file: FileStore,
}

impl CredentialManager {
    pub fn new(config: CredentialConfig, backend: Arc<dyn VaultBackend>) -> Self {
        Self {
            vault: VaultStore::new(backend, config.service, config.account),
            file: FileStore::new(config.token_path),
        }
    }

    pub fn vault(&self) -> &VaultStore {
        &self.vault
    }

    pub fn file(&self) -> &FileStore {
        &self.file
    }

    pub fn token_path(&self) -> &Path {
        self.file.path()
    }

    /// Read order: keyring, then file.
    fn sources(&self) -> [&dyn TokenSource; 2] {
        [&self.vault as &dyn TokenSource, &self.file]
    }

    /// Probe the backends in order and stop at the first token found.
    ///
    /// Backend failures never make the read fail; they are logged and
    /// returned in `probe_errors` so callers can explain an absent token.
    pub async fn resolve(&self) -> Resolution {
        let mut probe_errors = Vec::new();

        for source in self.sources() {
            let location = source.location();
            match source.probe().await {
                Probe::Found(token) => {
                    debug!(%location, "token resolved");
                    return Resolution {
                        token: Some(token),
                        location,
                        probe_errors,
                    };
                }
                Probe::NotFound => {
                    debug!(%location, "no token stored");
                }
                Probe::Error(message) => {
                    warn!(%location, error = %message, "could not read token, trying next backend");
                    probe_errors.push(ProbeError { location, message });
                }
            }
        }

        Resolution {
            token: None,
            location: TokenLocation::None,
            probe_errors,
        }
    }

    /// The stored token, or `None` when not logged in.
    pub async fn get_token(&self) -> Option<Token> {
        self.resolve().await.token
    }

    /// Store a token in exactly one backend.
    ///
    /// Cleanup failures on the other backend do not fail the call. They are
    /// returned in `StoreReport::warnings` for the caller to show.
    ///
    /// Vault mode never falls back to the file on failure: the caller gets
    /// `Error::VaultUnavailable` and must opt in to file storage explicitly.
    pub async fn set_token(&self, token: &str, use_file_mode: bool) -> Result<StoreReport> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Validation("token is empty".into()));
        }

        let mut warnings = Vec::new();

        if use_file_mode {
            if let Removal::Failed(reason) = self.vault.remove().await {
                let message = format!(
                    "could not remove the keyring entry ({reason}); it may still hold an old token"
                );
                debug!(service = %self.vault.service(), "{message}");
                warnings.push(message);
            }
            self.file.write(token).await?;
            info!(path = %self.file.path().display(), "stored token in file");
            return Ok(StoreReport {
                location: TokenLocation::File,
                warnings,
            });
        }

        self.vault.write(token).await?;
        info!(service = %self.vault.service(), "stored token in keyring");

        if let Err(e) = self.file.delete().await {
            let message = format!("could not remove the stale token file: {e}");
            debug!(path = %self.file.path().display(), "{message}");
            warnings.push(message);
        }

        Ok(StoreReport {
            location: TokenLocation::Vault,
            warnings,
        })
    }

    /// Remove the token from both backends. Never fails; anything left
    /// behind is described in `DeleteReport::warnings`.
    pub async fn delete_token(&self) -> DeleteReport {
        let mut report = DeleteReport::default();

        match self.vault.remove().await {
            Removal::Removed => report.removed_from.push(TokenLocation::Vault),
            Removal::Absent => {}
            Removal::Failed(reason) => {
                let message = format!(
                    "could not remove the keyring entry {}/{} ({reason}); remove it manually",
                    self.vault.service(),
                    self.vault.account()
                );
                debug!("{message}");
                report.warnings.push(message);
            }
        }

        match self.file.delete().await {
            Ok(Removal::Removed) => report.removed_from.push(TokenLocation::File),
            Ok(_) => {}
            Err(e) => {
                let message = format!(
                    "could not remove {}: {e}; delete it manually",
                    self.file.path().display()
                );
                debug!("{message}");
                report.warnings.push(message);
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault_store::MemoryVault;

    const SERVICE: &str = "ghctl-test";
    const ACCOUNT: &str = "github-token";

    struct Fixture {
        _dir: tempfile::TempDir,
        vault: Arc<MemoryVault>,
        manager: CredentialManager,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let vault = Arc::new(MemoryVault::new());
        let config = CredentialConfig::new(SERVICE, ACCOUNT, dir.path().join("ghctl").join("token"));
        let manager = CredentialManager::new(config, vault.clone());
        Fixture {
            _dir: dir,
            vault,
            manager,
        }
    }

    fn fine_grained() -> String {
        format!("github_pat_{}", "A".repeat(22))
    }

    fn classic() -> String {
        format!("ghp_{}", "a".repeat(36))
    }

    #[tokio::test]
    async fn vault_mode_write_is_readable_and_file_absent() {
        let f = fixture();
        let token = fine_grained();

        let report = f.manager.set_token(&token, false).await.unwrap();
        assert_eq!(report.location, TokenLocation::Vault);
        assert!(report.warnings.is_empty());

        assert_eq!(f.manager.get_token().await.unwrap().expose(), &token);
        assert_eq!(f.manager.vault().read().await.unwrap().expose(), &token);
        assert!(f.manager.file().read().await.is_none());
        assert!(!f.manager.token_path().exists());
    }

    #[tokio::test]
    async fn file_mode_after_vault_mode_leaves_only_file() {
        let f = fixture();
        let t1 = fine_grained();
        let t2 = format!("github_pat_{}", "B".repeat(30));

        f.manager.set_token(&t1, false).await.unwrap();
        let report = f.manager.set_token(&t2, true).await.unwrap();

        assert_eq!(report.location, TokenLocation::File);
        assert_eq!(f.manager.get_token().await.unwrap().expose(), &t2);
        assert!(f.manager.vault().read().await.is_none());
        assert!(!f.vault.contains(SERVICE, ACCOUNT));
    }

    #[tokio::test]
    async fn vault_mode_removes_stale_file() {
        let f = fixture();
        f.manager.set_token(&classic(), true).await.unwrap();
        assert!(f.manager.token_path().exists());

        f.manager.set_token(&fine_grained(), false).await.unwrap();

        assert!(!f.manager.token_path().exists());
        let resolution = f.manager.resolve().await;
        assert_eq!(resolution.location, TokenLocation::Vault);
    }

    #[tokio::test]
    async fn vault_wins_when_both_hold_tokens() {
        let f = fixture();
        f.manager.file().write("github_pat_from_file_xxxxxxxxxxxx").await.unwrap();
        f.vault.insert(SERVICE, ACCOUNT, "github_pat_from_vault_xxxxxxxxxxx");

        let resolution = f.manager.resolve().await;
        assert_eq!(resolution.location, TokenLocation::Vault);
        assert_eq!(
            resolution.token.unwrap().expose(),
            "github_pat_from_vault_xxxxxxxxxxx"
        );
    }

    #[tokio::test]
    async fn unreadable_vault_falls_through_to_file() {
        let f = fixture();
        f.manager.file().write("github_pat_from_file_xxxxxxxxxxxx").await.unwrap();
        f.vault.fail_get("secret service not running");

        let resolution = f.manager.resolve().await;
        assert_eq!(resolution.location, TokenLocation::File);
        assert_eq!(
            resolution.token.unwrap().expose(),
            "github_pat_from_file_xxxxxxxxxxxx"
        );
        assert_eq!(
            resolution.probe_errors,
            vec![ProbeError {
                location: TokenLocation::Vault,
                message: "secret service not running".into(),
            }]
        );
    }

    #[tokio::test]
    async fn nothing_stored_is_absent_not_error() {
        let f = fixture();
        let resolution = f.manager.resolve().await;
        assert!(resolution.token.is_none());
        assert_eq!(resolution.location, TokenLocation::None);
        assert!(resolution.probe_errors.is_empty());
    }

    #[tokio::test]
    async fn empty_token_is_rejected_before_any_backend() {
        let f = fixture();
        f.vault.fail_set("must not be called");

        let err = f.manager.set_token("  \n ", false).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = f.manager.set_token("", true).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!f.manager.token_path().exists());
    }

    #[tokio::test]
    async fn locked_vault_is_fatal_and_writes_nothing() {
        let f = fixture();
        f.vault.fail_set("keychain is locked");

        let err = f.manager.set_token(&fine_grained(), false).await.unwrap_err();
        assert!(matches!(err, Error::VaultUnavailable(ref reason) if reason == "keychain is locked"));

        assert!(f.manager.get_token().await.is_none());
        assert!(!f.manager.token_path().exists());
    }

    #[tokio::test]
    async fn locked_vault_does_not_touch_existing_file() {
        let f = fixture();
        f.manager.set_token(&fine_grained(), true).await.unwrap();
        f.vault.fail_set("keychain is locked");

        let result = f.manager.set_token(&format!("github_pat_{}", "C".repeat(22)), false).await;
        assert!(result.is_err());
        assert_eq!(f.manager.get_token().await.unwrap().expose(), &fine_grained());
    }

    #[tokio::test]
    async fn file_mode_with_existing_vault_entry() {
        let f = fixture();
        f.vault.insert(SERVICE, ACCOUNT, "github_pat_previous_xxxxxxxxxxxxx");
        let token = classic();

        let report = f.manager.set_token(&token, true).await.unwrap();

        assert_eq!(report.location, TokenLocation::File);
        assert!(report.warnings.is_empty());
        assert!(!f.vault.contains(SERVICE, ACCOUNT));
        let raw = tokio::fs::read_to_string(f.manager.token_path()).await.unwrap();
        assert_eq!(raw, format!("{token}\n"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(f.manager.token_path())
                .unwrap()
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[tokio::test]
    async fn file_mode_proceeds_when_vault_delete_fails() {
        let f = fixture();
        f.vault.insert(SERVICE, ACCOUNT, "github_pat_previous_xxxxxxxxxxxxx");
        f.vault.fail_delete("access denied");

        let report = f.manager.set_token(&fine_grained(), true).await.unwrap();

        assert_eq!(report.location, TokenLocation::File);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("access denied"));
        assert_eq!(f.manager.file().read().await.unwrap().expose(), &fine_grained());
    }

    #[tokio::test]
    async fn file_mode_write_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file in the way").unwrap();
        let config = CredentialConfig::new(SERVICE, ACCOUNT, blocker.join("token"));
        let manager = CredentialManager::new(config, Arc::new(MemoryVault::new()));

        let err = manager.set_token(&fine_grained(), true).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn delete_twice_never_fails() {
        let f = fixture();
        f.manager.set_token(&fine_grained(), false).await.unwrap();

        let first = f.manager.delete_token().await;
        assert_eq!(first.removed_from, vec![TokenLocation::Vault]);
        assert!(f.manager.get_token().await.is_none());

        let second = f.manager.delete_token().await;
        assert!(!second.removed_anything());
        assert!(second.warnings.is_empty());
        assert!(f.manager.get_token().await.is_none());
    }

    #[tokio::test]
    async fn delete_with_nothing_stored_has_no_warnings() {
        let f = fixture();
        let report = f.manager.delete_token().await;
        assert_eq!(report, DeleteReport::default());
    }

    #[tokio::test]
    async fn delete_removes_both_copies() {
        let f = fixture();
        f.manager.file().write("github_pat_from_file_xxxxxxxxxxxx").await.unwrap();
        f.vault.insert(SERVICE, ACCOUNT, "github_pat_from_vault_xxxxxxxxxxx");

        let report = f.manager.delete_token().await;

        assert_eq!(
            report.removed_from,
            vec![TokenLocation::Vault, TokenLocation::File]
        );
        assert!(f.manager.get_token().await.is_none());
    }

    #[tokio::test]
    async fn delete_continues_past_vault_failure() {
        let f = fixture();
        f.manager.set_token(&fine_grained(), true).await.unwrap();
        f.vault.fail_delete("keychain is locked");

        let report = f.manager.delete_token().await;

        assert_eq!(report.removed_from, vec![TokenLocation::File]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("keychain is locked"));
        assert!(!f.manager.token_path().exists());
    }

    /// Turns the token path into a non-empty directory so removing it fails.
    fn block_file_removal(manager: &CredentialManager) {
        let path = manager.token_path();
        std::fs::create_dir_all(path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();
    }

    #[tokio::test]
    async fn vault_mode_succeeds_when_stale_file_cleanup_fails() {
        let f = fixture();
        block_file_removal(&f.manager);

        let report = f.manager.set_token(&fine_grained(), false).await.unwrap();

        assert_eq!(report.location, TokenLocation::Vault);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("could not remove the stale token file"));
        assert_eq!(f.manager.get_token().await.unwrap().expose(), &fine_grained());
    }

    #[tokio::test]
    async fn delete_continues_past_file_failure() {
        let f = fixture();
        f.vault.insert(SERVICE, ACCOUNT, "github_pat_from_vault_xxxxxxxxxxx");
        block_file_removal(&f.manager);

        let report = f.manager.delete_token().await;

        assert_eq!(report.removed_from, vec![TokenLocation::Vault]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("delete it manually"));
        assert!(!f.vault.contains(SERVICE, ACCOUNT));
    }

    #[test]
    fn config_for_platform_uses_default_identities() {
        let paths = crate::platform::XdgPaths {
            xdg_config_home: Some(PathBuf::from("/xdg")),
            home: None,
        };
        let config = CredentialConfig::for_platform(&paths).unwrap();
        assert_eq!(config.service, VAULT_SERVICE);
        assert_eq!(config.account, VAULT_ACCOUNT);
        assert_eq!(config.token_path, PathBuf::from("/xdg/ghctl/token"));
    }

    #[test]
    fn config_for_platform_without_root_is_config_error() {
        let paths = crate::platform::XdgPaths::default();
        assert!(matches!(
            CredentialConfig::for_platform(&paths),
            Err(Error::Config(_))
        ));
    }
}
