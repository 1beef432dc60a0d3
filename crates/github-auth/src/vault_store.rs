//! OS keyring entry
//!
//! The native binding sits behind `VaultBackend` so the credential manager
//! can be exercised against `MemoryVault` without touching the real
//! keychain, credential manager or secret service. Backends normalize
//! "no such entry" to `Ok(None)` / `Ok(false)`; every other failure comes
//! back as a `VaultError`.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use common::Secret;
use tracing::debug;

use crate::error::{Error, Result};
use crate::probe::{Probe, Removal, Token, TokenLocation, TokenSource};

/// A failure that is not "entry not found" (locked store, no service, denied).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct VaultError(pub String);

/// Blocking access to a native secret store.
pub trait VaultBackend: Send + Sync + fmt::Debug {
    fn get(&self, service: &str, account: &str) -> std::result::Result<Option<String>, VaultError>;

    fn set(&self, service: &str, account: &str, secret: &str) -> std::result::Result<(), VaultError>;

    /// `Ok(true)` if an entry was removed, `Ok(false)` if there was none.
    fn delete(&self, service: &str, account: &str) -> std::result::Result<bool, VaultError>;
}

/// "Not found" phrasings reported through platform failures, per backend.
///
/// `keyring::Error::NoEntry` is the primary signal. These are only consulted
/// when a platform layer reports a missing item as a generic failure.
const NOT_FOUND_SIGNATURES: &[(&str, &str)] = &[
    ("macos-keychain", "could not be found"),
    ("macos-keychain", "not found in keychain"),
    ("macos-keychain", "no password"),
    ("windows-credential-manager", "element not found"),
    ("secret-service", "no matching item"),
    ("secret-service", "no such secret"),
    ("linux-keyutils", "required key not available"),
    ("generic", "no matching entry"),
    ("generic", "no entry"),
];

/// Whether a backend error message means "nothing stored".
pub fn is_not_found_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    NOT_FOUND_SIGNATURES
        .iter()
        .any(|(_, pattern)| lower.contains(pattern))
}

/// Classify a keyring error as "not found" (structured first, message second).
pub fn is_not_found(err: &keyring::Error) -> bool {
    match err {
        keyring::Error::NoEntry => true,
        keyring::Error::PlatformFailure(inner) | keyring::Error::NoStorageAccess(inner) => {
            is_not_found_message(&inner.to_string())
        }
        _ => false,
    }
}

/// The platform keyring via the `keyring` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyringBackend;

impl KeyringBackend {
    fn entry(service: &str, account: &str) -> std::result::Result<keyring::Entry, VaultError> {
        keyring::Entry::new(service, account).map_err(|e| VaultError(e.to_string()))
    }
}

impl VaultBackend for KeyringBackend {
    fn get(&self, service: &str, account: &str) -> std::result::Result<Option<String>, VaultError> {
        match Self::entry(service, account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(VaultError(e.to_string())),
        }
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> std::result::Result<(), VaultError> {
        Self::entry(service, account)?
            .set_password(secret)
            .map_err(|e| VaultError(e.to_string()))
    }

    fn delete(&self, service: &str, account: &str) -> std::result::Result<bool, VaultError> {
        match Self::entry(service, account)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(VaultError(e.to_string())),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct InjectedFailures {
    get: Option<String>,
    set: Option<String>,
    delete: Option<String>,
}

/// In-process secret store with injectable failures.
#[derive(Debug, Default)]
pub struct MemoryVault {
    entries: Mutex<HashMap<(String, String), String>>,
    failures: Mutex<InjectedFailures>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, service: &str, account: &str, secret: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((service.to_owned(), account.to_owned()), secret.to_owned());
    }

    pub fn contains(&self, service: &str, account: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(service.to_owned(), account.to_owned()))
    }

    /// Make every subsequent `get` fail with `reason`.
    pub fn fail_get(&self, reason: &str) {
        self.failures_mut(|f| f.get = Some(reason.to_owned()));
    }

    /// Make every subsequent `set` fail with `reason`.
    pub fn fail_set(&self, reason: &str) {
        self.failures_mut(|f| f.set = Some(reason.to_owned()));
    }

    /// Make every subsequent `delete` fail with `reason`.
    pub fn fail_delete(&self, reason: &str) {
        self.failures_mut(|f| f.delete = Some(reason.to_owned()));
    }

    fn failures_mut(&self, apply: impl FnOnce(&mut InjectedFailures)) {
        apply(&mut self.failures.lock().unwrap_or_else(PoisonError::into_inner));
    }

    fn failures(&self) -> InjectedFailures {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl VaultBackend for MemoryVault {
    fn get(&self, service: &str, account: &str) -> std::result::Result<Option<String>, VaultError> {
        if let Some(reason) = self.failures().get {
            return Err(VaultError(reason));
        }
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(service.to_owned(), account.to_owned()))
            .cloned())
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> std::result::Result<(), VaultError> {
        if let Some(reason) = self.failures().set {
            return Err(VaultError(reason));
        }
        self.insert(service, account, secret);
        Ok(())
    }

    fn delete(&self, service: &str, account: &str) -> std::result::Result<bool, VaultError> {
        if let Some(reason) = self.failures().delete {
            return Err(VaultError(reason));
        }
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(service.to_owned(), account.to_owned()))
            .is_some())
    }
}

/// The single keyring entry holding the token.
#[derive(Debug, Clone)]
pub struct VaultStore {
    backend: Arc<dyn VaultBackend>,
    service: String,
    account: String,
}

impl VaultStore {
    pub fn new(
        backend: Arc<dyn VaultBackend>,
        service: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            service: service.into(),
            account: account.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub async fn probe(&self) -> Probe {
        let result = self
            .blocking(|backend, service, account| backend.get(service, account))
            .await;
        match result {
            Ok(Some(secret)) => {
                let secret = Secret::new(secret);
                if secret.is_blank() {
                    Probe::NotFound
                } else {
                    Probe::Found(secret)
                }
            }
            Ok(None) => Probe::NotFound,
            Err(e) => Probe::Error(e.0),
        }
    }

    /// The stored token, or `None` if absent or unreadable.
    pub async fn read(&self) -> Option<Token> {
        self.probe().await.into_token()
    }

    /// Store or overwrite the entry. Fails with `Error::VaultUnavailable`.
    pub async fn write(&self, token: &str) -> Result<()> {
        let token = Secret::new(token.to_owned());
        self.blocking(move |backend, service, account| {
            backend.set(service, account, token.expose())
        })
        .await
        .map_err(|e| Error::VaultUnavailable(e.0))?;
        debug!(service = %self.service, "stored token in keyring");
        Ok(())
    }

    /// Remove the entry, reporting whether anything was there.
    pub async fn remove(&self) -> Removal {
        match self
            .blocking(|backend, service, account| backend.delete(service, account))
            .await
        {
            Ok(true) => Removal::Removed,
            Ok(false) => Removal::Absent,
            Err(e) => {
                debug!(service = %self.service, error = %e, "keyring delete failed");
                Removal::Failed(e.0)
            }
        }
    }

    /// `true` when the entry is gone (deleted or never there).
    pub async fn delete(&self) -> bool {
        !matches!(self.remove().await, Removal::Failed(_))
    }

    /// Run a backend call on the blocking pool; keyring calls may hit D-Bus or IPC.
    async fn blocking<T, F>(&self, call: F) -> std::result::Result<T, VaultError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn VaultBackend, &str, &str) -> std::result::Result<T, VaultError>
            + Send
            + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let service = self.service.clone();
        let account = self.account.clone();
        tokio::task::spawn_blocking(move || call(backend.as_ref(), &service, &account))
            .await
            .map_err(|e| VaultError(format!("keyring task failed: {e}")))?
    }
}

impl TokenSource for VaultStore {
    fn location(&self) -> TokenLocation {
        TokenLocation::Vault
    }

    fn probe(&self) -> Pin<Box<dyn Future<Output = Probe> + Send + '_>> {
        Box::pin(VaultStore::probe(self))
    }
}
