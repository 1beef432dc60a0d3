//! GitHub token storage and validation
//!
//! Keeps a single GitHub token in either the OS keyring or a plaintext
//! fallback file, never both. The credential manager is the only place that
//! decides which backend is authoritative; the two stores know nothing about
//! each other.
//!
//! Token flow:
//! 1. `login` checks the candidate with `token::accept_for_login()`
//! 2. `CredentialManager::set_token()` writes one backend and clears the other
//! 3. Every authenticated command calls `CredentialManager::get_token()`
//!    (keyring first, then file)
//! 4. `logout` calls `CredentialManager::delete_token()`, which attempts both

pub mod constants;
pub mod credentials;
pub mod error;
pub mod file_store;
pub mod platform;
pub mod probe;
pub mod token;
pub mod vault_store;

pub use constants::*;
pub use credentials::{
    CredentialConfig, CredentialManager, DeleteReport, ProbeError, Resolution, StoreReport,
};
pub use error::{Error, Result};
pub use file_store::FileStore;
pub use platform::{PlatformPaths, WindowsPaths, XdgPaths};
pub use probe::{Probe, Removal, Token, TokenLocation, TokenSource};
pub use token::{Classification, TokenType, accept_for_login, classify, is_allowed};
pub use vault_store::{KeyringBackend, MemoryVault, VaultBackend, VaultError, VaultStore};
