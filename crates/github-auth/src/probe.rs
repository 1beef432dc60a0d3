//! Backend probe results and token locations

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use common::Secret;
use serde::Serialize;

/// A stored GitHub token.
pub type Token = Secret<String>;

/// Where a token was found (or written).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenLocation {
    Vault,
    File,
    None,
}

impl fmt::Display for TokenLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenLocation::Vault => "system keyring",
            TokenLocation::File => "token file",
            TokenLocation::None => "nowhere",
        })
    }
}

/// Outcome of asking one backend for the token.
#[derive(Debug)]
pub enum Probe {
    Found(Token),
    NotFound,
    /// The backend could not be consulted. Carries a printable reason.
    Error(String),
}

impl Probe {
    pub fn into_token(self) -> Option<Token> {
        match self {
            Probe::Found(token) => Some(token),
            Probe::NotFound | Probe::Error(_) => None,
        }
    }
}

/// A backend the credential manager can read the token from.
///
/// Uses `Pin<Box<dyn Future>>` so the manager can hold an ordered list of
/// `&dyn TokenSource`.
pub trait TokenSource: Send + Sync {
    fn location(&self) -> TokenLocation;

    fn probe(&self) -> Pin<Box<dyn Future<Output = Probe> + Send + '_>>;
}

/// Outcome of removing the token from one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Absent,
    Failed(String),
}
