//! Fixed identities for the credential backends
//!
//! These are the defaults. The credential manager takes them as
//! configuration so that tests and alternate installs can override them.

/// Application directory name under the platform config root
pub const APP_NAME: &str = "ghctl";

/// Service name of the OS keyring entry
pub const VAULT_SERVICE: &str = "ghctl";

/// Account name of the OS keyring entry
pub const VAULT_ACCOUNT: &str = "github-token";

/// File name of the plaintext fallback inside the app directory
pub const TOKEN_FILE_NAME: &str = "token";

/// Where new fine-grained tokens are created
pub const FINE_GRAINED_TOKEN_URL: &str = "https://github.com/settings/personal-access-tokens/new";
