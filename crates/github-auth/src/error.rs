//! Error types for credential operations
//!
//! Backend-specific failures (keyring errors, `std::io::Error`) are
//! reclassified into these variants before they leave the crate.

/// Errors from credential storage and token acceptance.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid token: {0}")]
    Validation(String),

    #[error("system keyring unavailable: {0}")]
    VaultUnavailable(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for credential operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_unavailable_keeps_backend_reason() {
        let err = Error::VaultUnavailable("keychain is locked".into());
        assert_eq!(
            err.to_string(),
            "system keyring unavailable: keychain is locked"
        );
    }

    #[test]
    fn debug_includes_variant_name() {
        let err = Error::Validation("token is empty".into());
        assert!(format!("{err:?}").contains("Validation"));
    }
}
