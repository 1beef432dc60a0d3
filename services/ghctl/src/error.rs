//! User-facing CLI errors
//!
//! Every fatal error is printed as `error: <message>`; when a `CliError` is
//! in the chain its `hint()` is printed on the next line.

use github_api::ApiError;
use github_auth::FINE_GRAINED_TOKEN_URL;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Auth(#[from] github_auth::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] common::Error),

    #[error("no token supplied")]
    MissingToken,

    #[error("not logged in")]
    NotLoggedIn,

    #[error("token verification failed: {0}")]
    VerificationFailed(String),
}

pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    /// The next command or flag to try.
    pub fn hint(&self) -> Option<String> {
        match self {
            CliError::Auth(e) => auth_hint(e),
            CliError::Api(e) => api_hint(e),
            CliError::Config(_) => Some(
                "fix the config file or point --config / GHCTL_CONFIG at another one".into(),
            ),
            CliError::MissingToken => Some(
                "pipe a token into `ghctl login --with-token` or pass `--token`".into(),
            ),
            CliError::NotLoggedIn => Some("run `ghctl login`".into()),
            CliError::VerificationFailed(_) => {
                Some("run `ghctl login` with a new token, or `ghctl status --offline`".into())
            }
        }
    }
}

fn auth_hint(err: &github_auth::Error) -> Option<String> {
    match err {
        github_auth::Error::Validation(_) => Some(format!(
            "create a fine-grained token at {FINE_GRAINED_TOKEN_URL}"
        )),
        github_auth::Error::VaultUnavailable(_) => Some(
            "rerun with `ghctl login --use-file` to store the token in a plaintext file instead"
                .into(),
        ),
        github_auth::Error::Io(_) => {
            Some("check that the ghctl config directory is writable".into())
        }
        github_auth::Error::Config(_) => {
            Some("set XDG_CONFIG_HOME (or APPDATA on Windows) or credentials.token_file".into())
        }
    }
}

fn api_hint(err: &ApiError) -> Option<String> {
    match err {
        ApiError::NotAuthenticated => Some("run `ghctl login`".into()),
        ApiError::Unauthorized(_) => {
            Some("the stored token was rejected; run `ghctl login` with a new token".into())
        }
        ApiError::Forbidden(_) => {
            Some("check the token's repository access and permissions".into())
        }
        ApiError::RateLimited(_) => Some("wait for the rate limit to reset and retry".into()),
        ApiError::NotFound(_) => {
            Some("check the OWNER/REPO and number; private repositories need token access".into())
        }
        ApiError::Http(_) => Some("check network access or api.base_url".into()),
        ApiError::InvalidArgument(_) => Some("see `ghctl --help` for usage".into()),
        ApiError::Validation(_) | ApiError::Status { .. } | ApiError::Decode(_) => None,
    }
}

/// Hint for the first `CliError` in an error chain.
pub fn hint_for(err: &anyhow::Error) -> Option<String> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CliError>())
        .and_then(CliError::hint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn vault_failure_points_at_file_mode() {
        let err = CliError::from(github_auth::Error::VaultUnavailable("no dbus".into()));
        assert!(err.to_string().contains("no dbus"));
        assert!(err.hint().unwrap().contains("--use-file"));
    }

    #[test]
    fn rejected_token_type_links_to_fine_grained() {
        let err = CliError::from(github_auth::Error::Validation("classic tokens are not accepted".into()));
        assert!(err.hint().unwrap().contains(FINE_GRAINED_TOKEN_URL));
    }

    #[test]
    fn not_authenticated_suggests_login() {
        let err = CliError::from(ApiError::NotAuthenticated);
        assert_eq!(err.hint().as_deref(), Some("run `ghctl login`"));
    }

    #[test]
    fn hint_found_through_context() {
        let err: anyhow::Result<()> = Err(CliError::NotLoggedIn).context("checking status");
        let err = err.unwrap_err();
        assert_eq!(hint_for(&err).as_deref(), Some("run `ghctl login`"));
    }

    #[test]
    fn plain_errors_have_no_hint() {
        assert!(hint_for(&anyhow::anyhow!("boom")).is_none());
    }
}
