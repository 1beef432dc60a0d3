//! Error types for GitHub API operations

/// Errors from GitHub REST calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not logged in: no GitHub token is stored")]
    NotAuthenticated,

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("GitHub rejected the token: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("GitHub returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
