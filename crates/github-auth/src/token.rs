//! Token format classification and login policy
//!
//! Classification looks only at the textual shape of a token. The policy
//! gate is applied when a token is accepted at login, never on reads, so a
//! classic token stored before the policy existed keeps working.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::constants::FINE_GRAINED_TOKEN_URL;
use crate::error::{Error, Result};

static CLASSIC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ghp_[A-Za-z0-9]{36}$").unwrap());

static FINE_GRAINED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^github_pat_[A-Za-z0-9_]{22,}$").unwrap());

/// Kind of personal access token, derived from its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenType {
    /// `ghp_` tokens with broad, unscoped permissions
    Classic,
    /// `github_pat_` tokens scoped to specific repositories and permissions
    FineGrained,
    Unknown,
}

impl TokenType {
    pub fn label(self) -> &'static str {
        match self {
            TokenType::Classic => "classic",
            TokenType::FineGrained => "fine-grained",
            TokenType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of classifying a candidate token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub valid: bool,
    pub token_type: TokenType,
}

/// Classify a token by shape. Classic is checked before fine-grained.
pub fn classify(token: &str) -> Classification {
    if CLASSIC_PATTERN.is_match(token) {
        Classification {
            valid: true,
            token_type: TokenType::Classic,
        }
    } else if FINE_GRAINED_PATTERN.is_match(token) {
        Classification {
            valid: true,
            token_type: TokenType::FineGrained,
        }
    } else {
        Classification {
            valid: false,
            token_type: TokenType::Unknown,
        }
    }
}

/// Whether new logins may store a token of this type.
pub fn is_allowed(token_type: TokenType) -> bool {
    matches!(token_type, TokenType::FineGrained)
}

/// Validate a token supplied at login and return its type.
///
/// Surrounding whitespace is ignored (pasted tokens often carry a newline).
pub fn accept_for_login(raw: &str) -> Result<TokenType> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(Error::Validation("token is empty".into()));
    }

    let classification = classify(token);
    if !classification.valid {
        return Err(Error::Validation(
            "token does not look like a GitHub personal access token \
             (expected a github_pat_ fine-grained token)"
                .into(),
        ));
    }

    if !is_allowed(classification.token_type) {
        return Err(Error::Validation(format!(
            "{} tokens are not accepted; create a fine-grained token at {FINE_GRAINED_TOKEN_URL}",
            classification.token_type
        )));
    }

    Ok(classification.token_type)
}
