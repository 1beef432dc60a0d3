//! The authenticated user

use serde::Serialize;

use crate::client::{RequestOptions, RestClient};
use crate::error::Result;
use crate::models::User;

/// Header listing a classic token's OAuth scopes.
pub const SCOPES_HEADER: &str = "x-oauth-scopes";

/// Header carrying a token's expiry, when it has one.
pub const EXPIRATION_HEADER: &str = "github-authentication-token-expiration";

/// The token's owner plus what GitHub reported about the token itself.
#[derive(Debug, Clone, Serialize)]
pub struct Viewer {
    pub user: User,
    /// Present only for classic tokens; fine-grained tokens report none.
    pub scopes: Option<Vec<String>>,
    pub expires_at: Option<String>,
}

pub async fn authenticated(client: &RestClient) -> Result<Viewer> {
    let response = client
        .request(reqwest::Method::GET, "user", RequestOptions::new())
        .await?;
    let scopes = response.header(SCOPES_HEADER).map(parse_scopes);
    let expires_at = response.header(EXPIRATION_HEADER).map(str::to_string);
    let user: User = response.into_typed()?;
    Ok(Viewer {
        user,
        scopes,
        expires_at,
    })
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::test_support::{client, serve};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    #[test]
    fn scopes_split_and_trimmed() {
        assert_eq!(parse_scopes("repo, read:org ,"), vec!["repo", "read:org"]);
        assert!(parse_scopes("").is_empty());
    }

    #[tokio::test]
    async fn viewer_with_token_headers() {
        let app = Router::new().route(
            "/user",
            get(|| async {
                let mut headers = HeaderMap::new();
                headers.insert(SCOPES_HEADER, "repo, workflow".parse().unwrap());
                headers.insert(EXPIRATION_HEADER, "2027-01-01 00:00:00 UTC".parse().unwrap());
                (headers, Json(json!({"login": "octocat", "name": "Mona"})))
            }),
        );
        let url = serve(app).await;

        let viewer = authenticated(&client(&url)).await.unwrap();
        assert_eq!(viewer.user.login, "octocat");
        assert_eq!(viewer.scopes, Some(vec!["repo".to_string(), "workflow".to_string()]));
        assert_eq!(viewer.expires_at.as_deref(), Some("2027-01-01 00:00:00 UTC"));
    }

    #[tokio::test]
    async fn fine_grained_token_has_no_scopes() {
        let app = Router::new().route("/user", get(|| async { Json(json!({"login": "octocat"})) }));
        let url = serve(app).await;

        let viewer = authenticated(&client(&url)).await.unwrap();
        assert!(viewer.scopes.is_none());
        assert!(viewer.expires_at.is_none());
    }

    #[tokio::test]
    async fn revoked_token() {
        let app = Router::new().route(
            "/user",
            get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "Bad credentials"}))) }),
        );
        let url = serve(app).await;

        let err = authenticated(&client(&url)).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
