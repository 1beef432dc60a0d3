//! Repository lookups

use crate::client::{RequestOptions, RestClient};
use crate::error::Result;
use crate::models::{RepoRef, Repository};

pub async fn get(client: &RestClient, repo: &RepoRef) -> Result<Repository> {
    client.get(&repo.path(), RequestOptions::new()).await
}

/// Repositories owned by `owner`, or by the authenticated user when `None`.
pub async fn list_for_user(
    client: &RestClient,
    owner: Option<&str>,
    limit: usize,
) -> Result<Vec<Repository>> {
    let options = RequestOptions::new().query("sort", "updated");
    let path = match owner {
        Some(owner) => format!("users/{owner}/repos"),
        None => "user/repos".to_string(),
    };
    client.paginate(&path, options, None, limit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::test_support::{client, serve};
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::get as get_route;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    fn repo_json(full_name: &str) -> Value {
        json!({
            "full_name": full_name,
            "description": "Demo",
            "private": false,
            "html_url": format!("https://github.com/{full_name}"),
            "default_branch": "main",
            "language": "Rust",
            "stargazers_count": 12,
            "forks_count": 3,
            "open_issues_count": 1
        })
    }

    #[tokio::test]
    async fn get_repository() {
        let app = Router::new().route(
            "/repos/{owner}/{repo}",
            get_route(|Path((owner, name)): Path<(String, String)>| async move {
                Json(repo_json(&format!("{owner}/{name}")))
            }),
        );
        let url = serve(app).await;

        let repo = get(&client(&url), &RepoRef::parse("octo/hello").unwrap())
            .await
            .unwrap();
        assert_eq!(repo.full_name, "octo/hello");
        assert_eq!(repo.stargazers_count, 12);
        assert_eq!(repo.language.as_deref(), Some("Rust"));
    }

    #[tokio::test]
    async fn list_for_named_owner_and_viewer() {
        let app = Router::new()
            .route(
                "/users/{owner}/repos",
                get_route(|Path(owner): Path<String>| async move {
                    Json(json!([repo_json(&format!("{owner}/a")), repo_json(&format!("{owner}/b"))]))
                }),
            )
            .route(
                "/user/repos",
                get_route(|| async { Json(json!([repo_json("me/private")])) }),
            );
        let url = serve(app).await;
        let c = client(&url);

        let theirs = list_for_user(&c, Some("octo"), 10).await.unwrap();
        assert_eq!(theirs.len(), 2);
        assert_eq!(theirs[0].full_name, "octo/a");

        let mine = list_for_user(&c, None, 10).await.unwrap();
        assert_eq!(mine[0].full_name, "me/private");
    }

    #[tokio::test]
    async fn unauthorized_is_classified() {
        let app = Router::new().route(
            "/repos/{owner}/{repo}",
            get_route(|| async {
                (StatusCode::UNAUTHORIZED, Json(json!({"message": "Bad credentials"})))
            }),
        );
        let url = serve(app).await;

        let err = get(&client(&url), &RepoRef::parse("octo/hello").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(m) if m.contains("Bad credentials")));
    }
}
