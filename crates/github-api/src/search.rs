//! Search endpoints
//!
//! A single page is fetched; GitHub orders search results by relevance and
//! the page size is capped at 100.

use serde::de::DeserializeOwned;

use crate::client::{MAX_PER_PAGE, RequestOptions, RestClient};
use crate::error::{ApiError, Result};
use crate::models::{CodeMatch, Issue, Repository, SearchResult};

async fn search<T: DeserializeOwned>(
    client: &RestClient,
    kind: &str,
    query: &str,
    limit: usize,
) -> Result<SearchResult<T>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ApiError::InvalidArgument("search query is empty".into()));
    }
    let per_page = limit.clamp(1, MAX_PER_PAGE as usize);
    let options = RequestOptions::new()
        .query("q", query)
        .query("per_page", per_page);
    let mut result: SearchResult<T> = client.get(&format!("search/{kind}"), options).await?;
    result.items.truncate(limit);
    Ok(result)
}

pub async fn repositories(client: &RestClient, query: &str, limit: usize) -> Result<SearchResult<Repository>> {
    search(client, "repositories", query, limit).await
}

/// Issues and pull requests; narrow with `is:pr` / `is:issue` in the query.
pub async fn issues(client: &RestClient, query: &str, limit: usize) -> Result<SearchResult<Issue>> {
    search(client, "issues", query, limit).await
}

pub async fn code(client: &RestClient, query: &str, limit: usize) -> Result<SearchResult<CodeMatch>> {
    search(client, "code", query, limit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client, serve};
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    #[tokio::test]
    async fn repositories_sends_query_and_caps_page() {
        let app = Router::new().route(
            "/search/repositories",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q["q"], "language:rust stars:>100");
                assert_eq!(q["per_page"], "100");
                Json(json!({
                    "total_count": 2,
                    "incomplete_results": false,
                    "items": [{"full_name": "a/one"}, {"full_name": "b/two"}]
                }))
            }),
        );
        let url = serve(app).await;

        let result = repositories(&client(&url), "  language:rust stars:>100 ", 500)
            .await
            .unwrap();
        assert_eq!(result.total_count, 2);
        assert_eq!(result.items[1].full_name, "b/two");
    }

    #[tokio::test]
    async fn items_truncated_to_limit() {
        let app = Router::new().route(
            "/search/issues",
            get(|| async {
                let items: Vec<_> = (1..=3)
                    .map(|n| json!({"number": n, "title": "t", "state": "open", "user": {"login": "u"}}))
                    .collect();
                Json(json!({"total_count": 40, "items": items}))
            }),
        );
        let url = serve(app).await;

        let result = issues(&client(&url), "is:issue crash", 2).await.unwrap();
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.total_count, 40);
    }

    #[tokio::test]
    async fn code_search_results() {
        let app = Router::new().route(
            "/search/code",
            get(|| async {
                Json(json!({
                    "total_count": 1,
                    "items": [{
                        "name": "main.rs",
                        "path": "src/main.rs",
                        "repository": {"full_name": "octo/hello"}
                    }]
                }))
            }),
        );
        let url = serve(app).await;

        let result = code(&client(&url), "fn main repo:octo/hello", 10).await.unwrap();
        assert_eq!(result.items[0].repository.full_name, "octo/hello");
    }

    #[tokio::test]
    async fn empty_query_rejected_locally() {
        let err = code(&client("http://127.0.0.1:1"), "   ", 10).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn secondary_rate_limit() {
        let app = Router::new().route(
            "/search/code",
            get(|| async {
                let mut headers = HeaderMap::new();
                headers.insert("x-ratelimit-remaining", "0".parse().unwrap());
                (
                    StatusCode::FORBIDDEN,
                    headers,
                    Json(json!({"message": "API rate limit exceeded for user"})),
                )
            }),
        );
        let url = serve(app).await;

        let err = code(&client(&url), "x", 1).await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited(_)));
    }
}
