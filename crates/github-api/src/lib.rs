//! GitHub REST client
//!
//! `RestClient` implements the request contract; the operation modules
//! (`pulls`, `repos`, `actions`, `search`, `users`) are thin typed wrappers
//! over it. `factory::authenticated_client()` is the only way ghctl obtains
//! a client, so every call reads the token through the credential manager.

pub mod actions;
pub mod classify;
pub mod client;
pub mod error;
pub mod factory;
pub mod models;
pub mod pulls;
pub mod repos;
pub mod search;
pub mod users;

pub use client::{ApiResponse, ClientConfig, DEFAULT_API_URL, RequestOptions, RestClient};
pub use error::{ApiError, Result};
pub use factory::authenticated_client;
pub use models::{
    BranchRef, CodeMatch, Issue, MergeResult, PullRequest, RepoRef, Repository, SearchResult,
    User, WorkflowRun,
};

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;
    use common::Secret;

    use crate::client::{ClientConfig, RestClient};

    /// Serve `app` on an ephemeral port and return its base URL.
    pub async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    pub fn client(base_url: &str) -> RestClient {
        let config = ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        };
        RestClient::new(Secret::new("github_pat_test".to_string()), &config).unwrap()
    }
}
