//! Pull request operations

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::{RequestOptions, RestClient};
use crate::error::{ApiError, Result};
use crate::models::{MergeResult, PullRequest, RepoRef};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullState {
    #[default]
    Open,
    Closed,
    All,
}

impl PullState {
    pub fn as_str(self) -> &'static str {
        match self {
            PullState::Open => "open",
            PullState::Closed => "closed",
            PullState::All => "all",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListPulls {
    pub state: PullState,
    pub base: Option<String>,
    pub limit: usize,
}

impl Default for ListPulls {
    fn default() -> Self {
        Self {
            state: PullState::Open,
            base: None,
            limit: 30,
        }
    }
}

/// Fields for a new pull request.
#[derive(Debug, Clone, Serialize)]
pub struct NewPull {
    pub title: String,
    pub head: String,
    pub base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub draft: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    #[default]
    Merge,
    Squash,
    Rebase,
}

impl MergeMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            MergeMethod::Merge => "merge",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "rebase",
        }
    }
}

pub async fn list(client: &RestClient, repo: &RepoRef, params: &ListPulls) -> Result<Vec<PullRequest>> {
    let options = RequestOptions::new()
        .query("state", params.state.as_str())
        .query_opt("base", params.base.as_deref());
    client
        .paginate(&format!("{}/pulls", repo.path()), options, None, params.limit)
        .await
}

pub async fn get(client: &RestClient, repo: &RepoRef, number: u64) -> Result<PullRequest> {
    client
        .get(&format!("{}/pulls/{number}", repo.path()), RequestOptions::new())
        .await
}

pub async fn create(client: &RestClient, repo: &RepoRef, new: &NewPull) -> Result<PullRequest> {
    if new.title.trim().is_empty() {
        return Err(ApiError::InvalidArgument("pull request title is empty".into()));
    }
    let body = serde_json::to_value(new).map_err(|e| ApiError::Decode(e.to_string()))?;
    client
        .request(
            Method::POST,
            &format!("{}/pulls", repo.path()),
            RequestOptions::new().json(body),
        )
        .await?
        .into_typed()
}

pub async fn merge(
    client: &RestClient,
    repo: &RepoRef,
    number: u64,
    method: MergeMethod,
    commit_title: Option<&str>,
) -> Result<MergeResult> {
    let mut body = json!({ "merge_method": method.as_str() });
    if let Some(title) = commit_title {
        body["commit_title"] = json!(title);
    }
    client
        .request(
            Method::PUT,
            &format!("{}/pulls/{number}/merge", repo.path()),
            RequestOptions::new().json(body),
        )
        .await?
        .into_typed()
}
