//! GitHub Actions workflow runs

use reqwest::Method;

use crate::client::{RequestOptions, RestClient};
use crate::error::Result;
use crate::models::{RepoRef, WorkflowRun};

#[derive(Debug, Clone)]
pub struct ListRuns {
    pub branch: Option<String>,
    pub status: Option<String>,
    pub limit: usize,
}

impl Default for ListRuns {
    fn default() -> Self {
        Self {
            branch: None,
            status: None,
            limit: 20,
        }
    }
}

pub async fn list_runs(client: &RestClient, repo: &RepoRef, params: &ListRuns) -> Result<Vec<WorkflowRun>> {
    let options = RequestOptions::new()
        .query_opt("branch", params.branch.as_deref())
        .query_opt("status", params.status.as_deref());
    client
        .paginate(
            &format!("{}/actions/runs", repo.path()),
            options,
            Some("workflow_runs"),
            params.limit,
        )
        .await
}

pub async fn get_run(client: &RestClient, repo: &RepoRef, run_id: u64) -> Result<WorkflowRun> {
    client
        .get(&format!("{}/actions/runs/{run_id}", repo.path()), RequestOptions::new())
        .await
}

/// Re-run every job, or only the failed ones.
pub async fn rerun(client: &RestClient, repo: &RepoRef, run_id: u64, failed_only: bool) -> Result<()> {
    let action = if failed_only { "rerun-failed-jobs" } else { "rerun" };
    client
        .request(
            Method::POST,
            &format!("{}/actions/runs/{run_id}/{action}", repo.path()),
            RequestOptions::new(),
        )
        .await?
        .into_result()?;
    Ok(())
}
