//! Tool catalogue and dispatch
//!
//! Every call builds its client through `App::client()`, so the token is
//! read from the credential backends at call time.

use github_api::actions::{self, ListRuns};
use github_api::pulls::{self, ListPulls, PullState};
use github_api::{ApiError, RepoRef, repos, search};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::protocol::{Tool, ToolResult};
use crate::app::App;
use crate::auth::status_report;
use crate::error::CliError;

const DEFAULT_LIMIT: usize = 30;

pub fn all_tools() -> Vec<Tool> {
    let repo = json!({"type": "string", "description": "Repository as OWNER/REPO"});
    let limit = json!({"type": "integer", "minimum": 1, "maximum": 100, "description": "Maximum results"});
    let query = json!({"type": "string", "description": "GitHub search syntax"});

    vec![
        Tool {
            name: "auth_status",
            description: "Report where the GitHub token is stored and whether GitHub accepts it",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "verify": {"type": "boolean", "description": "Check the token against GitHub (default true)"}
                }
            }),
        },
        Tool {
            name: "list_pull_requests",
            description: "List pull requests in a repository",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "repo": repo,
                    "state": {"type": "string", "enum": ["open", "closed", "all"]},
                    "base": {"type": "string", "description": "Target branch"},
                    "limit": limit
                },
                "required": ["repo"]
            }),
        },
        Tool {
            name: "get_pull_request",
            description: "Get one pull request by number",
            input_schema: json!({
                "type": "object",
                "properties": {"repo": repo, "number": {"type": "integer", "minimum": 1}},
                "required": ["repo", "number"]
            }),
        },
        Tool {
            name: "get_repository",
            description: "Get repository details",
            input_schema: json!({
                "type": "object",
                "properties": {"repo": repo},
                "required": ["repo"]
            }),
        },
        Tool {
            name: "list_workflow_runs",
            description: "List recent GitHub Actions workflow runs",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "repo": repo,
                    "branch": {"type": "string"},
                    "status": {"type": "string"},
                    "limit": limit
                },
                "required": ["repo"]
            }),
        },
        Tool {
            name: "search_repositories",
            description: "Search GitHub repositories",
            input_schema: json!({
                "type": "object",
                "properties": {"query": query, "limit": limit},
                "required": ["query"]
            }),
        },
        Tool {
            name: "search_issues",
            description: "Search issues and pull requests",
            input_schema: json!({
                "type": "object",
                "properties": {"query": query, "limit": limit},
                "required": ["query"]
            }),
        },
    ]
}

pub fn is_known(name: &str) -> bool {
    all_tools().iter().any(|t| t.name == name)
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    #[serde(default = "default_true")]
    verify: bool,
}

#[derive(Debug, Deserialize)]
struct RepoParams {
    repo: String,
}

#[derive(Debug, Deserialize)]
struct ListPullsParams {
    repo: String,
    #[serde(default)]
    state: PullState,
    base: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct PullParams {
    repo: String,
    number: u64,
}

#[derive(Debug, Deserialize)]
struct ListRunsParams {
    repo: String,
    branch: Option<String>,
    status: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    limit: Option<usize>,
}

fn default_true() -> bool {
    true
}

/// Run a tool. Failures come back as `isError` results.
pub async fn call_tool(app: &App, name: &str, arguments: Map<String, Value>) -> ToolResult {
    debug!(tool = name, "calling tool");
    match dispatch(app, name, Value::Object(arguments)).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => ToolResult::success(text),
            Err(e) => ToolResult::error(format!("failed to encode result: {e}")),
        },
        Err(ToolFailure::Arguments(message)) => {
            ToolResult::error(format!("invalid arguments for {name}: {message}"))
        }
        Err(ToolFailure::Command(err)) => {
            let mut text = format!("error: {err}");
            if let Some(hint) = err.hint() {
                text.push_str(&format!("\nhint: {hint}"));
            }
            ToolResult::error(text)
        }
    }
}

enum ToolFailure {
    Arguments(String),
    Command(CliError),
}

impl From<CliError> for ToolFailure {
    fn from(err: CliError) -> Self {
        ToolFailure::Command(err)
    }
}

impl From<ApiError> for ToolFailure {
    fn from(err: ApiError) -> Self {
        ToolFailure::Command(err.into())
    }
}

fn params<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolFailure> {
    serde_json::from_value(arguments).map_err(|e| ToolFailure::Arguments(e.to_string()))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, ToolFailure> {
    serde_json::to_value(value).map_err(|e| ToolFailure::Arguments(e.to_string()))
}

fn limit(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, 100)
}

async fn dispatch(app: &App, name: &str, arguments: Value) -> Result<Value, ToolFailure> {
    match name {
        "auth_status" => {
            let p: StatusParams = params(arguments)?;
            encode(&status_report(app, p.verify).await)
        }
        "list_pull_requests" => {
            let p: ListPullsParams = params(arguments)?;
            let repo = RepoRef::parse(&p.repo)?;
            let client = app.client().await?;
            let list = ListPulls {
                state: p.state,
                base: p.base,
                limit: limit(p.limit),
            };
            encode(&pulls::list(&client, &repo, &list).await?)
        }
        "get_pull_request" => {
            let p: PullParams = params(arguments)?;
            let repo = RepoRef::parse(&p.repo)?;
            let client = app.client().await?;
            encode(&pulls::get(&client, &repo, p.number).await?)
        }
        "get_repository" => {
            let p: RepoParams = params(arguments)?;
            let repo = RepoRef::parse(&p.repo)?;
            let client = app.client().await?;
            encode(&repos::get(&client, &repo).await?)
        }
        "list_workflow_runs" => {
            let p: ListRunsParams = params(arguments)?;
            let repo = RepoRef::parse(&p.repo)?;
            let client = app.client().await?;
            let list = ListRuns {
                branch: p.branch,
                status: p.status,
                limit: limit(p.limit),
            };
            encode(&actions::list_runs(&client, &repo, &list).await?)
        }
        "search_repositories" => {
            let p: SearchParams = params(arguments)?;
            let client = app.client().await?;
            encode(&search::repositories(&client, &p.query, limit(p.limit)).await?)
        }
        "search_issues" => {
            let p: SearchParams = params(arguments)?;
            let client = app.client().await?;
            encode(&search::issues(&client, &p.query, limit(p.limit)).await?)
        }
        other => Err(ToolFailure::Arguments(format!("unknown tool {other}"))),
    }
}
