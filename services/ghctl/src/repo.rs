//! `ghctl repo ...`

use std::io::Write;

use clap::{Args, Subcommand};
use github_api::{RepoRef, Repository, repos};

use crate::app::App;
use crate::error::CliError;
use crate::output::{OutputFormat, Table, truncate, write_json};

#[derive(Debug, Subcommand)]
pub enum RepoCommand {
    /// Show repository details
    View {
        /// OWNER/REPO
        repo: String,
        #[arg(long)]
        json: bool,
    },
    /// List repositories of a user, or your own
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Owner login; defaults to the authenticated user
    pub owner: Option<String>,
    #[arg(short = 'L', long, default_value_t = 30)]
    pub limit: usize,
    #[arg(long)]
    pub json: bool,
}

pub async fn run(app: &App, cmd: &RepoCommand, out: &mut dyn Write) -> anyhow::Result<()> {
    match cmd {
        RepoCommand::View { repo, json } => view(app, repo, *json, out).await,
        RepoCommand::List(args) => list(app, args, out).await,
    }
}

async fn view(app: &App, repo: &str, json: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    let repo = RepoRef::parse(repo).map_err(CliError::from)?;
    let client = app.client().await?;
    let details = repos::get(&client, &repo).await.map_err(CliError::from)?;

    match app.format(json) {
        OutputFormat::Json => write_json(out, &details)?,
        OutputFormat::Text => render_repository(&details, out)?,
    }
    Ok(())
}

async fn list(app: &App, args: &ListArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let client = app.client().await?;
    let repos = repos::list_for_user(&client, args.owner.as_deref(), args.limit)
        .await
        .map_err(CliError::from)?;

    match app.format(args.json) {
        OutputFormat::Json => write_json(out, &repos)?,
        OutputFormat::Text => {
            let mut table = Table::new();
            for repo in &repos {
                table.row([
                    repo.full_name.clone(),
                    truncate(repo.description.as_deref().unwrap_or(""), 50),
                    visibility(repo).to_string(),
                ]);
            }
            table.write_to(out)?;
        }
    }
    Ok(())
}

fn visibility(repo: &Repository) -> &'static str {
    match (repo.private, repo.archived, repo.fork) {
        (_, true, _) => "archived",
        (true, _, _) => "private",
        (false, _, true) => "fork",
        _ => "public",
    }
}

fn render_repository(repo: &Repository, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{} ({})", repo.full_name, visibility(repo))?;
    if let Some(description) = &repo.description {
        writeln!(out, "{description}")?;
    }
    writeln!(out)?;
    let mut table = Table::new();
    table.row(["default branch:", repo.default_branch.as_str()]);
    if let Some(language) = &repo.language {
        table.row(["language:", language.as_str()]);
    }
    table.row(["stars:".to_string(), repo.stargazers_count.to_string()]);
    table.row(["forks:".to_string(), repo.forks_count.to_string()]);
    table.row(["open issues:".to_string(), repo.open_issues_count.to_string()]);
    table.write_to(out)?;
    writeln!(out)?;
    writeln!(out, "{}", repo.html_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FINE_TOKEN, TestApp, serve};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    #[tokio::test]
    async fn view_text() {
        let url = serve(Router::new().route(
            "/repos/{owner}/{repo}",
            get(|| async {
                Json(json!({
                    "full_name": "octo/hello",
                    "description": "Hello world",
                    "private": true,
                    "html_url": "https://github.com/octo/hello",
                    "default_branch": "main",
                    "language": "Rust",
                    "stargazers_count": 5
                }))
            }),
        ))
        .await;
        let t = TestApp::new(&url);
        t.vault.insert("ghctl-test", "github-token", FINE_TOKEN);
        let mut out = Vec::new();

        view(&t.app, "octo/hello", false, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("octo/hello (private)\nHello world\n"));
        assert!(text.contains("language:        Rust"));
        assert!(text.contains("stars:           5"));
    }

    #[tokio::test]
    async fn list_own_repositories() {
        let url = serve(Router::new().route(
            "/user/repos",
            get(|| async {
                Json(json!([
                    {"full_name": "me/tool", "description": "CLI", "fork": true},
                    {"full_name": "me/old", "archived": true}
                ]))
            }),
        ))
        .await;
        let t = TestApp::new(&url);
        t.app.credentials.set_token(FINE_TOKEN, true).await.unwrap();
        let args = ListArgs {
            owner: None,
            limit: 10,
            json: false,
        };
        let mut out = Vec::new();

        list(&t.app, &args, &mut out).await.unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "me/tool  CLI  fork\nme/old        archived\n"
        );
    }
}
