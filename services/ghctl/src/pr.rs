//! `ghctl pr ...`

use std::io::Write;

use clap::{Args, Subcommand, ValueEnum};
use github_api::pulls::{self, ListPulls, MergeMethod, NewPull, PullState};
use github_api::{PullRequest, RepoRef};

use crate::app::App;
use crate::error::CliError;
use crate::output::{OutputFormat, Table, truncate, write_json};

#[derive(Debug, Subcommand)]
pub enum PrCommand {
    /// List pull requests
    List(ListArgs),
    /// Show one pull request
    View(ViewArgs),
    /// Open a pull request
    Create(CreateArgs),
    /// Merge a pull request
    Merge(MergeArgs),
}

#[derive(Debug, Args)]
pub struct RepoArg {
    /// Repository as OWNER/REPO
    #[arg(short = 'R', long = "repo")]
    pub repo: String,
}

impl RepoArg {
    pub fn parse(&self) -> Result<RepoRef, CliError> {
        Ok(RepoRef::parse(&self.repo)?)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StateArg {
    Open,
    Closed,
    All,
}

impl From<StateArg> for PullState {
    fn from(s: StateArg) -> Self {
        match s {
            StateArg::Open => PullState::Open,
            StateArg::Closed => PullState::Closed,
            StateArg::All => PullState::All,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Merge,
    Squash,
    Rebase,
}

impl From<MethodArg> for MergeMethod {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::Merge => MergeMethod::Merge,
            MethodArg::Squash => MergeMethod::Squash,
            MethodArg::Rebase => MergeMethod::Rebase,
        }
    }
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub repo: RepoArg,
    #[arg(long, value_enum, default_value = "open")]
    pub state: StateArg,
    /// Only pull requests targeting this branch
    #[arg(long)]
    pub base: Option<String>,
    #[arg(short = 'L', long, default_value_t = 30)]
    pub limit: usize,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub repo: RepoArg,
    pub number: u64,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub repo: RepoArg,
    #[arg(short, long)]
    pub title: String,
    /// Branch containing the changes
    #[arg(short = 'H', long)]
    pub head: String,
    #[arg(short = 'B', long, default_value = "main")]
    pub base: String,
    #[arg(short, long)]
    pub body: Option<String>,
    #[arg(short, long)]
    pub draft: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    #[command(flatten)]
    pub repo: RepoArg,
    pub number: u64,
    #[arg(long, value_enum, default_value = "merge")]
    pub method: MethodArg,
    /// Commit title for the merge
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long)]
    pub json: bool,
}

pub async fn run(app: &App, cmd: &PrCommand, out: &mut dyn Write) -> anyhow::Result<()> {
    match cmd {
        PrCommand::List(args) => list(app, args, out).await,
        PrCommand::View(args) => view(app, args, out).await,
        PrCommand::Create(args) => create(app, args, out).await,
        PrCommand::Merge(args) => merge(app, args, out).await,
    }
}

async fn list(app: &App, args: &ListArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let repo = args.repo.parse()?;
    let client = app.client().await?;
    let params = ListPulls {
        state: args.state.into(),
        base: args.base.clone(),
        limit: args.limit,
    };
    let prs = pulls::list(&client, &repo, &params)
        .await
        .map_err(CliError::from)?;

    match app.format(args.json) {
        OutputFormat::Json => write_json(out, &prs)?,
        OutputFormat::Text if prs.is_empty() => writeln!(out, "No pull requests in {repo}")?,
        OutputFormat::Text => {
            let mut table = Table::new();
            for pr in &prs {
                table.row([
                    format!("#{}", pr.number),
                    truncate(&pr.title, 60),
                    pr.head.name.clone(),
                    state_label(pr).to_string(),
                ]);
            }
            table.write_to(out)?;
        }
    }
    Ok(())
}

async fn view(app: &App, args: &ViewArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let repo = args.repo.parse()?;
    let client = app.client().await?;
    let pr = pulls::get(&client, &repo, args.number)
        .await
        .map_err(CliError::from)?;

    match app.format(args.json) {
        OutputFormat::Json => write_json(out, &pr)?,
        OutputFormat::Text => render_pull(&pr, out)?,
    }
    Ok(())
}

async fn create(app: &App, args: &CreateArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let repo = args.repo.parse()?;
    let client = app.client().await?;
    let new = NewPull {
        title: args.title.clone(),
        head: args.head.clone(),
        base: args.base.clone(),
        body: args.body.clone(),
        draft: args.draft,
    };
    let pr = pulls::create(&client, &repo, &new)
        .await
        .map_err(CliError::from)?;

    match app.format(args.json) {
        OutputFormat::Json => write_json(out, &pr)?,
        OutputFormat::Text => writeln!(out, "Created #{} {}", pr.number, pr.html_url)?,
    }
    Ok(())
}

async fn merge(app: &App, args: &MergeArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let repo = args.repo.parse()?;
    let client = app.client().await?;
    let result = pulls::merge(
        &client,
        &repo,
        args.number,
        args.method.into(),
        args.subject.as_deref(),
    )
    .await
    .map_err(CliError::from)?;

    match app.format(args.json) {
        OutputFormat::Json => write_json(out, &result)?,
        OutputFormat::Text => {
            let sha = result.sha.as_deref().unwrap_or("-");
            writeln!(out, "Merged #{} in {repo} ({sha})", args.number)?;
        }
    }
    Ok(())
}

fn state_label(pr: &PullRequest) -> &str {
    if pr.merged == Some(true) {
        "merged"
    } else if pr.draft && pr.state == "open" {
        "draft"
    } else {
        &pr.state
    }
}

fn render_pull(pr: &PullRequest, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{} #{}", pr.title, pr.number)?;
    writeln!(
        out,
        "{} wants to merge {} into {} [{}]",
        pr.user.login,
        pr.head.name,
        pr.base.name,
        state_label(pr)
    )?;
    if let Some(body) = pr.body.as_deref().filter(|b| !b.trim().is_empty()) {
        writeln!(out)?;
        writeln!(out, "{}", body.trim_end())?;
    }
    writeln!(out)?;
    writeln!(out, "{}", pr.html_url)
}
