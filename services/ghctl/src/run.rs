//! `ghctl run ...`

use std::io::Write;

use clap::{Args, Subcommand};
use github_api::WorkflowRun;
use github_api::actions::{self, ListRuns};

use crate::app::App;
use crate::error::CliError;
use crate::output::{OutputFormat, Table, truncate, write_json};
use crate::pr::RepoArg;

#[derive(Debug, Subcommand)]
pub enum RunCommand {
    /// List recent workflow runs
    List(ListArgs),
    /// Show one workflow run
    View(RunArgs),
    /// Re-run a workflow run
    Rerun {
        #[command(flatten)]
        run: RunArgs,
        /// Only re-run failed jobs
        #[arg(long)]
        failed: bool,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub repo: RepoArg,
    #[arg(short, long)]
    pub branch: Option<String>,
    /// queued, in_progress, completed, success, failure, ...
    #[arg(short, long)]
    pub status: Option<String>,
    #[arg(short = 'L', long, default_value_t = 20)]
    pub limit: usize,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub repo: RepoArg,
    pub id: u64,
    #[arg(long)]
    pub json: bool,
}

pub async fn run(app: &App, cmd: &RunCommand, out: &mut dyn Write) -> anyhow::Result<()> {
    match cmd {
        RunCommand::List(args) => list(app, args, out).await,
        RunCommand::View(args) => view(app, args, out).await,
        RunCommand::Rerun { run, failed } => rerun(app, run, *failed, out).await,
    }
}

async fn list(app: &App, args: &ListArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let repo = args.repo.parse()?;
    let client = app.client().await?;
    let params = ListRuns {
        branch: args.branch.clone(),
        status: args.status.clone(),
        limit: args.limit,
    };
    let runs = actions::list_runs(&client, &repo, &params)
        .await
        .map_err(CliError::from)?;

    match app.format(args.json) {
        OutputFormat::Json => write_json(out, &runs)?,
        OutputFormat::Text if runs.is_empty() => writeln!(out, "No workflow runs in {repo}")?,
        OutputFormat::Text => {
            let mut table = Table::new();
            for run in &runs {
                table.row([
                    run.outcome().to_string(),
                    truncate(run.name.as_deref().unwrap_or("-"), 30),
                    run.head_branch.clone().unwrap_or_default(),
                    run.event.clone(),
                    run.id.to_string(),
                ]);
            }
            table.write_to(out)?;
        }
    }
    Ok(())
}

async fn view(app: &App, args: &RunArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let repo = args.repo.parse()?;
    let client = app.client().await?;
    let run = actions::get_run(&client, &repo, args.id)
        .await
        .map_err(CliError::from)?;

    match app.format(args.json) {
        OutputFormat::Json => write_json(out, &run)?,
        OutputFormat::Text => render_run(&run, out)?,
    }
    Ok(())
}

async fn rerun(app: &App, args: &RunArgs, failed: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    let repo = args.repo.parse()?;
    let client = app.client().await?;
    actions::rerun(&client, &repo, args.id, failed)
        .await
        .map_err(CliError::from)?;

    let scope = if failed { "failed jobs of run" } else { "run" };
    writeln!(out, "Requested a re-run of {scope} {} in {repo}", args.id)?;
    Ok(())
}

fn render_run(run: &WorkflowRun, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        out,
        "{} #{} ({})",
        run.name.as_deref().unwrap_or("workflow run"),
        run.run_number,
        run.outcome()
    )?;
    let mut table = Table::new();
    table.row(["id:", run.id.to_string().as_str()]);
    table.row(["event:", run.event.as_str()]);
    table.row(["branch:", run.head_branch.as_deref().unwrap_or("-")]);
    table.row(["commit:", run.head_sha.as_str()]);
    table.row(["started:", run.created_at.as_str()]);
    table.write_to(out)?;
    writeln!(out)?;
    writeln!(out, "{}", run.html_url)
}
