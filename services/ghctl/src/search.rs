//! `ghctl search ...`

use std::io::Write;

use clap::{Args, Subcommand};
use github_api::search;

use crate::app::App;
use crate::error::CliError;
use crate::output::{OutputFormat, Table, truncate, write_json};

#[derive(Debug, Subcommand)]
pub enum SearchCommand {
    /// Search repositories
    Repos(SearchArgs),
    /// Search issues and pull requests
    Issues(SearchArgs),
    /// Search code
    Code(SearchArgs),
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// GitHub search syntax, e.g. `language:rust stars:>100`
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,
    #[arg(short = 'L', long, default_value_t = 30)]
    pub limit: usize,
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    fn query(&self) -> String {
        self.query.join(" ")
    }
}

pub async fn run(app: &App, cmd: &SearchCommand, out: &mut dyn Write) -> anyhow::Result<()> {
    let client = app.client().await?;
    let mut table = Table::new();

    let (args, total) = match cmd {
        SearchCommand::Repos(args) => {
            let result = search::repositories(&client, &args.query(), args.limit)
                .await
                .map_err(CliError::from)?;
            if app.format(args.json) == OutputFormat::Json {
                return write_json(out, &result);
            }
            for repo in &result.items {
                table.row([
                    repo.full_name.clone(),
                    truncate(repo.description.as_deref().unwrap_or(""), 50),
                    format!("{} stars", repo.stargazers_count),
                ]);
            }
            (args, result.total_count)
        }
        SearchCommand::Issues(args) => {
            let result = search::issues(&client, &args.query(), args.limit)
                .await
                .map_err(CliError::from)?;
            if app.format(args.json) == OutputFormat::Json {
                return write_json(out, &result);
            }
            for issue in &result.items {
                let kind = if issue.is_pull_request() { "pr" } else { "issue" };
                table.row([
                    format!("{}#{}", issue.repository(), issue.number),
                    kind.to_string(),
                    truncate(&issue.title, 60),
                    issue.state.clone(),
                ]);
            }
            (args, result.total_count)
        }
        SearchCommand::Code(args) => {
            let result = search::code(&client, &args.query(), args.limit)
                .await
                .map_err(CliError::from)?;
            if app.format(args.json) == OutputFormat::Json {
                return write_json(out, &result);
            }
            for hit in &result.items {
                table.row([hit.repository.full_name.clone(), hit.path.clone()]);
            }
            (args, result.total_count)
        }
    };

    if table.is_empty() {
        writeln!(out, "No results for {:?}", args.query())?;
        return Ok(());
    }
    table.write_to(out)?;
    writeln!(out, "\nShowing {} of {total} results", table_len(args.limit, total))?;
    Ok(())
}

fn table_len(limit: usize, total: u64) -> u64 {
    total.min(limit as u64)
}
