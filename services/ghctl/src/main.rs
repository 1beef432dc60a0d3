//! ghctl
//!
//! GitHub from the terminal and from MCP clients. The token lives in the
//! OS keyring, or in a private plaintext file when `login --use-file` asks
//! for it; every command reads it through the credential manager.

mod app;
mod auth;
mod config;
mod error;
mod mcp;
mod output;
mod pr;
mod repo;
mod run;
mod search;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use github_auth::{KeyringBackend, platform};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "ghctl", version, about = "Work with GitHub from the command line")]
struct Cli {
    /// Config file (default: <config dir>/ghctl/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store a GitHub token
    Login(auth::LoginArgs),
    /// Remove the stored token from every location
    Logout,
    /// Show where the token is stored and whether it works
    Status(auth::StatusArgs),
    /// Pull requests
    #[command(subcommand)]
    Pr(pr::PrCommand),
    /// Repositories
    #[command(subcommand)]
    Repo(repo::RepoCommand),
    /// GitHub Actions workflow runs
    #[command(subcommand)]
    Run(run::RunCommand),
    /// Search repositories, issues and code
    #[command(subcommand)]
    Search(search::SearchCommand),
    /// Serve MCP tools over stdio
    Mcp,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .without_time()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = platform::detect();
    let location = Config::resolve_path(cli.config.as_deref(), paths.as_ref());
    let config = Config::load_or_default(location.as_ref())
        .map_err(error::CliError::from)
        .context("loading configuration")?;
    debug!(platform = paths.name(), config = ?location, "configuration loaded");

    let app = App::new(config, paths.as_ref(), Arc::new(KeyringBackend))?;
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let out: &mut dyn Write = &mut stdout;

    match &cli.command {
        Command::Login(args) => auth::login(&app, args, out, &mut stderr).await,
        Command::Logout => auth::logout(&app, out, &mut stderr).await,
        Command::Status(args) => auth::status(&app, args, out).await,
        Command::Pr(cmd) => pr::run(&app, cmd, out).await,
        Command::Repo(cmd) => repo::run(&app, cmd, out).await,
        Command::Run(cmd) => run::run(&app, cmd, out).await,
        Command::Search(cmd) => search::run(&app, cmd, out).await,
        Command::Mcp => mcp::McpServer::new(&app).run_stdio().await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json || common::env::flag("GHCTL_LOG_JSON"));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            if let Some(hint) = error::hint_for(&err) {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_login_flags() {
        let cli = Cli::parse_from(["ghctl", "login", "--with-token", "--use-file"]);
        match cli.command {
            Command::Login(args) => {
                assert!(args.with_token);
                assert!(args.use_file);
                assert!(args.token.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn token_and_with_token_conflict() {
        assert!(Cli::try_parse_from(["ghctl", "login", "--with-token", "--token", "x"]).is_err());
    }

    #[test]
    fn parses_pr_list_with_global_config() {
        let cli = Cli::parse_from(["ghctl", "pr", "list", "-R", "octo/hello", "--state", "all", "--config", "/tmp/c.toml"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/c.toml"));
        assert!(matches!(cli.command, Command::Pr(pr::PrCommand::List(ref a)) if a.repo.repo == "octo/hello"));
    }

    #[test]
    fn search_requires_query() {
        assert!(Cli::try_parse_from(["ghctl", "search", "repos"]).is_err());
        let cli = Cli::parse_from(["ghctl", "search", "code", "fn", "main", "-L", "5"]);
        match cli.command {
            Command::Search(search::SearchCommand::Code(args)) => {
                assert_eq!(args.query, vec!["fn", "main"]);
                assert_eq!(args.limit, 5);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
