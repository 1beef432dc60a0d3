//! `login`, `logout` and `status`

use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use clap::Args;
use common::Secret;
use github_api::{RestClient, users};
use github_auth::{ProbeError, TokenLocation, TokenType, accept_for_login, classify, is_allowed};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::app::App;
use crate::error::{CliError, Result};
use crate::output::{OutputFormat, write_json};

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Read the token from standard input
    #[arg(long, conflicts_with = "token")]
    pub with_token: bool,

    /// Token value (visible in shell history; prefer --with-token)
    #[arg(long)]
    pub token: Option<String>,

    /// Store the token in a plaintext file instead of the system keyring
    #[arg(long)]
    pub use_file: bool,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[arg(long)]
    pub json: bool,

    /// Skip the GET /user check
    #[arg(long)]
    pub offline: bool,
}

pub async fn login(
    app: &App,
    args: &LoginArgs,
    out: &mut dyn Write,
    diag: &mut dyn Write,
) -> anyhow::Result<()> {
    let token = read_token(args).await?;
    store_token(app, token.expose(), args.use_file, out, diag).await
}

async fn read_token(args: &LoginArgs) -> Result<Secret<String>> {
    if let Some(token) = &args.token {
        return Ok(Secret::trimmed(token.clone()));
    }

    if args.with_token {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .map_err(|e| github_auth::Error::Io(format!("reading token from stdin: {e}")))?;
        return Ok(Secret::trimmed(buf));
    }

    if !std::io::stdin().is_terminal() {
        return Err(CliError::MissingToken);
    }
    let prompted = tokio::task::spawn_blocking(|| rpassword::prompt_password("Paste your GitHub token: "))
        .await
        .map_err(|e| github_auth::Error::Io(format!("token prompt failed: {e}")))?
        .map_err(|e| github_auth::Error::Io(format!("token prompt failed: {e}")))?;
    Ok(Secret::trimmed(prompted))
}

/// Validate and store a token, reporting where it went.
///
/// Cleanup problems with the other backend go to `diag`.
pub async fn store_token(
    app: &App,
    raw: &str,
    use_file: bool,
    out: &mut dyn Write,
    diag: &mut dyn Write,
) -> anyhow::Result<()> {
    let token_type = accept_for_login(raw).map_err(CliError::from)?;
    let report = app
        .credentials
        .set_token(raw, use_file)
        .await
        .map_err(CliError::from)?;

    writeln!(
        out,
        "Logged in with a {token_type} token, stored in the {}.",
        report.location
    )?;
    if report.location == TokenLocation::File {
        writeln!(
            out,
            "Token file: {} (readable only by you)",
            app.credentials.token_path().display()
        )?;
    }
    write_warnings(diag, &report.warnings)?;
    Ok(())
}

pub async fn logout(app: &App, out: &mut dyn Write, diag: &mut dyn Write) -> anyhow::Result<()> {
    let report = app.credentials.delete_token().await;
    if report.removed_anything() {
        let places: Vec<String> = report.removed_from.iter().map(ToString::to_string).collect();
        writeln!(out, "Logged out; removed the token from the {}.", places.join(" and "))?;
    } else if report.warnings.is_empty() {
        writeln!(out, "Not logged in; nothing to remove.")?;
    } else {
        writeln!(out, "Logout incomplete; a stored token could not be removed.")?;
    }
    write_warnings(diag, &report.warnings)?;
    Ok(())
}

fn write_warnings(diag: &mut dyn Write, warnings: &[String]) -> std::io::Result<()> {
    for warning in warnings {
        writeln!(diag, "warning: {warning}")?;
    }
    Ok(())
}

/// Outcome of checking the token against `GET /user`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    Verified {
        login: String,
        scopes: Option<Vec<String>>,
        expires_at: Option<String>,
    },
    Failed {
        error: String,
    },
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub logged_in: bool,
    pub location: TokenLocation,
    pub token_type: Option<TokenType>,
    /// Whether `login` would accept this token today
    pub login_allowed: Option<bool>,
    pub keyring_entry: String,
    pub token_file: PathBuf,
    pub probe_errors: Vec<ProbeError>,
    pub verification: Verification,
}

pub async fn status_report(app: &App, verify: bool) -> StatusReport {
    let resolution = app.credentials.resolve().await;
    let vault = app.credentials.vault();

    let mut report = StatusReport {
        logged_in: resolution.token.is_some(),
        location: resolution.location,
        token_type: None,
        login_allowed: None,
        keyring_entry: format!("{}/{}", vault.service(), vault.account()),
        token_file: app.credentials.token_path().to_path_buf(),
        probe_errors: resolution.probe_errors,
        verification: Verification::Skipped,
    };

    let Some(token) = resolution.token else {
        return report;
    };

    let classification = classify(token.expose());
    report.token_type = Some(classification.token_type);
    report.login_allowed = Some(classification.valid && is_allowed(classification.token_type));

    if verify {
        report.verification = verify_token(app, token).await;
    }
    report
}

async fn verify_token(app: &App, token: Secret<String>) -> Verification {
    let result = match RestClient::new(token, &app.config.client_config()) {
        Ok(client) => users::authenticated(&client).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(viewer) => Verification::Verified {
            login: viewer.user.login,
            scopes: viewer.scopes,
            expires_at: viewer.expires_at,
        },
        Err(e) => {
            debug!(error = %e, "token verification failed");
            Verification::Failed {
                error: e.to_string(),
            }
        }
    }
}

pub fn render_status(report: &StatusReport, out: &mut dyn Write) -> std::io::Result<()> {
    if report.logged_in {
        let kind = report.token_type.map(TokenType::label).unwrap_or("unknown");
        writeln!(out, "Logged in with a {kind} token stored in the {}.", report.location)?;
        if report.login_allowed == Some(false) {
            writeln!(
                out,
                "  note: this token type would not be accepted by `ghctl login` today"
            )?;
        }
    } else {
        writeln!(out, "Not logged in.")?;
        writeln!(out, "  keyring entry: {}", report.keyring_entry)?;
        writeln!(out, "  token file:    {}", report.token_file.display())?;
    }

    for err in &report.probe_errors {
        writeln!(out, "  could not read the {}: {}", err.location, err.message)?;
    }

    match &report.verification {
        Verification::Verified {
            login,
            scopes,
            expires_at,
        } => {
            writeln!(out, "  account: {login}")?;
            if let Some(scopes) = scopes {
                let shown = if scopes.is_empty() { "(none)".to_string() } else { scopes.join(", ") };
                writeln!(out, "  scopes:  {shown}")?;
            }
            if let Some(expires) = expires_at {
                writeln!(out, "  expires: {expires}")?;
            }
        }
        Verification::Failed { error } => writeln!(out, "  verification failed: {error}")?,
        Verification::Skipped => {}
    }
    Ok(())
}

pub async fn status(app: &App, args: &StatusArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let report = status_report(app, !args.offline).await;

    match app.format(args.json) {
        OutputFormat::Json => write_json(out, &report)?,
        OutputFormat::Text => render_status(&report, out)?,
    }

    if !report.logged_in {
        return Err(CliError::NotLoggedIn.into());
    }
    if let Verification::Failed { error } = report.verification {
        return Err(CliError::VerificationFailed(error).into());
    }
    Ok(())
}
