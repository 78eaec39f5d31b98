//! autocut CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: merge defaults, `.autocut/config.toml`,
//!    `AUTOCUT_*` variables and flags, then validate.
//! 2. **Wire observability**: install a `tracing-subscriber` stderr layer and,
//!    when configured, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: build a `GithubClient` from the settings
//!    and `GITHUB_TOKEN`, and inject it into a `Cutter`.
//! 4. **Cut**: run one cut, abandoning it on Ctrl-C or when the deadline
//!    passes, and print the result.
//!
//! Exit codes: `0` on success, `2` for invalid input or configuration, `1` for
//! every other failure.

mod args;
mod config;
mod observability;
mod output;

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use autocut::{CutError, CutRequest, CutResult, CutRunId, Cutter, ProjectBoard};
use clap::Parser;
use github::{GithubClient, GithubConfig};

use crate::args::Args;
use crate::config::{ConfigError, ConfigLoader, Settings};

const TOKEN_VAR: &str = "GITHUB_TOKEN";

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("autocut: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = ConfigLoader::load(args.config.as_deref(), &args.overrides())?;
    let request = CutRequest::new(&args.title, &args.details, settings.labels.clone())?;
    let token = github_token()?;

    let telemetry = observability::init(&settings.logging)?;
    let outcome = cut(&settings, token, &request).await;
    telemetry.shutdown();

    let result = outcome?;
    println!("{}", output::render(&result, args.json)?);
    Ok(())
}

async fn cut(settings: &Settings, token: String, request: &CutRequest) -> Result<CutResult> {
    let mut github = GithubConfig::new(settings.owner.clone(), settings.repo.clone(), token);
    github.api_base = settings.api_base.clone();
    github.timeout = settings.timeout;
    let client = Arc::new(GithubClient::new(github).context("failed to build GitHub client")?);
    let board: Arc<dyn ProjectBoard> = client.clone();
    let cutter = Cutter::new(client, Some(board), settings.cutter.clone());

    let run_id = CutRunId::new_random();
    tracing::info!(%run_id, owner = %settings.owner, repo = %settings.repo, "starting cut");

    let cut = with_deadline(cutter.cut_with_run_id(request, run_id), settings.deadline);
    let outcome = tokio::select! {
        result = cut => result,
        reason = interrupted(tokio::signal::ctrl_c()) => Err(CutError::Cancelled { reason }),
    };

    match outcome {
        Ok(result) => {
            tracing::info!(
                %run_id,
                disposition = ?result.disposition,
                url = %result.issue_url,
                "cut finished"
            );
            Ok(result)
        }
        Err(err) => {
            tracing::error!(%run_id, error = %err, retry = ?err.retry_policy(), "cut failed");
            Err(err.into())
        }
    }
}

async fn with_deadline<F>(cut: F, deadline: Option<Duration>) -> Result<CutResult, CutError>
where
    F: Future<Output = Result<CutResult, CutError>>,
{
    let Some(limit) = deadline else {
        return cut.await;
    };
    tokio::time::timeout(limit, cut).await.unwrap_or_else(|_| {
        Err(CutError::Cancelled {
            reason: format!("deadline of {}s exceeded", limit.as_secs()),
        })
    })
}

/// Resolves once `signal` fires. If the handler cannot be installed, never
/// resolves, leaving the cut to finish on its own.
async fn interrupted<S>(signal: S) -> String
where
    S: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => "interrupted".to_string(),
        Err(err) => {
            tracing::warn!(error = %err, "could not listen for Ctrl-C; continuing without it");
            std::future::pending().await
        }
    }
}

fn github_token() -> Result<String, ConfigError> {
    std::env::var(TOKEN_VAR)
        .ok()
        .filter(|token| !token.trim().is_empty())
        .ok_or(ConfigError::MissingToken)
}

fn exit_status(err: &anyhow::Error) -> u8 {
    let invalid_input = err.downcast_ref::<ConfigError>().is_some()
        || matches!(
            err.downcast_ref::<CutError>(),
            Some(CutError::InvalidInput { .. })
        );
    if invalid_input {
        2
    } else {
        1
    }
}
