//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigOverrides, LoggingOverrides};

#[derive(Debug, Parser)]
#[command(name = "autocut")]
#[command(
    about = "File a GitHub issue for an event, or update the one already tracking it",
    long_about = None
)]
#[command(version)]
pub struct Args {
    /// Issue title; also the key used to find an earlier report of the same event
    #[arg(long)]
    pub title: String,

    /// Event details, used as the issue body or appended as an update comment
    #[arg(long)]
    pub details: String,

    /// Repository owner (user or organization)
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name
    #[arg(long)]
    pub repo: Option<String>,

    /// Age separating recent from stale activity, e.g. "24h" or "1h30m"
    #[arg(long, visible_alias = "dur")]
    pub threshold: Option<String>,

    /// Extra labels for newly filed issues (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Project to place newly filed issues in (requires --column)
    #[arg(long)]
    pub project: Option<String>,

    /// Column of --project to place newly filed issues in
    #[arg(long)]
    pub column: Option<String>,

    /// Configuration file [default: .autocut/config.toml]
    #[arg(long, env = "AUTOCUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Per-request timeout for GitHub API calls, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Abandon the whole cut after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// The configuration values given on the command line, for the top
    /// configuration layer.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            threshold: self.threshold.clone(),
            labels: (!self.labels.is_empty()).then(|| self.labels.clone()),
            project: self.project.clone(),
            column: self.column.clone(),
            timeout_secs: self.timeout_secs,
            deadline_secs: self.deadline_secs,
            logging: LoggingOverrides {
                level: self.log_level.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["autocut", "--title", "Nightly failed", "--details", "exit 1"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn parses_a_full_invocation() {
        let args = parse(&[
            "--owner", "acme", "--repo", "widgets", "--dur", "24h", "--labels", "ci,nightly",
            "--project", "Triage", "--column", "Inbox", "--json",
        ])
        .unwrap();

        assert_eq!(args.title, "Nightly failed");
        assert_eq!(args.details, "exit 1");
        assert_eq!(args.owner.as_deref(), Some("acme"));
        assert_eq!(args.threshold.as_deref(), Some("24h"));
        assert_eq!(args.labels, vec!["ci", "nightly"]);
        assert_eq!(args.project.as_deref(), Some("Triage"));
        assert!(args.json);
    }

    #[test]
    fn threshold_long_name_is_accepted() {
        let args = parse(&["--threshold", "90m"]).unwrap();
        assert_eq!(args.threshold.as_deref(), Some("90m"));
    }

    #[test]
    fn title_and_details_are_required() {
        let err = Args::try_parse_from(["autocut", "--details", "x"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
        let err = Args::try_parse_from(["autocut", "--title", "x"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn only_given_flags_become_overrides() {
        let overrides = parse(&["--repo", "widgets", "--log-level", "debug"])
            .unwrap()
            .overrides();
        assert_eq!(overrides.repo.as_deref(), Some("widgets"));
        assert_eq!(overrides.owner, None);
        assert_eq!(overrides.labels, None);
        assert_eq!(overrides.logging.level.as_deref(), Some("debug"));
    }
}
