//! Layered configuration.
//!
//! Precedence (lowest to highest):
//! 1. Programmatic defaults
//! 2. `.autocut/config.toml`, or the file given with `--config`
//! 3. Environment variables (`AUTOCUT_*`, `__` separates nested keys)
//! 4. Command-line flags
//!
//! `labels` accepts either a list or a comma-separated string, so
//! `AUTOCUT_LABELS=ci,nightly` and `AUTOCUT_LABELS=[ci,nightly]` are equivalent.
//!
//! The GitHub token is not part of this structure; the binary reads it from
//! `GITHUB_TOKEN`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use autocut::{
    AgeThreshold, CutterConfig, Label, ParseDurationError, ProjectPlacement, RepositoryName,
    RepositoryOwner,
};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

pub const DEFAULT_CONFIG_PATH: &str = ".autocut/config.toml";
pub const ENV_PREFIX: &str = "AUTOCUT_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[source] Box<figment::Error>),

    #[error("configuration file {0} does not exist")]
    MissingFile(PathBuf),

    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid `{key}`: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid `threshold`: {0}")]
    InvalidThreshold(#[from] ParseDurationError),

    #[error("invalid `{key}`: {value}. Must be at least 1")]
    InvalidSeconds { key: &'static str, value: u64 },

    #[error("`project` and `column` must be set together")]
    IncompletePlacement,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("GITHUB_TOKEN is not set")]
    MissingToken,
}

/// Raw configuration as merged from all layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocutConfig {
    pub owner: Option<String>,
    pub repo: Option<String>,
    /// Sentinel label marking managed issues.
    pub label: String,
    pub threshold: Option<String>,
    /// Extra labels for newly filed issues.
    #[serde(deserialize_with = "list_or_comma_separated")]
    pub labels: Vec<String>,
    pub project: Option<String>,
    pub column: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
    pub deadline_secs: Option<u64>,
    pub logging: LoggingConfig,
}

impl Default for AutocutConfig {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            label: Label::sentinel().to_string(),
            threshold: None,
            labels: Vec::new(),
            project: None,
            column: None,
            api_base: github::DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
            deadline_secs: None,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
    /// OTLP gRPC collector endpoint; span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            otlp_endpoint: None,
        }
    }
}

/// Values given on the command line. Unset fields are not serialized, so they
/// leave lower layers untouched.
#[derive(Debug, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
    pub logging: LoggingOverrides,
}

#[derive(Debug, Default, Serialize)]
pub struct LoggingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

/// Validated configuration, ready to wire up.
#[derive(Debug, Clone)]
pub struct Settings {
    pub owner: RepositoryOwner,
    pub repo: RepositoryName,
    pub cutter: CutterConfig,
    pub labels: Vec<Label>,
    pub api_base: String,
    pub timeout: Duration,
    pub deadline: Option<Duration>,
    pub logging: LogSettings,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Merges every layer and validates the result.
    pub fn load(
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Settings, ConfigError> {
        let config = Self::figment(config_path, ENV_PREFIX, overrides)?
            .extract::<AutocutConfig>()
            .map_err(|e| ConfigError::Load(Box::new(e)))?;
        Self::validate(&config)
    }

    /// Builds the provider stack without extracting it.
    pub fn figment(
        config_path: Option<&Path>,
        env_prefix: &str,
        overrides: &ConfigOverrides,
    ) -> Result<Figment, ConfigError> {
        let file = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_PATH),
        };

        Ok(Figment::new()
            .merge(Serialized::defaults(AutocutConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(env_prefix).split("__"))
            .merge(Serialized::defaults(overrides)))
    }

    /// Checks required settings and converts raw values into typed ones.
    pub fn validate(config: &AutocutConfig) -> Result<Settings, ConfigError> {
        let owner = required(&config.owner, "owner")?;
        let owner = RepositoryOwner::new(owner).ok_or_else(|| ConfigError::InvalidValue {
            key: "owner",
            value: owner.to_string(),
        })?;
        let repo = required(&config.repo, "repo")?;
        let repo = RepositoryName::new(repo).ok_or_else(|| ConfigError::InvalidValue {
            key: "repo",
            value: repo.to_string(),
        })?;
        let threshold: AgeThreshold = required(&config.threshold, "threshold")?.parse()?;

        let label = parse_label(&config.label, "label")?;
        let labels = config
            .labels
            .iter()
            .map(|value| parse_label(value, "labels"))
            .collect::<Result<Vec<_>, _>>()?;

        let placement = match (non_blank(&config.project), non_blank(&config.column)) {
            (Some(project), Some(column)) => Some(ProjectPlacement {
                project: project.to_string(),
                column: column.to_string(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompletePlacement),
        };

        if config.timeout_secs == 0 {
            return Err(ConfigError::InvalidSeconds {
                key: "timeout_secs",
                value: 0,
            });
        }
        if config.deadline_secs == Some(0) {
            return Err(ConfigError::InvalidSeconds {
                key: "deadline_secs",
                value: 0,
            });
        }
        if config.api_base.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "api_base",
                value: config.api_base.clone(),
            });
        }

        Ok(Settings {
            owner,
            repo,
            cutter: CutterConfig {
                label,
                threshold,
                placement,
            },
            labels,
            api_base: config.api_base.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            deadline: config.deadline_secs.map(Duration::from_secs),
            logging: Self::validate_logging(&config.logging)?,
        })
    }

    pub fn validate_logging(logging: &LoggingConfig) -> Result<LogSettings, ConfigError> {
        let level = logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(logging.level.clone()));
        }
        let level = level
            .parse::<LevelFilter>()
            .map_err(|_| ConfigError::InvalidLogLevel(logging.level.clone()))?;

        let format = match logging.format.as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        };

        Ok(LogSettings {
            level,
            format,
            otlp_endpoint: non_blank(&logging.otlp_endpoint).map(str::to_string),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn required<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, ConfigError> {
    non_blank(value).ok_or(ConfigError::Missing(key))
}

fn list_or_comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Labels {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Labels::deserialize(deserializer)? {
        Labels::List(labels) => labels,
        Labels::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn parse_label(value: &str, key: &'static str) -> Result<Label, ConfigError> {
    Label::new(value.trim()).ok_or_else(|| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn complete() -> AutocutConfig {
        AutocutConfig {
            owner: Some("acme".to_string()),
            repo: Some("widgets".to_string()),
            threshold: Some("24h".to_string()),
            ..AutocutConfig::default()
        }
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_sensible() {
        let config = AutocutConfig::default();
        assert_eq!(config.label, "autocut");
        assert_eq!(config.api_base, "https://api.github.com");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn complete_config_validates() {
        let settings = ConfigLoader::validate(&complete()).unwrap();
        assert_eq!(settings.owner.as_str(), "acme");
        assert_eq!(settings.repo.as_str(), "widgets");
        assert_eq!(settings.cutter.label, Label::sentinel());
        assert_eq!(settings.cutter.threshold.as_std(), Duration::from_secs(86_400));
        assert_eq!(settings.cutter.placement, None);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn required_settings_are_reported_by_name() {
        for (key, config) in [
            ("owner", AutocutConfig { owner: None, ..complete() }),
            ("repo", AutocutConfig { repo: Some("  ".to_string()), ..complete() }),
            ("threshold", AutocutConfig { threshold: None, ..complete() }),
        ] {
            match ConfigLoader::validate(&config) {
                Err(ConfigError::Missing(missing)) => assert_eq!(missing, key),
                other => panic!("expected missing {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn bad_threshold_is_rejected() {
        let config = AutocutConfig {
            threshold: Some("-5m".to_string()),
            ..complete()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn placement_needs_both_project_and_column() {
        let config = AutocutConfig {
            project: Some("Triage".to_string()),
            ..complete()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::IncompletePlacement)
        ));

        let config = AutocutConfig {
            project: Some("Triage".to_string()),
            column: Some("Inbox".to_string()),
            ..complete()
        };
        let placement = ConfigLoader::validate(&config).unwrap().cutter.placement;
        assert_eq!(
            placement,
            Some(ProjectPlacement {
                project: "Triage".to_string(),
                column: "Inbox".to_string(),
            })
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = AutocutConfig {
            timeout_secs: 0,
            ..complete()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSeconds { key: "timeout_secs", .. })
        ));
    }

    #[test]
    fn logging_is_validated() {
        let mut config = complete();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));

        let mut config = complete();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));

        let mut config = complete();
        config.logging.level = "DEBUG".to_string();
        config.logging.format = "json".to_string();
        let logging = ConfigLoader::validate(&config).unwrap().logging;
        assert_eq!(logging.level, LevelFilter::DEBUG);
        assert_eq!(logging.format, LogFormat::Json);
    }

    #[test]
    fn file_values_are_overridden_by_flags() {
        let file = write_config(
            r#"
            owner = "acme"
            repo = "widgets"
            threshold = "1h"
            labels = ["ci"]

            [logging]
            level = "warn"
            "#,
        );
        let overrides = ConfigOverrides {
            threshold: Some("2h".to_string()),
            ..ConfigOverrides::default()
        };

        let config: AutocutConfig =
            ConfigLoader::figment(Some(file.path()), "AUTOCUT_FILE_TEST_", &overrides)
                .unwrap()
                .extract()
                .unwrap();

        assert_eq!(config.owner.as_deref(), Some("acme"));
        assert_eq!(config.threshold.as_deref(), Some("2h"));
        assert_eq!(config.labels, vec!["ci"]);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn environment_sits_between_file_and_flags() {
        let file = write_config("owner = \"from-file\"\nrepo = \"from-file\"\n");
        std::env::set_var("AUTOCUT_ENV_TEST_OWNER", "from-env");
        std::env::set_var("AUTOCUT_ENV_TEST_REPO", "from-env");
        std::env::set_var("AUTOCUT_ENV_TEST_LOGGING__FORMAT", "json");
        let overrides = ConfigOverrides {
            repo: Some("from-flag".to_string()),
            ..ConfigOverrides::default()
        };

        let config: AutocutConfig =
            ConfigLoader::figment(Some(file.path()), "AUTOCUT_ENV_TEST_", &overrides)
                .unwrap()
                .extract()
                .unwrap();

        assert_eq!(config.owner.as_deref(), Some("from-env"));
        assert_eq!(config.repo.as_deref(), Some("from-flag"));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn environment_labels_may_be_comma_separated() {
        std::env::set_var("AUTOCUT_LABELS_TEST_LABELS", "ci, nightly,");
        let config: AutocutConfig =
            ConfigLoader::figment(None, "AUTOCUT_LABELS_TEST_", &ConfigOverrides::default())
                .unwrap()
                .extract()
                .unwrap();
        assert_eq!(config.labels, vec!["ci", "nightly"]);

        std::env::set_var("AUTOCUT_LIST_LABELS_TEST_LABELS", "[ci,nightly]");
        let config: AutocutConfig =
            ConfigLoader::figment(None, "AUTOCUT_LIST_LABELS_TEST_", &ConfigOverrides::default())
                .unwrap()
                .extract()
                .unwrap();
        assert_eq!(config.labels, vec!["ci", "nightly"]);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(
            ConfigLoader::figment(Some(&path), ENV_PREFIX, &ConfigOverrides::default()),
            Err(ConfigError::MissingFile(_))
        ));
    }
}
