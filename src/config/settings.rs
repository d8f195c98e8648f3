use super::ConfigError;
use crate::canvas::LockOptions;
use crate::channels::slack::DEFAULT_SLACK_API_BASE;
use crate::github::DEFAULT_GITHUB_API_BASE;
use crate::shared::logging::{EventLog, LogLevel};
use crate::store::datastore::DEFAULT_DATASTORE_API_BASE;
use crate::store::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_STORAGE_PATH: &str = "/tmp/action_context";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    File,
    Datastore,
    Memory,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Datastore => "datastore",
            Self::Memory => "memory",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "datastore" => Ok(Self::Datastore),
            "memory" => Ok(Self::Memory),
            _ => Err("store backend must be one of: file, datastore, memory".to_string()),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub slack: SlackSettings,
    pub store: StoreSettings,
    pub lock: LockSettings,
    pub github: GithubSettings,
    pub output: OutputSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SlackSettings {
    pub bot_token: Option<String>,
    pub api_base: String,
    pub username: Option<String>,
    pub icon_emoji: Option<String>,
}

impl Default for SlackSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: DEFAULT_SLACK_API_BASE.to_string(),
            username: None,
            icon_emoji: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub namespace: String,
    pub storage_path: PathBuf,
    pub project_id: Option<String>,
    pub access_token: Option<String>,
    pub api_base: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            namespace: DEFAULT_NAMESPACE.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            project_id: None,
            access_token: None,
            api_base: DEFAULT_DATASTORE_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LockSettings {
    pub backoff_min_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for LockSettings {
    fn default() -> Self {
        let defaults = LockOptions::default();
        Self {
            backoff_min_ms: defaults.backoff_min.as_millis() as u64,
            backoff_max_ms: defaults.backoff_max.as_millis() as u64,
        }
    }
}

impl LockSettings {
    pub fn options(&self) -> LockOptions {
        LockOptions {
            backoff_min: Duration::from_millis(self.backoff_min_ms),
            backoff_max: Duration::from_millis(self.backoff_max_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GithubSettings {
    pub token: Option<String>,
    pub repository: Option<String>,
    pub api_base: String,
    pub github_ref: Option<String>,
    pub pr_number: Option<String>,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            token: None,
            repository: None,
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            github_ref: None,
            pr_number: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub github_output: Option<PathBuf>,
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: LogLevel,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    pub fn event_log(&self) -> EventLog {
        match &self.file {
            Some(path) => EventLog::file(self.level, path.clone()),
            None => EventLog::stderr(self.level),
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock.backoff_min_ms >= self.lock.backoff_max_ms {
            return Err(ConfigError::Settings(format!(
                "`lock.backoff_min_ms` ({}) must be less than `lock.backoff_max_ms` ({})",
                self.lock.backoff_min_ms, self.lock.backoff_max_ms
            )));
        }
        if self.store.namespace.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`store.namespace` must be non-empty".to_string(),
            ));
        }
        match self.store.backend {
            StoreBackend::File => {
                if self.store.storage_path.as_os_str().is_empty() {
                    return Err(ConfigError::Settings(
                        "`store.storage_path` must be non-empty for the file backend".to_string(),
                    ));
                }
            }
            StoreBackend::Datastore => {
                if is_blank(&self.store.project_id) {
                    return Err(ConfigError::Settings(
                        "`store.project_id` is required for the datastore backend".to_string(),
                    ));
                }
                if is_blank(&self.store.access_token) {
                    return Err(ConfigError::Settings(
                        "`store.access_token` is required for the datastore backend".to_string(),
                    ));
                }
            }
            StoreBackend::Memory => {}
        }
        Ok(())
    }

    /// Checked separately from `validate` since only canvas commands talk
    /// to Slack.
    pub fn require_slack_token(&self) -> Result<&str, ConfigError> {
        self.slack
            .bot_token
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ConfigError::Settings(
                    "`slack.bot_token` is required; set SLACK_BOT_TOKEN".to_string(),
                )
            })
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}
