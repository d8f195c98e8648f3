use super::{ConfigError, Settings, StoreBackend};
use crate::shared::logging::LogLevel;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "ACTIONKIT_CONFIG";

/// Loads settings from the process environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_with(|name| std::env::var(name).ok())
}

/// Optional YAML file named by `ACTIONKIT_CONFIG`, overlaid with the
/// variables `lookup` resolves, then validated.
pub fn load_settings_with<F>(lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = match non_empty(&lookup, CONFIG_PATH_ENV) {
        Some(path) => Settings::from_path(Path::new(&path))?,
        None => Settings::default(),
    };
    settings.apply_env(&lookup)?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    /// Blank variables count as unset; workflow runners export empty strings
    /// for inputs that were never provided.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| non_empty(&lookup, name);

        if let Some(v) = get("SLACK_BOT_TOKEN") {
            self.slack.bot_token = Some(v);
        }
        if let Some(v) = get("SLACK_API_BASE") {
            self.slack.api_base = v;
        }
        if let Some(v) = get("SLACK_USERNAME") {
            self.slack.username = Some(v);
        }
        if let Some(v) = get("SLACK_ICON_EMOJI") {
            self.slack.icon_emoji = Some(v);
        }

        if let Some(v) = get("CANVAS_STORE_BACKEND") {
            self.store.backend = StoreBackend::parse(&v).map_err(|message| {
                ConfigError::InvalidEnv {
                    var: "CANVAS_STORE_BACKEND".to_string(),
                    message,
                }
            })?;
        }
        if let Some(v) = get("CONTEXT_STORAGE_PATH") {
            self.store.storage_path = PathBuf::from(v);
        }
        if let Some(v) = get("DATASTORE_NAMESPACE") {
            self.store.namespace = v;
        }
        if let Some(v) = get("DATASTORE_PROJECT_ID").or_else(|| get("GOOGLE_CLOUD_PROJECT")) {
            self.store.project_id = Some(v);
        }
        if let Some(v) = get("DATASTORE_ACCESS_TOKEN") {
            self.store.access_token = Some(v);
        }
        if let Some(v) = get("DATASTORE_API_BASE") {
            self.store.api_base = v;
        }

        if let Some(v) = get("CANVAS_LOCK_BACKOFF_MIN_MS") {
            self.lock.backoff_min_ms = parse_millis("CANVAS_LOCK_BACKOFF_MIN_MS", &v)?;
        }
        if let Some(v) = get("CANVAS_LOCK_BACKOFF_MAX_MS") {
            self.lock.backoff_max_ms = parse_millis("CANVAS_LOCK_BACKOFF_MAX_MS", &v)?;
        }

        if let Some(v) = get("GITHUB_TOKEN") {
            self.github.token = Some(v);
        }
        if let Some(v) = get("GITHUB_REPOSITORY") {
            self.github.repository = Some(v);
        }
        if let Some(v) = get("GITHUB_REF") {
            self.github.github_ref = Some(v);
        }
        if let Some(v) = get("GITHUB_PR_NUMBER") {
            self.github.pr_number = Some(v);
        }
        if let Some(v) = get("GITHUB_API_URL") {
            self.github.api_base = v;
        }

        if let Some(v) = get("GITHUB_OUTPUT") {
            self.output.github_output = Some(PathBuf::from(v));
        }
        if let Some(v) = get("FINGERPRINT") {
            self.output.fingerprint = Some(v);
        }

        if let Some(v) = get("ACTIONKIT_LOG_LEVEL") {
            self.log.level = LogLevel::parse(&v).map_err(|message| ConfigError::InvalidEnv {
                var: "ACTIONKIT_LOG_LEVEL".to_string(),
                message,
            })?;
        }
        if let Some(v) = get("ACTIONKIT_LOG_FILE") {
            self.log.file = Some(PathBuf::from(v));
        }
        Ok(())
    }
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_millis(name: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
        var: name.to_string(),
        message: format!("expected a whole number of milliseconds, got `{raw}`"),
    })
}
