use actionkit::config::{load_settings_with, ConfigError, Settings, StoreBackend};
use actionkit::shared::logging::LogLevel;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn load(vars: &HashMap<String, String>) -> Result<Settings, ConfigError> {
    load_settings_with(|name| vars.get(name).cloned())
}

#[test]
fn defaults_apply_without_config_or_environment() {
    let settings = load(&HashMap::new()).expect("defaults");
    assert_eq!(settings.store.backend, StoreBackend::File);
    assert_eq!(settings.store.namespace, "github-actions");
    assert_eq!(
        settings.store.storage_path,
        PathBuf::from("/tmp/action_context")
    );
    assert_eq!(settings.lock.options().backoff_min, Duration::from_millis(1000));
    assert_eq!(settings.lock.options().backoff_max, Duration::from_millis(2000));
    assert_eq!(settings.slack.api_base, "https://slack.com/api");
    assert_eq!(settings.github.api_base, "https://api.github.com");
    assert_eq!(settings.log.level, LogLevel::Info);
    assert!(settings.require_slack_token().is_err());
}

#[test]
fn environment_overrides_yaml_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("actionkit.yaml");
    fs::write(
        &path,
        r#"
slack:
  bot_token: xoxb-from-file
  username: file-bot
store:
  namespace: from-file
lock:
  backoff_min_ms: 10
  backoff_max_ms: 20
"#,
    )
    .expect("write config");

    let vars = env(&[
        ("ACTIONKIT_CONFIG", path.to_str().expect("utf8 path")),
        ("SLACK_BOT_TOKEN", "xoxb-from-env"),
        ("DATASTORE_NAMESPACE", ""),
        ("CANVAS_LOCK_BACKOFF_MAX_MS", "50"),
        ("FINGERPRINT", "abc123"),
        ("GITHUB_OUTPUT", "/tmp/gh-output"),
    ]);
    let settings = load(&vars).expect("settings");
    assert_eq!(settings.slack.bot_token.as_deref(), Some("xoxb-from-env"));
    assert_eq!(settings.slack.username.as_deref(), Some("file-bot"));
    assert_eq!(settings.store.namespace, "from-file");
    assert_eq!(settings.lock.backoff_min_ms, 10);
    assert_eq!(settings.lock.backoff_max_ms, 50);
    assert_eq!(settings.output.fingerprint.as_deref(), Some("abc123"));
    assert_eq!(
        settings.output.github_output,
        Some(PathBuf::from("/tmp/gh-output"))
    );
    assert_eq!(settings.require_slack_token().expect("token"), "xoxb-from-env");
}

#[test]
fn datastore_backend_uses_cloud_project_fallback() {
    let vars = env(&[
        ("CANVAS_STORE_BACKEND", "Datastore"),
        ("GOOGLE_CLOUD_PROJECT", "proj-from-gcloud"),
        ("DATASTORE_ACCESS_TOKEN", "ya29.token"),
    ]);
    let settings = load(&vars).expect("settings");
    assert_eq!(settings.store.backend, StoreBackend::Datastore);
    assert_eq!(settings.store.project_id.as_deref(), Some("proj-from-gcloud"));

    let missing_token = env(&[
        ("CANVAS_STORE_BACKEND", "datastore"),
        ("DATASTORE_PROJECT_ID", "proj"),
    ]);
    assert!(matches!(load(&missing_token), Err(ConfigError::Settings(_))));
}

#[test]
fn invalid_values_name_the_variable() {
    let err = load(&env(&[("CANVAS_STORE_BACKEND", "redis")])).expect_err("backend");
    assert!(err.to_string().contains("CANVAS_STORE_BACKEND"));

    let err = load(&env(&[("CANVAS_LOCK_BACKOFF_MIN_MS", "soon")])).expect_err("millis");
    assert!(err.to_string().contains("CANVAS_LOCK_BACKOFF_MIN_MS"));

    let err = load(&env(&[("CANVAS_LOCK_BACKOFF_MIN_MS", "5000")])).expect_err("ordering");
    assert!(matches!(err, ConfigError::Settings(_)));
}

#[test]
fn missing_config_file_is_a_read_error() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("missing.yaml");
    let err = load(&env(&[(
        "ACTIONKIT_CONFIG",
        missing.to_str().expect("utf8 path"),
    )]))
    .expect_err("missing file");
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn log_settings_write_json_lines_to_file() {
    let dir = tempdir().expect("tempdir");
    let log_path = dir.path().join("logs/actionkit.log");
    let vars = env(&[
        ("ACTIONKIT_LOG_LEVEL", "warn"),
        ("ACTIONKIT_LOG_FILE", log_path.to_str().expect("utf8 path")),
    ]);
    let settings = load(&vars).expect("settings");
    let log = settings.log.event_log();
    log.info("ignored.event", "below threshold");
    log.warn("canvas.lock.contended", "canvas c1 is locked");

    let raw = fs::read_to_string(&log_path).expect("read log");
    let lines: Vec<&str> = raw.lines().collect();
    assert_eq!(lines.len(), 1);
    let entry: Value = serde_json::from_str(lines[0]).expect("json line");
    assert_eq!(entry["level"], "warn");
    assert_eq!(entry["event"], "canvas.lock.contended");
    assert!(entry["timestamp"].as_str().expect("timestamp").ends_with('Z'));
}
