use crate::shared::fs_atomic::append_line;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err("log level must be one of: debug, info, warn, error".to_string()),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LogSink {
    Stderr,
    File(PathBuf),
    Discard,
}

/// JSON-lines event log. Stdout stays reserved for action outputs, so the
/// default sink is stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    threshold: LogLevel,
    sink: LogSink,
}

impl EventLog {
    pub fn stderr(threshold: LogLevel) -> Self {
        Self {
            threshold,
            sink: LogSink::Stderr,
        }
    }

    pub fn file(threshold: LogLevel, path: impl Into<PathBuf>) -> Self {
        Self {
            threshold,
            sink: LogSink::File(path.into()),
        }
    }

    pub fn discard() -> Self {
        Self {
            threshold: LogLevel::Error,
            sink: LogSink::Discard,
        }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.sink != LogSink::Discard && level >= self.threshold
    }

    pub fn log(&self, level: LogLevel, event: &str, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let payload = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "level": level.as_str(),
            "event": event,
            "message": message,
        });
        let Ok(line) = serde_json::to_string(&payload) else {
            return;
        };

        match &self.sink {
            LogSink::Stderr => {
                let _ = writeln!(std::io::stderr().lock(), "{line}");
            }
            LogSink::File(path) => {
                let _ = append_line(path, &line);
            }
            LogSink::Discard => {}
        }
    }

    pub fn debug(&self, event: &str, message: &str) {
        self.log(LogLevel::Debug, event, message);
    }

    pub fn info(&self, event: &str, message: &str) {
        self.log(LogLevel::Info, event, message);
    }

    pub fn warn(&self, event: &str, message: &str) {
        self.log(LogLevel::Warn, event, message);
    }

    pub fn error(&self, event: &str, message: &str) {
        self.log(LogLevel::Error, event, message);
    }
}
