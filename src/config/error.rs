use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid yaml: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("environment variable {var} is invalid: {message}")]
    InvalidEnv { var: String, message: String },
    #[error("label `{label}` is invalid: {message}")]
    InvalidLabel { label: String, message: String },
    #[error("settings validation failed: {0}")]
    Settings(String),
}
