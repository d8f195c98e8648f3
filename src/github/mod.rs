use serde::{Deserialize, Serialize};

pub mod api;
pub mod guidance;
pub mod labels;

pub use api::{GithubClient, DEFAULT_GITHUB_API_BASE};

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("missing github token; set GITHUB_TOKEN")]
    MissingToken,
    #[error("missing github repository; set GITHUB_REPOSITORY or pass --github-repository")]
    MissingRepository,
    #[error("repository `{0}` must use `owner/name` format")]
    InvalidRepository(String),
    #[error("github request to {url} failed: {reason}")]
    ApiRequest { url: String, reason: String },
    #[error("github request to {url} returned status {status}: {message}")]
    ApiStatus {
        url: String,
        status: u16,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn parse(raw: &str) -> Result<Self, GithubError> {
        let (owner, name) = raw
            .trim()
            .split_once('/')
            .ok_or_else(|| GithubError::InvalidRepository(raw.to_string()))?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(GithubError::InvalidRepository(raw.to_string()));
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Read side of the issue tracker, as used by the guidance check.
pub trait IssueTracker {
    fn pull_request_labels(&self, pr_number: u64) -> Result<Vec<String>, GithubError>;
}

pub trait LabelAdmin {
    fn get_label(&self, name: &str) -> Result<Option<Label>, GithubError>;

    fn create_label(&self, label: &Label) -> Result<(), GithubError>;

    fn update_label(&self, label: &Label) -> Result<(), GithubError>;
}
