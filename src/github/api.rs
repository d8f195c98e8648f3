use super::{GithubError, IssueTracker, Label, LabelAdmin, Repository};
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct GithubClient {
    api_base: String,
    token: Option<String>,
    repository: Repository,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    #[serde(default)]
    labels: Vec<Label>,
}

impl GithubClient {
    pub fn new(api_base: impl Into<String>, token: Option<String>, repository: Repository) -> Self {
        Self {
            api_base: api_base.into(),
            token: token.filter(|v| !v.trim().is_empty()),
            repository,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.repository.owner),
            urlencoding::encode(&self.repository.name),
            suffix
        )
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let mut request = ureq::request(method, url)
            .set("accept", "application/vnd.github+json")
            .set("x-github-api-version", "2022-11-28")
            .set(
                "user-agent",
                concat!("actionkit/", env!("CARGO_PKG_VERSION")),
            );
        if let Some(token) = &self.token {
            request = request.set("authorization", &format!("Bearer {token}"));
        }
        request
    }

    fn require_token(&self) -> Result<(), GithubError> {
        if self.token.is_none() {
            return Err(GithubError::MissingToken);
        }
        Ok(())
    }

    fn send(
        &self,
        method: &str,
        url: &str,
        body: Option<Value>,
    ) -> Result<Option<ureq::Response>, GithubError> {
        let request = self.request(method, url);
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        match result {
            Ok(response) => Ok(Some(response)),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(ureq::Error::Status(status, response)) => Err(GithubError::ApiStatus {
                url: url.to_string(),
                status,
                message: response
                    .into_string()
                    .unwrap_or_else(|_| "unreadable response body".to_string()),
            }),
            Err(err) => Err(GithubError::ApiRequest {
                url: url.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    fn send_expecting(
        &self,
        method: &str,
        url: &str,
        body: Option<Value>,
    ) -> Result<ureq::Response, GithubError> {
        self.send(method, url, body)?
            .ok_or_else(|| GithubError::ApiStatus {
                url: url.to_string(),
                status: 404,
                message: "not found".to_string(),
            })
    }

    fn parse<T: for<'de> Deserialize<'de>>(
        url: &str,
        response: ureq::Response,
    ) -> Result<T, GithubError> {
        response
            .into_json::<T>()
            .map_err(|e| GithubError::ApiRequest {
                url: url.to_string(),
                reason: format!("failed to parse response: {e}"),
            })
    }
}

impl IssueTracker for GithubClient {
    fn pull_request_labels(&self, pr_number: u64) -> Result<Vec<String>, GithubError> {
        let url = self.repo_url(&format!("pulls/{pr_number}"));
        let response = self.send_expecting("GET", &url, None)?;
        let pull: PullRequest = Self::parse(&url, response)?;
        Ok(pull.labels.into_iter().map(|label| label.name).collect())
    }
}

impl LabelAdmin for GithubClient {
    fn get_label(&self, name: &str) -> Result<Option<Label>, GithubError> {
        let url = self.repo_url(&format!("labels/{}", urlencoding::encode(name)));
        match self.send("GET", &url, None)? {
            Some(response) => Self::parse(&url, response).map(Some),
            None => Ok(None),
        }
    }

    fn create_label(&self, label: &Label) -> Result<(), GithubError> {
        self.require_token()?;
        let url = self.repo_url("labels");
        self.send_expecting(
            "POST",
            &url,
            Some(json!({
                "name": label.name,
                "color": label.color,
                "description": label.description,
            })),
        )?;
        Ok(())
    }

    fn update_label(&self, label: &Label) -> Result<(), GithubError> {
        self.require_token()?;
        let url = self.repo_url(&format!("labels/{}", urlencoding::encode(&label.name)));
        self.send_expecting(
            "PATCH",
            &url,
            Some(json!({
                "new_name": label.name,
                "color": label.color,
                "description": label.description,
            })),
        )?;
        Ok(())
    }
}
