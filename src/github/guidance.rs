//! Semver guidance check: exactly one `semver-guidance:<value>` label on the
//! pull request decides how the next release bumps its version.

use super::{GithubError, IssueTracker};

pub const GUIDANCE_LABEL_PREFIX: &str = "semver-guidance:";

#[derive(Debug, thiserror::Error)]
pub enum GuidanceError {
    #[error("could not determine pull request number from GITHUB_REF \"{0}\"")]
    InvalidRef(String),
    #[error("invalid pull request number `{0}`")]
    InvalidPrNumber(String),
    #[error("missing pull request number; pass --pr-number or --github-ref")]
    MissingPrNumber,
    #[error(
        "too many guidance labels applied! please remove extraneous \"semver-guidance\" labels from PR#{pr_number} (found: {found})"
    )]
    TooManyLabels { pr_number: u64, found: String },
    #[error(
        "no guidance labels provided. please add a label to pull request #{pr_number} in the format of 'semver-guidance:foo' where 'foo' is one of prerelease, patch, minor, major, or some explicit version string"
    )]
    MissingLabel { pr_number: u64 },
    #[error(transparent)]
    Github(#[from] GithubError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuidanceReport {
    pub pr_number: u64,
    pub guidance: String,
}

/// Extracts `<n>` from the first `refs/pull/<n>/merge` inside `github_ref`.
pub fn pr_number_from_ref(github_ref: &str) -> Result<u64, GuidanceError> {
    const MARKER: &str = "refs/pull/";
    for (start, _) in github_ref.match_indices(MARKER) {
        let rest = &github_ref[start + MARKER.len()..];
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 || !rest[digits_len..].starts_with("/merge") {
            continue;
        }
        if let Ok(number) = rest[..digits_len].parse::<u64>() {
            return Ok(number);
        }
    }
    Err(GuidanceError::InvalidRef(github_ref.to_string()))
}

/// An explicit number wins over the ref.
pub fn resolve_pr_number(
    explicit: Option<&str>,
    github_ref: Option<&str>,
) -> Result<u64, GuidanceError> {
    if let Some(raw) = explicit.map(str::trim).filter(|v| !v.is_empty()) {
        return raw
            .parse::<u64>()
            .map_err(|_| GuidanceError::InvalidPrNumber(raw.to_string()));
    }
    match github_ref.map(str::trim).filter(|v| !v.is_empty()) {
        Some(github_ref) => pr_number_from_ref(github_ref),
        None => Err(GuidanceError::MissingPrNumber),
    }
}

pub fn select_guidance<S: AsRef<str>>(pr_number: u64, labels: &[S]) -> Result<String, GuidanceError> {
    let guidance: Vec<&str> = labels
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| name.starts_with(GUIDANCE_LABEL_PREFIX))
        .map(|name| name.rsplit(':').next().unwrap_or_default())
        .collect();
    match guidance.as_slice() {
        [] => Err(GuidanceError::MissingLabel { pr_number }),
        [single] => Ok((*single).to_string()),
        many => Err(GuidanceError::TooManyLabels {
            pr_number,
            found: many.join(", "),
        }),
    }
}

pub fn check_guidance<T: IssueTracker>(
    tracker: &T,
    pr_number: u64,
) -> Result<GuidanceReport, GuidanceError> {
    let labels = tracker.pull_request_labels(pr_number)?;
    let guidance = select_guidance(pr_number, &labels)?;
    Ok(GuidanceReport {
        pr_number,
        guidance,
    })
}
