use actionkit::github::guidance::{
    check_guidance, pr_number_from_ref, resolve_pr_number, select_guidance, GuidanceError,
};
use actionkit::github::{GithubError, IssueTracker};
use std::collections::BTreeMap;

struct FakeTracker {
    labels: BTreeMap<u64, Vec<String>>,
}

impl FakeTracker {
    fn with(pr_number: u64, labels: &[&str]) -> Self {
        let mut map = BTreeMap::new();
        map.insert(pr_number, labels.iter().map(|v| v.to_string()).collect());
        Self { labels: map }
    }
}

impl IssueTracker for FakeTracker {
    fn pull_request_labels(&self, pr_number: u64) -> Result<Vec<String>, GithubError> {
        self.labels
            .get(&pr_number)
            .cloned()
            .ok_or_else(|| GithubError::ApiStatus {
                url: format!("pulls/{pr_number}"),
                status: 404,
                message: "Not Found".to_string(),
            })
    }
}

#[test]
fn pr_number_comes_from_merge_ref() {
    assert_eq!(pr_number_from_ref("refs/pull/42/merge").expect("pr"), 42);
    let err = pr_number_from_ref("refs/tags/v1.0.0").expect_err("not a pr ref");
    assert_eq!(
        err.to_string(),
        "could not determine pull request number from GITHUB_REF \"refs/tags/v1.0.0\""
    );
}

#[test]
fn explicit_pr_number_wins_over_ref() {
    assert_eq!(
        resolve_pr_number(Some("7"), Some("refs/pull/42/merge")).expect("pr"),
        7
    );
    assert_eq!(
        resolve_pr_number(Some(" "), Some("refs/pull/42/merge")).expect("pr"),
        42
    );
    assert!(matches!(
        resolve_pr_number(Some("seven"), None),
        Err(GuidanceError::InvalidPrNumber(_))
    ));
    assert!(matches!(
        resolve_pr_number(None, None),
        Err(GuidanceError::MissingPrNumber)
    ));
}

#[test]
fn single_guidance_label_is_selected() {
    let tracker = FakeTracker::with(12, &["enhancement", "semver-guidance:minor"]);
    let report = check_guidance(&tracker, 12).expect("guidance");
    assert_eq!(report.pr_number, 12);
    assert_eq!(report.guidance, "minor");
}

#[test]
fn multiple_guidance_labels_are_rejected() {
    let labels = ["semver-guidance:patch", "semver-guidance:major"];
    let err = select_guidance(3, &labels).expect_err("too many");
    assert!(matches!(err, GuidanceError::TooManyLabels { pr_number: 3, .. }));
    assert!(err.to_string().contains("PR#3"));
}

#[test]
fn missing_guidance_label_is_rejected() {
    let tracker = FakeTracker::with(5, &["bug", "guidance:minor"]);
    let err = check_guidance(&tracker, 5).expect_err("missing");
    assert!(matches!(err, GuidanceError::MissingLabel { pr_number: 5 }));
    assert!(err.to_string().contains("semver-guidance:foo"));
}

#[test]
fn tracker_failures_propagate() {
    let tracker = FakeTracker::with(1, &[]);
    assert!(matches!(
        check_guidance(&tracker, 2),
        Err(GuidanceError::Github(GithubError::ApiStatus { status: 404, .. }))
    ));
}
