use crate::app::args::ParsedArgs;
use crate::app::outputs::ActionOutputs;
use crate::config::GithubSettings;
use crate::github::guidance::{check_guidance, resolve_pr_number};
use crate::github::IssueTracker;
use crate::shared::logging::EventLog;

pub const GUIDANCE_FLAGS: &[&str] = &["pr-number", "github-ref", "github-repository"];

/// Flags win over the values configured through the environment.
pub fn cmd_check_semver_guidance<T: IssueTracker>(
    tracker: &T,
    settings: &GithubSettings,
    log: &EventLog,
    args: &ParsedArgs,
) -> Result<ActionOutputs, String> {
    let pr_number = resolve_pr_number(
        args.value("pr-number").or(settings.pr_number.as_deref()),
        args.value("github-ref").or(settings.github_ref.as_deref()),
    )
    .map_err(|e| e.to_string())?;
    let report = check_guidance(tracker, pr_number).map_err(|e| e.to_string())?;
    log.info(
        "guidance.checked",
        &format!("pr={} guidance={}", report.pr_number, report.guidance),
    );
    Ok(ActionOutputs::new()
        .with("pr-number", report.pr_number.to_string())
        .with("guidance", report.guidance))
}
