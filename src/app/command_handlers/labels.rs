use crate::app::args::ParsedArgs;
use crate::github::labels::{default_labels, load_labels, sync_labels};
use crate::github::LabelAdmin;
use crate::shared::logging::EventLog;
use std::path::Path;

pub const LABEL_FLAGS: &[&str] = &["github-repository", "labels"];
pub const LABEL_SWITCHES: &[&str] = &["no-recreate"];

/// Returns one report line per label.
pub fn cmd_sync_labels<A: LabelAdmin>(
    admin: &A,
    repository: &str,
    log: &EventLog,
    args: &ParsedArgs,
) -> Result<String, String> {
    let labels = match args.value("labels") {
        Some(path) => load_labels(Path::new(path)).map_err(|e| e.to_string())?,
        None => default_labels(),
    };
    let recreate = !args.switch("no-recreate");
    let outcomes = sync_labels(admin, &labels, recreate).map_err(|e| e.to_string())?;

    let mut lines = vec![format!("Updating semver-guidance labels on {repository}")];
    for outcome in &outcomes {
        log.info(
            "labels.synced",
            &format!(
                "repository={repository} label={} action={}",
                outcome.name,
                outcome.action.as_str()
            ),
        );
        lines.push(outcome.to_string());
    }
    Ok(lines.join("\n"))
}
