#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    CreateCanvas,
    CreateStep,
    RemoveStep,
    UpdateWorkflow,
    AddArtifact,
    FinalizeWorkflow,
    GetCanvasJson,
    CheckSemverGuidance,
    SyncLabels,
    Help,
    Unknown,
}

impl CliVerb {
    /// Canvas commands talk to Slack and emit the `fingerprint` output.
    pub fn is_canvas_command(self) -> bool {
        matches!(
            self,
            Self::CreateCanvas
                | Self::CreateStep
                | Self::RemoveStep
                | Self::UpdateWorkflow
                | Self::AddArtifact
                | Self::FinalizeWorkflow
                | Self::GetCanvasJson
        )
    }
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "create-canvas" => CliVerb::CreateCanvas,
        "create-step" => CliVerb::CreateStep,
        "remove-step" => CliVerb::RemoveStep,
        "update-workflow" => CliVerb::UpdateWorkflow,
        "add-artifact" => CliVerb::AddArtifact,
        "finalize-workflow" => CliVerb::FinalizeWorkflow,
        "get-canvas-json" => CliVerb::GetCanvasJson,
        "check-semver-guidance" => CliVerb::CheckSemverGuidance,
        "sync-labels" => CliVerb::SyncLabels,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  create-canvas [--description D] [--channel C] [--canvas-id ID] [--json J]".to_string(),
        "      Post a new workflow canvas and store its state".to_string(),
        "  create-step --canvas-id ID --description D [--step-status S] [--workflow-status S] [--step-id ID]"
            .to_string(),
        "      Append a step to a canvas".to_string(),
        "  remove-step --canvas-id ID --step-id ID|* ... [--step-status|-s S ...]".to_string(),
        "      Remove steps by id or wildcard, optionally filtered by status".to_string(),
        "  update-workflow --canvas-id ID [--step-id ID --step-status S ...] [--workflow-status S]"
            .to_string(),
        "      Set step and workflow statuses".to_string(),
        "  add-artifact --canvas-id ID --description D".to_string(),
        "      Append a context artifact (at most 9 per canvas)".to_string(),
        "  finalize-workflow --canvas-id ID [--workflow-status S]".to_string(),
        "      Mark the canvas complete and delete its stored state".to_string(),
        "  get-canvas-json --canvas-id ID".to_string(),
        "      Print the rendered Slack payload for a canvas".to_string(),
        "  check-semver-guidance [--pr-number N] [--github-ref REF] [--github-repository O/R]"
            .to_string(),
        "      Require exactly one semver-guidance label on a pull request".to_string(),
        "  sync-labels [--github-repository O/R] [--labels FILE] [--no-recreate]".to_string(),
        "      Create or update the semver-guidance labels on a repository".to_string(),
    ]
}

pub fn help_text() -> String {
    let mut lines = vec!["usage: actionkit <command> [options]".to_string(), String::new()];
    lines.extend(cli_help_lines());
    lines.push(String::new());
    lines.push("Step statuses: not started, in progress, skipped, succeeded, failed".to_string());
    lines.push("Workflow statuses: initializing, in progress, succeeded, failed".to_string());
    lines.join("\n")
}
