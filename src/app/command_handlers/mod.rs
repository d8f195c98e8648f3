use crate::app::args::ParsedArgs;
use crate::app::cli::{help_text, parse_cli_verb, CliVerb};
use crate::app::command_support::{canvas_service, github_client};
use crate::app::outputs::ActionOutputs;
use crate::canvas::CanvasService;
use crate::channels::slack::CanvasTransport;
use crate::config::{load_settings, OutputSettings, Settings};
use crate::shared::logging::EventLog;
use crate::store::KeyValueStore;

pub mod canvas;
pub mod guidance;
pub mod labels;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() || parse_cli_verb(&args[0]) == CliVerb::Help {
        return Ok(help_text());
    }
    let settings = load_settings().map_err(|e| e.to_string())?;
    let log = settings.log.event_log();
    let result = run_cli_with(&settings, &log, &args);
    if let Err(err) = &result {
        log.error("command.failed", &format!("command={} error={err}", args[0]));
    }
    result
}

pub fn run_cli_with(settings: &Settings, log: &EventLog, args: &[String]) -> Result<String, String> {
    let Some((command, rest)) = args.split_first() else {
        return Ok(help_text());
    };
    let verb = parse_cli_verb(command);
    match verb {
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{command}`")),
        CliVerb::CheckSemverGuidance => {
            let parsed = ParsedArgs::parse(rest, guidance::GUIDANCE_FLAGS, &[])?;
            let client = github_client(&settings.github, parsed.value("github-repository"))
                .map_err(|e| e.to_string())?;
            let outputs =
                guidance::cmd_check_semver_guidance(&client, &settings.github, log, &parsed)?;
            emit_outputs(outputs, &settings.output, false)
        }
        CliVerb::SyncLabels => {
            let parsed = ParsedArgs::parse(rest, labels::LABEL_FLAGS, labels::LABEL_SWITCHES)?;
            let client = github_client(&settings.github, parsed.value("github-repository"))
                .map_err(|e| e.to_string())?;
            let repository = client.repository().to_string();
            labels::cmd_sync_labels(&client, &repository, log, &parsed)
        }
        _ => {
            let service = canvas_service(settings, log)?;
            let outputs = run_canvas_command(&service, verb, rest)?;
            emit_outputs(outputs, &settings.output, true)
        }
    }
}

pub fn run_canvas_command<S: KeyValueStore, T: CanvasTransport>(
    service: &CanvasService<S, T>,
    verb: CliVerb,
    args: &[String],
) -> Result<ActionOutputs, String> {
    match verb {
        CliVerb::CreateCanvas => canvas::cmd_create_canvas(service, args),
        CliVerb::CreateStep => canvas::cmd_create_step(service, args),
        CliVerb::RemoveStep => canvas::cmd_remove_step(service, args),
        CliVerb::UpdateWorkflow => canvas::cmd_update_workflow(service, args),
        CliVerb::AddArtifact => canvas::cmd_add_artifact(service, args),
        CliVerb::FinalizeWorkflow => canvas::cmd_finalize_workflow(service, args),
        CliVerb::GetCanvasJson => canvas::cmd_get_canvas_json(service, args),
        other => Err(format!("{other:?} is not a canvas command")),
    }
}

/// Appends `fingerprint` when asked, writes `GITHUB_OUTPUT` when configured
/// and returns the stdout rendering.
pub fn emit_outputs(
    mut outputs: ActionOutputs,
    settings: &OutputSettings,
    with_fingerprint: bool,
) -> Result<String, String> {
    if with_fingerprint {
        if let Some(fingerprint) = settings.fingerprint.as_deref() {
            outputs.push("fingerprint", fingerprint);
        }
    }
    if let Some(path) = &settings.github_output {
        outputs.append_to(path).map_err(|e| {
            format!("failed to append outputs to {}: {e}", path.display())
        })?;
    }
    Ok(outputs.render())
}
