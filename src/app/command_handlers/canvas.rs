use crate::app::args::ParsedArgs;
use crate::app::outputs::ActionOutputs;
use crate::canvas::{
    CanvasService, CreateCanvasRequest, CreateStepRequest, StepSelector, StepStatus,
    UpdateWorkflowRequest, WorkflowStatus,
};
use crate::channels::slack::CanvasTransport;
use crate::shared::ids::{CanvasId, StepId};
use crate::store::KeyValueStore;

fn canvas_id(args: &ParsedArgs) -> Result<CanvasId, String> {
    CanvasId::parse(args.required("canvas-id")?.trim()).map_err(|e| e.to_string())
}

fn optional_workflow_status(args: &ParsedArgs) -> Result<Option<WorkflowStatus>, String> {
    args.value("workflow-status")
        .map(WorkflowStatus::parse)
        .transpose()
        .map_err(|e| e.to_string())
}

fn step_statuses(args: &ParsedArgs) -> Result<Vec<StepStatus>, String> {
    args.values("step-status")
        .iter()
        .map(|raw| StepStatus::parse(raw).map_err(|e| e.to_string()))
        .collect()
}

pub fn cmd_create_canvas<S: KeyValueStore, T: CanvasTransport>(
    service: &CanvasService<S, T>,
    args: &[String],
) -> Result<ActionOutputs, String> {
    let args = ParsedArgs::parse(args, &["description", "channel", "canvas-id", "json"], &[])?;
    let request = CreateCanvasRequest {
        description: args.value("description").map(str::to_string),
        channel: args.value("channel").map(str::to_string),
        canvas_id: args
            .value("canvas-id")
            .map(|raw| CanvasId::parse(raw.trim()).map_err(|e| e.to_string()))
            .transpose()?,
        workflow_json: args
            .value("json")
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string),
    };
    let workflow = service.create_canvas(request).map_err(|e| e.to_string())?;
    Ok(ActionOutputs::new().with("canvas-id", workflow.workflow_id.to_string()))
}

pub fn cmd_create_step<S: KeyValueStore, T: CanvasTransport>(
    service: &CanvasService<S, T>,
    args: &[String],
) -> Result<ActionOutputs, String> {
    let args = ParsedArgs::parse(
        args,
        &[
            "canvas-id",
            "description",
            "step-status",
            "workflow-status",
            "step-id",
        ],
        &[],
    )?;
    let request = CreateStepRequest {
        canvas_id: canvas_id(&args)?,
        description: args.required("description")?.to_string(),
        step_status: args
            .value("step-status")
            .map(StepStatus::parse)
            .transpose()
            .map_err(|e| e.to_string())?
            .unwrap_or_default(),
        workflow_status: optional_workflow_status(&args)?,
        step_id: args
            .value("step-id")
            .filter(|v| !v.trim().is_empty())
            .map(|raw| StepId::parse(raw.trim()).map_err(|e| e.to_string()))
            .transpose()?,
    };
    let (_, step_id) = service.create_step(request).map_err(|e| e.to_string())?;
    Ok(ActionOutputs::new()
        .with("step-id", step_id.to_string())
        .with("lock-id", service.lock_id()))
}

pub fn cmd_remove_step<S: KeyValueStore, T: CanvasTransport>(
    service: &CanvasService<S, T>,
    args: &[String],
) -> Result<ActionOutputs, String> {
    let args = ParsedArgs::parse_with_short(
        args,
        &["canvas-id", "step-id", "step-status"],
        &[],
        &[('s', "step-status")],
    )?;
    let canvas_id = canvas_id(&args)?;
    let selector = StepSelector::parse(args.values("step-id")).map_err(|e| e.to_string())?;
    let filter = step_statuses(&args)?;
    service
        .remove_steps(&canvas_id, &selector, &filter)
        .map_err(|e| e.to_string())?;
    Ok(ActionOutputs::new().with("lock-id", service.lock_id()))
}

pub fn cmd_update_workflow<S: KeyValueStore, T: CanvasTransport>(
    service: &CanvasService<S, T>,
    args: &[String],
) -> Result<ActionOutputs, String> {
    let args = ParsedArgs::parse(
        args,
        &["canvas-id", "step-id", "step-status", "workflow-status"],
        &[],
    )?;
    let step_ids = args
        .values("step-id")
        .iter()
        .map(|raw| StepId::parse(raw.trim()).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    let request = UpdateWorkflowRequest::new(
        canvas_id(&args)?,
        step_ids,
        step_statuses(&args)?,
        optional_workflow_status(&args)?,
    )
    .map_err(|e| e.to_string())?;
    service.update_workflow(request).map_err(|e| e.to_string())?;
    Ok(ActionOutputs::new().with("lock-id", service.lock_id()))
}

pub fn cmd_add_artifact<S: KeyValueStore, T: CanvasTransport>(
    service: &CanvasService<S, T>,
    args: &[String],
) -> Result<ActionOutputs, String> {
    let args = ParsedArgs::parse(args, &["canvas-id", "description"], &[])?;
    let canvas_id = canvas_id(&args)?;
    service
        .add_artifact(&canvas_id, args.required("description")?)
        .map_err(|e| e.to_string())?;
    Ok(ActionOutputs::new().with("lock-id", service.lock_id()))
}

pub fn cmd_finalize_workflow<S: KeyValueStore, T: CanvasTransport>(
    service: &CanvasService<S, T>,
    args: &[String],
) -> Result<ActionOutputs, String> {
    let args = ParsedArgs::parse(args, &["canvas-id", "workflow-status"], &[])?;
    let canvas_id = canvas_id(&args)?;
    service
        .finalize(&canvas_id, optional_workflow_status(&args)?)
        .map_err(|e| e.to_string())?;
    Ok(ActionOutputs::new())
}

pub fn cmd_get_canvas_json<S: KeyValueStore, T: CanvasTransport>(
    service: &CanvasService<S, T>,
    args: &[String],
) -> Result<ActionOutputs, String> {
    let args = ParsedArgs::parse(args, &["canvas-id"], &[])?;
    let payload = service
        .canvas_json(&canvas_id(&args)?)
        .map_err(|e| e.to_string())?;
    let pretty = serde_json::to_string_pretty(&payload).map_err(|e| e.to_string())?;
    Ok(ActionOutputs::new().with("canvas-json", pretty))
}
