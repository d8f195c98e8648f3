use super::error::CanvasError;
use super::model::{RemovalReport, StepSelector, Workflow, WorkflowStep};
use super::render::CanvasMessage;
use super::repository::CanvasRepository;
use super::status::{StepStatus, WorkflowStatus};
use crate::channels::slack::CanvasTransport;
use crate::shared::ids::{CanvasId, StepId};
use crate::shared::logging::EventLog;
use crate::shared::serde_ext::{sanitize_optional_text, sanitize_text};
use crate::store::KeyValueStore;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateCanvasRequest {
    pub description: Option<String>,
    pub channel: Option<String>,
    pub canvas_id: Option<CanvasId>,
    /// Full workflow JSON; when present the other fields are ignored.
    pub workflow_json: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStepRequest {
    pub canvas_id: CanvasId,
    pub description: String,
    pub step_status: StepStatus,
    pub workflow_status: Option<WorkflowStatus>,
    pub step_id: Option<StepId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateWorkflowRequest {
    pub canvas_id: CanvasId,
    pub step_updates: Vec<(StepId, StepStatus)>,
    pub workflow_status: Option<WorkflowStatus>,
}

impl UpdateWorkflowRequest {
    /// Pairs step ids with statuses positionally; both lists must have the
    /// same length.
    pub fn new(
        canvas_id: CanvasId,
        step_ids: Vec<StepId>,
        step_statuses: Vec<StepStatus>,
        workflow_status: Option<WorkflowStatus>,
    ) -> Result<Self, CanvasError> {
        if step_ids.len() != step_statuses.len() {
            return Err(CanvasError::Usage(format!(
                "mismatch in number of steps ({}) and statuses ({})",
                step_ids.len(),
                step_statuses.len()
            )));
        }
        Ok(Self {
            canvas_id,
            step_updates: step_ids.into_iter().zip(step_statuses).collect(),
            workflow_status,
        })
    }
}

/// Canvas operations: each one mutates the stored workflow under its lock,
/// then pushes the re-rendered canvas to the transport. The transport call
/// happens after the lock is released, so a transport failure leaves the
/// stored state ahead of the displayed message.
#[derive(Debug)]
pub struct CanvasService<S, T> {
    repository: CanvasRepository<S>,
    transport: T,
    log: EventLog,
}

impl<S: KeyValueStore, T: CanvasTransport> CanvasService<S, T> {
    pub fn new(repository: CanvasRepository<S>, transport: T, log: EventLog) -> Self {
        Self {
            repository,
            transport,
            log,
        }
    }

    pub fn repository(&self) -> &CanvasRepository<S> {
        &self.repository
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn lock_id(&self) -> &str {
        self.repository.instance_id()
    }

    pub fn create_canvas(&self, request: CreateCanvasRequest) -> Result<Workflow, CanvasError> {
        let mut workflow = match request.workflow_json.as_deref() {
            Some(raw) => {
                let workflow = Workflow::from_json(raw)?;
                self.log.debug(
                    "canvas.create.json_input",
                    &format!("canvas={}", workflow.workflow_id),
                );
                workflow
            }
            None => {
                let mut workflow =
                    Workflow::new(request.canvas_id.unwrap_or_else(CanvasId::generate));
                workflow.description = sanitize_optional_text(request.description.as_deref());
                workflow.channel_name = request
                    .channel
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
                workflow
            }
        };
        if workflow.message_id.is_some() || workflow.channel_id.is_some() {
            return Err(CanvasError::AlreadyPosted {
                canvas_id: workflow.workflow_id.to_string(),
            });
        }
        workflow.begin_progress();

        let message = CanvasMessage::for_workflow(&workflow)?;
        let posted = self.transport.post_canvas(&message)?;
        workflow.record_posted(posted)?;
        self.repository.store_workflow(&workflow)?;
        self.log.info(
            "canvas.created",
            &format!(
                "canvas={} channel={}",
                workflow.workflow_id,
                workflow.channel().unwrap_or_default()
            ),
        );
        Ok(workflow)
    }

    pub fn create_step(&self, request: CreateStepRequest) -> Result<(Workflow, StepId), CanvasError> {
        let mut step = WorkflowStep::new(sanitize_text(&request.description), request.step_status);
        if let Some(step_id) = request.step_id {
            step.step_id = step_id;
        }
        let (workflow, (step_id, message)) =
            self.locked_update(&request.canvas_id, |workflow| {
                if let Some(status) = request.workflow_status {
                    workflow.status = status;
                }
                Ok(workflow.add_step(step)?.step_id.clone())
            })?;
        self.publish_update(&workflow, &message)?;
        self.log.info(
            "canvas.step.created",
            &format!("canvas={} step={step_id}", workflow.workflow_id),
        );
        Ok((workflow, step_id))
    }

    pub fn remove_steps(
        &self,
        canvas_id: &CanvasId,
        selector: &StepSelector,
        status_filter: &[StepStatus],
    ) -> Result<(Workflow, RemovalReport), CanvasError> {
        let (workflow, (report, message)) = self.locked_update(canvas_id, |workflow| {
            Ok(workflow.remove_steps(selector, status_filter))
        })?;
        for step_id in &report.unmatched {
            self.log.warn(
                "canvas.step.remove_unmatched",
                &format!("canvas={canvas_id} step={step_id} does not exist; nothing removed"),
            );
        }
        for step_id in &report.filtered_out {
            self.log.debug(
                "canvas.step.remove_filtered",
                &format!("canvas={canvas_id} step={step_id} kept by status filter"),
            );
        }
        self.publish_update(&workflow, &message)?;
        self.log.info(
            "canvas.step.removed",
            &format!("canvas={canvas_id} removed={}", report.removed.len()),
        );
        Ok((workflow, report))
    }

    pub fn update_workflow(&self, request: UpdateWorkflowRequest) -> Result<Workflow, CanvasError> {
        let (workflow, ((), message)) = self.locked_update(&request.canvas_id, |workflow| {
            workflow.set_step_statuses(&request.step_updates)?;
            if let Some(status) = request.workflow_status {
                workflow.status = status;
            }
            Ok(())
        })?;
        self.publish_update(&workflow, &message)?;
        self.log.info(
            "canvas.updated",
            &format!(
                "canvas={} steps_updated={} status={}",
                workflow.workflow_id,
                request.step_updates.len(),
                workflow.status
            ),
        );
        Ok(workflow)
    }

    pub fn add_artifact(&self, canvas_id: &CanvasId, description: &str) -> Result<Workflow, CanvasError> {
        let description = sanitize_text(description);
        let (workflow, ((), message)) =
            self.locked_update(canvas_id, |workflow| workflow.add_artifact(&description))?;
        self.publish_update(&workflow, &message)?;
        self.log.info(
            "canvas.artifact.added",
            &format!("canvas={canvas_id} artifacts={}", workflow.artifacts.len()),
        );
        Ok(workflow)
    }

    /// Marks the canvas complete, deletes its stored record and, on every
    /// path, its lock record. Nothing can update the canvas afterwards.
    pub fn finalize(
        &self,
        canvas_id: &CanvasId,
        workflow_status: Option<WorkflowStatus>,
    ) -> Result<Workflow, CanvasError> {
        let finalized = self.finalize_record(canvas_id, workflow_status);
        let cleanup = self.repository.delete_lock(canvas_id);
        let workflow = finalized?;
        cleanup?;
        self.log.info(
            "canvas.finalized",
            &format!("canvas={canvas_id} status={}", workflow.status),
        );
        Ok(workflow)
    }

    fn finalize_record(
        &self,
        canvas_id: &CanvasId,
        workflow_status: Option<WorkflowStatus>,
    ) -> Result<Workflow, CanvasError> {
        let repository = &self.repository;
        let (workflow, message) = repository.with_locked_workflow(canvas_id, false, |workflow| {
            workflow.mark_complete()?;
            if let Some(status) = workflow_status {
                workflow.status = status;
            }
            if workflow.posted_message().is_none() {
                return Err(CanvasError::NotPosted {
                    canvas_id: canvas_id.to_string(),
                });
            }
            let message = CanvasMessage::for_workflow(workflow)?;
            repository.delete_workflow(canvas_id)?;
            Ok(message)
        })?;
        self.publish_update(&workflow, &message)?;
        Ok(workflow)
    }

    /// Slack payload for the stored canvas, read without taking the lock.
    pub fn canvas_json(&self, canvas_id: &CanvasId) -> Result<Value, CanvasError> {
        let workflow = self.repository.load_workflow(canvas_id)?;
        let message = CanvasMessage::for_workflow(&workflow)?;
        serde_json::to_value(&message).map_err(|source| CanvasError::InvalidRecord {
            canvas_id: canvas_id.to_string(),
            source,
        })
    }

    /// Mutates and saves under the lock. The canvas is rendered before the
    /// save, so a state that cannot be displayed is never stored.
    fn locked_update<R, F>(
        &self,
        canvas_id: &CanvasId,
        mutate: F,
    ) -> Result<(Workflow, (R, CanvasMessage)), CanvasError>
    where
        F: FnOnce(&mut Workflow) -> Result<R, CanvasError>,
    {
        self.repository
            .with_locked_workflow(canvas_id, true, |workflow| {
                let value = mutate(workflow)?;
                if workflow.posted_message().is_none() {
                    return Err(CanvasError::NotPosted {
                        canvas_id: workflow.workflow_id.to_string(),
                    });
                }
                Ok((value, CanvasMessage::for_workflow(workflow)?))
            })
    }

    fn publish_update(&self, workflow: &Workflow, message: &CanvasMessage) -> Result<(), CanvasError> {
        let posted = workflow
            .posted_message()
            .ok_or_else(|| CanvasError::NotPosted {
                canvas_id: workflow.workflow_id.to_string(),
            })?;
        self.transport.update_canvas(&posted, message)?;
        Ok(())
    }
}
