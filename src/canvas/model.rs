use super::error::CanvasError;
use super::status::{StepStatus, WorkflowStatus};
use crate::shared::ids::{CanvasId, StepId};
use serde::{Deserialize, Serialize};

pub const MAX_ARTIFACTS: usize = 9;
pub const PROGRESS_MARKER_INCOMPLETE: &str = "INCOMPLETE";
pub const PROGRESS_MARKER_COMPLETE: &str = "COMPLETE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    #[serde(alias = "stepId", default = "StepId::generate")]
    pub step_id: StepId,
    pub description: String,
    #[serde(default)]
    pub status: StepStatus,
}

impl WorkflowStep {
    pub fn new(description: impl Into<String>, status: StepStatus) -> Self {
        Self {
            step_id: StepId::generate(),
            description: description.into(),
            status,
        }
    }
}

/// Where the canvas message lives once posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel_id: String,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WorkflowFields")]
pub struct Workflow {
    pub workflow_id: CanvasId,
    pub message_id: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub execution_href: Option<String>,
    pub description: Option<String>,
    pub event_name: Option<String>,
    pub event_href: Option<String>,
    pub status: WorkflowStatus,
    pub steps: Vec<WorkflowStep>,
    pub artifacts: Vec<String>,
}

/// Accepted shape for stored records and JSON input. `canvas_id` and
/// `canvasId` name the same field as `workflow_id` and win over it.
#[derive(Deserialize)]
struct WorkflowFields {
    #[serde(default, alias = "workflowId")]
    workflow_id: Option<CanvasId>,
    #[serde(default, alias = "canvasId")]
    canvas_id: Option<CanvasId>,
    #[serde(default, alias = "messageId")]
    message_id: Option<String>,
    #[serde(default, alias = "channelId")]
    channel_id: Option<String>,
    #[serde(default, alias = "channel", alias = "channelName")]
    channel_name: Option<String>,
    #[serde(default, alias = "executionHref")]
    execution_href: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "eventName")]
    event_name: Option<String>,
    #[serde(default, alias = "eventHref")]
    event_href: Option<String>,
    #[serde(default)]
    status: WorkflowStatus,
    #[serde(default)]
    steps: Vec<WorkflowStep>,
    #[serde(default)]
    artifacts: Vec<String>,
}

impl From<WorkflowFields> for Workflow {
    fn from(fields: WorkflowFields) -> Self {
        Self {
            workflow_id: fields
                .canvas_id
                .or(fields.workflow_id)
                .unwrap_or_else(CanvasId::generate),
            message_id: fields.message_id,
            channel_id: fields.channel_id,
            channel_name: fields.channel_name,
            execution_href: fields.execution_href,
            description: fields.description,
            event_name: fields.event_name,
            event_href: fields.event_href,
            status: fields.status,
            steps: fields.steps,
            artifacts: fields.artifacts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepSelector {
    All,
    Ids(Vec<StepId>),
}

impl StepSelector {
    pub const WILDCARD: &'static str = "*";

    /// Any `*` among the raw ids selects every step.
    pub fn parse<S: AsRef<str>>(raw_ids: &[S]) -> Result<Self, CanvasError> {
        if raw_ids.is_empty() {
            return Err(CanvasError::Usage(
                "at least one --step-id is required".to_string(),
            ));
        }
        if raw_ids.iter().any(|raw| raw.as_ref().trim() == Self::WILDCARD) {
            return Ok(Self::All);
        }
        raw_ids
            .iter()
            .map(|raw| StepId::parse(raw.as_ref().trim()).map_err(CanvasError::from))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Ids)
    }

    fn selects(&self, step_id: &StepId) -> bool {
        match self {
            Self::All => true,
            Self::Ids(ids) => ids.contains(step_id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub removed: Vec<StepId>,
    /// Selected steps kept because their status did not pass the filter.
    pub filtered_out: Vec<StepId>,
    /// Requested ids that matched no step.
    pub unmatched: Vec<StepId>,
}

impl Workflow {
    pub fn new(workflow_id: CanvasId) -> Self {
        Self {
            workflow_id,
            message_id: None,
            channel_id: None,
            channel_name: None,
            execution_href: None,
            description: None,
            event_name: None,
            event_href: None,
            status: WorkflowStatus::default(),
            steps: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, CanvasError> {
        serde_json::from_str(raw).map_err(CanvasError::InvalidJson)
    }

    /// The posted channel id once known, otherwise the configured channel name.
    pub fn channel(&self) -> Option<&str> {
        self.channel_id
            .as_deref()
            .or(self.channel_name.as_deref())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn posted_message(&self) -> Option<PostedMessage> {
        match (&self.channel_id, &self.message_id) {
            (Some(channel_id), Some(message_id)) => Some(PostedMessage {
                channel_id: channel_id.clone(),
                message_id: message_id.clone(),
            }),
            _ => None,
        }
    }

    /// Message identifiers are write-once; later updates edit that message.
    pub fn record_posted(&mut self, posted: PostedMessage) -> Result<(), CanvasError> {
        if self.message_id.is_some() {
            return Err(CanvasError::AlreadyPosted {
                canvas_id: self.workflow_id.to_string(),
            });
        }
        self.channel_id = Some(posted.channel_id);
        self.message_id = Some(posted.message_id);
        Ok(())
    }

    pub fn begin_progress(&mut self) {
        if self.artifacts.is_empty() {
            self.artifacts.push(PROGRESS_MARKER_INCOMPLETE.to_string());
        }
    }

    pub fn find_step(&self, step_id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|step| step.step_id.as_str() == step_id)
    }

    pub fn add_step(&mut self, step: WorkflowStep) -> Result<&WorkflowStep, CanvasError> {
        if self.find_step(step.step_id.as_str()).is_some() {
            return Err(CanvasError::DuplicateStep {
                step_id: step.step_id.to_string(),
            });
        }
        self.steps.push(step);
        let index = self.steps.len() - 1;
        Ok(&self.steps[index])
    }

    /// Stable removal: survivors keep their relative order. An empty
    /// `status_filter` allows every status.
    pub fn remove_steps(
        &mut self,
        selector: &StepSelector,
        status_filter: &[StepStatus],
    ) -> RemovalReport {
        let mut report = RemovalReport::default();
        if let StepSelector::Ids(ids) = selector {
            report.unmatched = ids
                .iter()
                .filter(|id| self.find_step(id.as_str()).is_none())
                .cloned()
                .collect();
        }

        self.steps.retain(|step| {
            if !selector.selects(&step.step_id) {
                return true;
            }
            if !status_filter.is_empty() && !status_filter.contains(&step.status) {
                report.filtered_out.push(step.step_id.clone());
                return true;
            }
            report.removed.push(step.step_id.clone());
            false
        });
        report
    }

    /// All ids are resolved before any status changes, so an unknown id
    /// leaves the workflow untouched.
    pub fn set_step_statuses(
        &mut self,
        updates: &[(StepId, StepStatus)],
    ) -> Result<(), CanvasError> {
        let mut indexes = Vec::with_capacity(updates.len());
        for (step_id, status) in updates {
            let index = self
                .steps
                .iter()
                .position(|step| &step.step_id == step_id)
                .ok_or_else(|| CanvasError::StepNotFound {
                    step_id: step_id.to_string(),
                })?;
            indexes.push((index, *status));
        }
        for (index, status) in indexes {
            self.steps[index].status = status;
        }
        Ok(())
    }

    pub fn add_artifact(&mut self, description: &str) -> Result<(), CanvasError> {
        if self.artifacts.len() >= MAX_ARTIFACTS {
            return Err(CanvasError::ArtifactCapacity { max: MAX_ARTIFACTS });
        }
        self.artifacts.push(format!("> {description}"));
        Ok(())
    }

    /// Replaces the leading progress marker with the completion marker.
    pub fn mark_complete(&mut self) -> Result<(), CanvasError> {
        let marker = self
            .artifacts
            .first_mut()
            .ok_or_else(|| CanvasError::MissingProgressMarker {
                canvas_id: self.workflow_id.to_string(),
            })?;
        *marker = PROGRESS_MARKER_COMPLETE.to_string();
        Ok(())
    }
}
