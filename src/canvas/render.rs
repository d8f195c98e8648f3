use super::blocks::{Block, BlockError, TextObject, HEADER_TEXT_MAX_CHARS, MESSAGE_MAX_BLOCKS};
use super::error::CanvasError;
use super::model::{Workflow, WorkflowStep};
use serde::Serialize;

/// Renders the full canvas: header, one section per step, one context per
/// artifact, then a trailing divider. Same workflow state, same blocks.
pub fn render_blocks(workflow: &Workflow) -> Result<Vec<Block>, BlockError> {
    let mut blocks = Vec::with_capacity(workflow.steps.len() + workflow.artifacts.len() + 2);
    blocks.push(header_block(workflow)?);
    for step in &workflow.steps {
        blocks.push(step_block(step)?);
    }
    for artifact in &workflow.artifacts {
        blocks.push(Block::context(vec![TextObject::mrkdwn(artifact.clone()).into()])?);
    }
    blocks.push(Block::divider());
    Ok(blocks)
}

pub fn header_text(workflow: &Workflow) -> String {
    format!(
        "{} [{}] {}",
        workflow.status.icon(),
        workflow.status.label(),
        workflow.description.as_deref().unwrap_or_default()
    )
    .trim_end()
    .to_string()
}

fn header_block(workflow: &Workflow) -> Result<Block, BlockError> {
    Block::header(truncate_chars(&header_text(workflow), HEADER_TEXT_MAX_CHARS))
}

fn step_block(step: &WorkflowStep) -> Result<Block, BlockError> {
    Block::section_fields(vec![
        TextObject::mrkdwn(step.description.clone()),
        TextObject::mrkdwn(format!("{} {}", step.status.icon(), step.status.label())),
    ])
}

fn truncate_chars(raw: &str, max: usize) -> String {
    if raw.chars().count() <= max {
        return raw.to_string();
    }
    let mut out: String = raw.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Channel, fallback text and blocks for one `chat.postMessage` or
/// `chat.update` call. Identical for both; only the transport differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanvasMessage {
    pub channel: String,
    pub text: String,
    pub blocks: Vec<Block>,
}

impl CanvasMessage {
    pub fn for_workflow(workflow: &Workflow) -> Result<Self, CanvasError> {
        let channel = workflow
            .channel()
            .ok_or_else(|| CanvasError::MissingChannel {
                canvas_id: workflow.workflow_id.to_string(),
            })?
            .to_string();
        let blocks = render_blocks(workflow)?;
        if blocks.len() > MESSAGE_MAX_BLOCKS {
            return Err(BlockError::TooManyBlocks {
                max: MESSAGE_MAX_BLOCKS,
                count: blocks.len(),
            }
            .into());
        }
        Ok(Self {
            channel,
            text: workflow.description.clone().unwrap_or_default(),
            blocks,
        })
    }
}
