//! Workflow canvas: a live Slack message mirroring a multi-step CI workflow.

pub mod blocks;
pub mod error;
pub mod model;
pub mod render;
pub mod repository;
pub mod service;
pub mod status;

pub use blocks::{Block, BlockError, ContextElement, TextObject};
pub use error::CanvasError;
pub use model::{
    PostedMessage, RemovalReport, StepSelector, Workflow, WorkflowStep, MAX_ARTIFACTS,
    PROGRESS_MARKER_COMPLETE, PROGRESS_MARKER_INCOMPLETE,
};
pub use render::{header_text, render_blocks, CanvasMessage};
pub use repository::{CanvasRepository, LockGuard, LockOptions, LOCK_KIND, WORKFLOW_KIND};
pub use service::{CanvasService, CreateCanvasRequest, CreateStepRequest, UpdateWorkflowRequest};
pub use status::{title_case, StatusParseError, StepStatus, WorkflowStatus};
