use super::blocks::BlockError;
use super::status::StatusParseError;
use crate::channels::slack::SlackError;
use crate::shared::ids::IdError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("usage error: {0}")]
    Usage(String),
    #[error("no step named `{step_id}`")]
    StepNotFound { step_id: String },
    #[error("step `{step_id}` already exists on this canvas")]
    DuplicateStep { step_id: String },
    #[error("a maximum of {max} artifacts per canvas can be attached")]
    ArtifactCapacity { max: usize },
    #[error("no stored workflow canvas `{canvas_id}`")]
    CanvasNotFound { canvas_id: String },
    #[error("workflow canvas `{canvas_id}` has no progress marker artifact to complete")]
    MissingProgressMarker { canvas_id: String },
    #[error("workflow canvas `{canvas_id}` has already been posted")]
    AlreadyPosted { canvas_id: String },
    #[error("workflow canvas `{canvas_id}` has not been posted yet")]
    NotPosted { canvas_id: String },
    #[error("workflow canvas `{canvas_id}` has no channel to post to")]
    MissingChannel { canvas_id: String },
    #[error("stored workflow canvas `{canvas_id}` is invalid: {source}")]
    InvalidRecord {
        canvas_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid workflow json: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error(transparent)]
    InvalidId(#[from] IdError),
    #[error(transparent)]
    Status(#[from] StatusParseError),
    #[error("invalid canvas block: {0}")]
    Block(#[from] BlockError),
    #[error("workflow storage failed: {0}")]
    Store(#[from] StoreError),
    #[error("slack transport failed: {0}")]
    Slack(#[from] SlackError),
}
