use crate::canvas::{CanvasMessage, PostedMessage};

pub mod api;

pub use api::{SlackApiClient, DEFAULT_SLACK_API_BASE};

#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("missing slack bot token; set SLACK_BOT_TOKEN")]
    MissingBotToken,
    #[error("slack api request failed: {0}")]
    ApiRequest(String),
    #[error("slack api responded with error `{0}`")]
    ApiResponse(String),
    #[error("slack api response is missing `{0}`")]
    MissingResponseField(&'static str),
}

/// Messaging side of the workflow canvas: post once, then edit in place.
pub trait CanvasTransport {
    fn post_canvas(&self, message: &CanvasMessage) -> Result<PostedMessage, SlackError>;

    fn update_canvas(
        &self,
        posted: &PostedMessage,
        message: &CanvasMessage,
    ) -> Result<(), SlackError>;
}

impl<T: CanvasTransport + ?Sized> CanvasTransport for &T {
    fn post_canvas(&self, message: &CanvasMessage) -> Result<PostedMessage, SlackError> {
        (**self).post_canvas(message)
    }

    fn update_canvas(
        &self,
        posted: &PostedMessage,
        message: &CanvasMessage,
    ) -> Result<(), SlackError> {
        (**self).update_canvas(posted, message)
    }
}
