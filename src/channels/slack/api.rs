use super::{CanvasTransport, SlackError};
use crate::canvas::{CanvasMessage, PostedMessage};
use crate::config::SlackSettings;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Clone)]
pub struct SlackApiClient {
    api_base: String,
    bot_token: String,
    username: Option<String>,
    icon_emoji: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackEnvelope<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    data: T,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PostMessageData {
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    message: Option<PostedMessageData>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PostedMessageData {
    #[serde(default)]
    ts: Option<String>,
}

impl SlackApiClient {
    pub fn new(api_base: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            bot_token: bot_token.into(),
            username: None,
            icon_emoji: None,
        }
    }

    pub fn from_settings(settings: &SlackSettings) -> Result<Self, SlackError> {
        let bot_token = settings
            .bot_token
            .clone()
            .filter(|v| !v.trim().is_empty())
            .ok_or(SlackError::MissingBotToken)?;
        let mut client = Self::new(settings.api_base.clone(), bot_token);
        client.username = settings.username.clone();
        client.icon_emoji = settings.icon_emoji.clone();
        Ok(client)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }

    fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<SlackEnvelope<T>, SlackError> {
        let url = self.endpoint(path);
        let response = ureq::post(&url)
            .set("Authorization", &format!("Bearer {}", self.bot_token))
            .set("Content-Type", "application/json; charset=utf-8")
            .send_json(
                serde_json::to_value(body).map_err(|e| SlackError::ApiRequest(e.to_string()))?,
            )
            .map_err(|e| SlackError::ApiRequest(e.to_string()))?;

        let envelope: SlackEnvelope<T> = response
            .into_json()
            .map_err(|e| SlackError::ApiRequest(e.to_string()))?;
        if !envelope.ok {
            return Err(SlackError::ApiResponse(
                envelope
                    .error
                    .unwrap_or_else(|| format!("{path} failed")),
            ));
        }
        Ok(envelope)
    }

    fn message_body(&self, channel: &str, message: &CanvasMessage) -> Value {
        let mut body = json!({
            "channel": channel,
            "text": message.text,
            "blocks": message.blocks,
        });
        if let Some(username) = self.username.as_deref().filter(|v| !v.trim().is_empty()) {
            body["username"] = json!(username);
        }
        if let Some(icon) = self.icon_emoji.as_deref().filter(|v| !v.trim().is_empty()) {
            body["icon_emoji"] = json!(icon);
        }
        body
    }
}

impl CanvasTransport for SlackApiClient {
    fn post_canvas(&self, message: &CanvasMessage) -> Result<PostedMessage, SlackError> {
        let body = self.message_body(&message.channel, message);
        let envelope: SlackEnvelope<PostMessageData> =
            self.post_json("chat.postMessage", &body)?;
        let data = envelope.data;
        let channel_id = data
            .channel
            .ok_or(SlackError::MissingResponseField("channel"))?;
        let message_id = data
            .ts
            .or_else(|| data.message.and_then(|m| m.ts))
            .ok_or(SlackError::MissingResponseField("ts"))?;
        Ok(PostedMessage {
            channel_id,
            message_id,
        })
    }

    fn update_canvas(
        &self,
        posted: &PostedMessage,
        message: &CanvasMessage,
    ) -> Result<(), SlackError> {
        let mut body = self.message_body(&posted.channel_id, message);
        body["ts"] = json!(posted.message_id);
        let _: SlackEnvelope<Value> = self.post_json("chat.update", &body)?;
        Ok(())
    }
}
