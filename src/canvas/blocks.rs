//! Slack Block Kit subset used by the workflow canvas.
//!
//! Text objects are the leaves; blocks are the composites that hold them.
//! The checked constructors (`Block::header`, `Block::section_fields`, ...)
//! enforce Slack's structural limits, and `Block::validate` re-checks any
//! block assembled by hand.

use serde::{Deserialize, Serialize};

pub const HEADER_TEXT_MAX_CHARS: usize = 150;
pub const SECTION_MAX_FIELDS: usize = 10;
pub const CONTEXT_MAX_ELEMENTS: usize = 10;
pub const MESSAGE_MAX_BLOCKS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    #[error("header text must be plain_text")]
    HeaderNotPlainText,
    #[error("header text exceeds {max} characters ({count})")]
    HeaderTooLong { max: usize, count: usize },
    #[error("section needs text or at least one field")]
    EmptySection,
    #[error("section accepts at most {max} fields, got {count}")]
    TooManyFields { max: usize, count: usize },
    #[error("context accepts 1 to {max} elements, got {count}")]
    ContextElementCount { max: usize, count: usize },
    #[error("image blocks and elements require alt text")]
    MissingAltText,
    #[error("a message accepts at most {max} blocks, got {count}")]
    TooManyBlocks { max: usize, count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Mrkdwn { text: String },
    PlainText { text: String },
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Mrkdwn { text } | Self::PlainText { text } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextElement {
    Mrkdwn { text: String },
    PlainText { text: String },
    Image { image_url: String, alt_text: String },
}

impl From<TextObject> for ContextElement {
    fn from(value: TextObject) -> Self {
        match value {
            TextObject::Mrkdwn { text } => Self::Mrkdwn { text },
            TextObject::PlainText { text } => Self::PlainText { text },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: TextObject,
    },
    Section {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<TextObject>,
    },
    Context {
        elements: Vec<ContextElement>,
    },
    Divider,
    Image {
        image_url: String,
        alt_text: String,
    },
}

impl Block {
    pub fn header(text: impl Into<String>) -> Result<Self, BlockError> {
        Self::checked(Self::Header {
            text: TextObject::plain(text),
        })
    }

    pub fn section_text(text: TextObject) -> Result<Self, BlockError> {
        Self::checked(Self::Section {
            text: Some(text),
            fields: Vec::new(),
        })
    }

    pub fn section_fields(fields: Vec<TextObject>) -> Result<Self, BlockError> {
        Self::checked(Self::Section { text: None, fields })
    }

    pub fn context(elements: Vec<ContextElement>) -> Result<Self, BlockError> {
        Self::checked(Self::Context { elements })
    }

    pub fn divider() -> Self {
        Self::Divider
    }

    pub fn image(
        image_url: impl Into<String>,
        alt_text: impl Into<String>,
    ) -> Result<Self, BlockError> {
        Self::checked(Self::Image {
            image_url: image_url.into(),
            alt_text: alt_text.into(),
        })
    }

    fn checked(block: Self) -> Result<Self, BlockError> {
        block.validate()?;
        Ok(block)
    }

    pub fn validate(&self) -> Result<(), BlockError> {
        match self {
            Self::Header { text } => {
                let TextObject::PlainText { text } = text else {
                    return Err(BlockError::HeaderNotPlainText);
                };
                let count = text.chars().count();
                if count > HEADER_TEXT_MAX_CHARS {
                    return Err(BlockError::HeaderTooLong {
                        max: HEADER_TEXT_MAX_CHARS,
                        count,
                    });
                }
                Ok(())
            }
            Self::Section { text, fields } => {
                if text.is_none() && fields.is_empty() {
                    return Err(BlockError::EmptySection);
                }
                if fields.len() > SECTION_MAX_FIELDS {
                    return Err(BlockError::TooManyFields {
                        max: SECTION_MAX_FIELDS,
                        count: fields.len(),
                    });
                }
                Ok(())
            }
            Self::Context { elements } => {
                if elements.is_empty() || elements.len() > CONTEXT_MAX_ELEMENTS {
                    return Err(BlockError::ContextElementCount {
                        max: CONTEXT_MAX_ELEMENTS,
                        count: elements.len(),
                    });
                }
                let missing_alt = elements.iter().any(|element| {
                    matches!(element, ContextElement::Image { alt_text, .. } if alt_text.trim().is_empty())
                });
                if missing_alt {
                    return Err(BlockError::MissingAltText);
                }
                Ok(())
            }
            Self::Divider => Ok(()),
            Self::Image { alt_text, .. } => {
                if alt_text.trim().is_empty() {
                    return Err(BlockError::MissingAltText);
                }
                Ok(())
            }
        }
    }
}
