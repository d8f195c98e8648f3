//! Canvas and step identifiers. Canvas ids become datastore key names and
//! file names, so they are restricted to a path-safe ASCII alphabet. Step
//! ids only live inside the stored record and accept any printable text.

use super::serde_ext::parse_via_string;
use serde::{Deserialize, Deserializer, Serialize};

pub const MAX_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("{kind} must be non-empty")]
    Empty { kind: &'static str },
    #[error("{kind} `{value}` contains {ch:?}, which is not allowed")]
    InvalidChar {
        kind: &'static str,
        value: String,
        ch: char,
    },
    #[error("{kind} is {len} characters long; the limit is {max}")]
    TooLong {
        kind: &'static str,
        len: usize,
        max: usize,
    },
}

fn path_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn printable(ch: char) -> bool {
    !ch.is_control()
}

fn check_id(kind: &'static str, value: &str, allowed: fn(char) -> bool) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty { kind });
    }
    if let Some(ch) = value.chars().find(|ch| !allowed(*ch)) {
        return Err(IdError::InvalidChar {
            kind,
            value: value.to_string(),
            ch,
        });
    }
    if value.len() > MAX_ID_LEN {
        return Err(IdError::TooLong {
            kind,
            len: value.len(),
            max: MAX_ID_LEN,
        });
    }
    Ok(())
}

/// Random UUID v4 in its hyphenated lowercase form.
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

macro_rules! canvas_id_type {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $allowed:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const KIND: &'static str = $kind;

            pub fn parse(raw: &str) -> Result<Self, IdError> {
                check_id($kind, raw, $allowed)?;
                Ok(Self(raw.to_string()))
            }

            pub fn generate() -> Self {
                Self(generate_uuid())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Self::parse(raw)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                parse_via_string(deserializer, $kind, |raw| {
                    Self::parse(raw).map_err(|err| err.to_string())
                })
            }
        }
    };
}

canvas_id_type!(
    /// Identifies one workflow canvas across invocations.
    CanvasId,
    "canvas id",
    path_safe
);
canvas_id_type!(StepId, "step id", printable);
