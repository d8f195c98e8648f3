use crate::shared::serde_ext::parse_via_string;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} `{value}`; expected one of: {expected}")]
pub struct StatusParseError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Title-cases every word: the first letter after any non-letter is upper
/// case, the rest lower case.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

macro_rules! define_status_enum {
    (
        $name:ident, $kind:literal, default = $default:ident,
        { $($variant:ident => ($value:literal, $member:literal, $icon:literal)),+ $(,)? }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            pub fn icon(self) -> &'static str {
                match self {
                    $(Self::$variant => $icon,)+
                }
            }

            /// Status text as shown on the canvas, e.g. `Not Started`.
            pub fn label(self) -> String {
                title_case(self.as_str())
            }

            /// Accepts the canonical value (`not started`) or the member name
            /// (`not_started`), ignoring case and surrounding whitespace.
            pub fn parse(raw: &str) -> Result<Self, StatusParseError> {
                let normalized = raw.trim().to_ascii_lowercase();
                match normalized.as_str() {
                    $(v if v == $value || v == $member => Ok(Self::$variant),)+
                    _ => Err(StatusParseError {
                        kind: $kind,
                        value: raw.to_string(),
                        expected: Self::ALL
                            .iter()
                            .map(|status| status.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = StatusParseError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Self::parse(raw)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                parse_via_string(deserializer, $kind, |raw| {
                    Self::parse(raw).map_err(|err| format!("expected one of: {}", err.expected))
                })
            }
        }
    };
}

define_status_enum!(StepStatus, "step status", default = NotStarted, {
    NotStarted => ("not started", "not_started", ":double_vertical_bar:"),
    InProgress => ("in progress", "in_progress", ":arrow_forward:"),
    Skipped => ("skipped", "skipped", ":fast_forward:"),
    Succeeded => ("succeeded", "succeeded", ":white_check_mark:"),
    Failed => ("failed", "failed", ":octagonal_sign:"),
});

define_status_enum!(WorkflowStatus, "workflow status", default = Initializing, {
    Initializing => ("initializing", "initializing", ":white_circle:"),
    InProgress => ("in progress", "in_progress", ":large_yellow_circle:"),
    Succeeded => ("succeeded", "succeeded", ":large_green_circle:"),
    Failed => ("failed", "failed", ":red_circle:"),
});
