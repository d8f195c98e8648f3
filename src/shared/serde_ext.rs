use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

pub fn parse_via_string<'de, D, T, F>(deserializer: D, kind: &str, parser: F) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    F: FnOnce(&str) -> Result<T, String>,
{
    let raw = String::deserialize(deserializer)?;
    parser(&raw).map_err(|err| D::Error::custom(format!("invalid {kind} `{raw}`: {err}")))
}

/// Collapses line breaks into spaces and trims the result.
pub fn sanitize_text(raw: &str) -> String {
    raw.replace("\r\n", " ")
        .replace('\n', " ")
        .trim()
        .to_string()
}

pub fn sanitize_optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(sanitize_text).filter(|v| !v.is_empty())
}
