use super::{GithubError, Label, LabelAdmin};
use crate::config::ConfigError;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSyncAction {
    Created,
    Updated,
    /// Label already existed and recreation was disabled.
    Kept,
}

impl LabelSyncAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Kept => "kept",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSyncOutcome {
    pub name: String,
    pub action: LabelSyncAction,
}

impl std::fmt::Display for LabelSyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self.action {
            LabelSyncAction::Created => "Created",
            LabelSyncAction::Updated => "Updated",
            LabelSyncAction::Kept => "Kept",
        };
        write!(f, "{verb} label {}", self.name)
    }
}

fn label(name: &str, color: &str, description: &str) -> Label {
    Label {
        name: name.to_string(),
        color: color.to_string(),
        description: Some(description.to_string()),
    }
}

/// The semver guidance label set the guidance check expects.
pub fn default_labels() -> Vec<Label> {
    vec![
        label("semver-guidance:major", "DE1C95", "The 'x' in x.y.z"),
        label("semver-guidance:minor", "A3B4DB", "The 'y' in x.y.z"),
        label("semver-guidance:patch", "E4B02D", "The 'z' in x.y.z"),
        label(
            "semver-guidance:no-bump",
            "5319e7",
            "Use this to indicate a change that should not bump the version",
        ),
    ]
}

/// Reads a YAML list of `{name, color, description}` entries.
pub fn load_labels(path: &Path) -> Result<Vec<Label>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let labels: Vec<Label> = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    for label in &labels {
        validate_label(label)?;
    }
    Ok(labels)
}

fn validate_label(label: &Label) -> Result<(), ConfigError> {
    if label.name.trim().is_empty() {
        return Err(ConfigError::InvalidLabel {
            label: label.name.clone(),
            message: "name must be non-empty".to_string(),
        });
    }
    let color = &label.color;
    if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidLabel {
            label: label.name.clone(),
            message: format!("color `{color}` must be six hex digits without `#`"),
        });
    }
    Ok(())
}

/// Creates missing labels; existing ones are overwritten only when
/// `recreate` is set. Stops at the first API failure.
pub fn sync_labels<A: LabelAdmin>(
    admin: &A,
    labels: &[Label],
    recreate: bool,
) -> Result<Vec<LabelSyncOutcome>, GithubError> {
    let mut outcomes = Vec::with_capacity(labels.len());
    for label in labels {
        let action = match admin.get_label(&label.name)? {
            None => {
                admin.create_label(label)?;
                LabelSyncAction::Created
            }
            Some(_) if recreate => {
                admin.update_label(label)?;
                LabelSyncAction::Updated
            }
            Some(_) => LabelSyncAction::Kept,
        };
        outcomes.push(LabelSyncOutcome {
            name: label.name.clone(),
            action,
        });
    }
    Ok(outcomes)
}
