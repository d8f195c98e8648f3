use crate::shared::fs_atomic::append_line;
use crate::shared::ids::generate_uuid;
use std::path::Path;

/// Named action outputs, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutputs {
    entries: Vec<(String, String)>,
}

impl ActionOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.entries.push((name.to_string(), value.into()));
        self
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// `name=value` lines; multi-line values use the `name<<DELIM` form.
    pub fn render(&self) -> String {
        let delimiter = format!("ghadelimiter_{}", generate_uuid());
        self.render_with_delimiter(&delimiter)
    }

    fn render_with_delimiter(&self, delimiter: &str) -> String {
        let mut lines = Vec::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            if value.contains('\n') {
                lines.push(format!("{name}<<{delimiter}\n{value}\n{delimiter}"));
            } else {
                lines.push(format!("{name}={value}"));
            }
        }
        lines.join("\n")
    }

    pub fn append_to(&self, path: &Path) -> std::io::Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        append_line(path, &self.render())
    }
}
