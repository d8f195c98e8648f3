use std::collections::{BTreeMap, BTreeSet};

/// `--flag value` / `--flag=value` arguments for one command. Value flags may
/// repeat; switches take no value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    values: BTreeMap<String, Vec<String>>,
    switches: BTreeSet<String>,
}

impl ParsedArgs {
    pub fn parse(
        args: &[String],
        value_flags: &[&str],
        switch_flags: &[&str],
    ) -> Result<Self, String> {
        Self::parse_with_short(args, value_flags, switch_flags, &[])
    }

    /// Like `parse`, also accepting `-x value` for each `(x, long)` pair in
    /// `short_flags`.
    pub fn parse_with_short(
        args: &[String],
        value_flags: &[&str],
        switch_flags: &[&str],
        short_flags: &[(char, &str)],
    ) -> Result<Self, String> {
        let mut parsed = Self::default();
        let mut i = 0;
        while i < args.len() {
            let raw = args[i].as_str();
            let flag = match raw.strip_prefix("--") {
                Some(flag) => flag,
                None => short_flag(raw, short_flags)
                    .ok_or_else(|| format!("unexpected argument `{raw}`"))?,
            };
            let (name, inline) = match flag.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (flag, None),
            };

            if switch_flags.contains(&name) {
                if inline.is_some() {
                    return Err(format!("--{name} does not take a value"));
                }
                parsed.switches.insert(name.to_string());
                i += 1;
                continue;
            }
            if !value_flags.contains(&name) {
                return Err(format!("unknown option `--{name}`"));
            }

            let value = match inline {
                Some(value) => value,
                None => {
                    i += 1;
                    args.get(i)
                        .cloned()
                        .ok_or_else(|| format!("--{name} requires a value"))?
                }
            };
            parsed
                .values
                .entry(name.to_string())
                .or_default()
                .push(value);
            i += 1;
        }
        Ok(parsed)
    }

    /// Last value given for `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    pub fn required(&self, name: &str) -> Result<&str, String> {
        self.value(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| format!("missing required option --{name}"))
    }

    pub fn values(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn switch(&self, name: &str) -> bool {
        self.switches.contains(name)
    }
}

fn short_flag<'a>(raw: &str, short_flags: &[(char, &'a str)]) -> Option<&'a str> {
    let mut chars = raw.strip_prefix('-')?.chars();
    let (Some(short), None) = (chars.next(), chars.next()) else {
        return None;
    };
    short_flags
        .iter()
        .find(|(candidate, _)| *candidate == short)
        .map(|(_, long)| *long)
}
