//! Where each resolved value came from.
//!
//! Built fresh on every parse. The `Display` form is the diagnostic text
//! printed by [`ArgParser::format_values`](crate::ArgParser::format_values):
//!
//! ```text
//! Command Line Args:   --format WIG
//! Environment Variables:
//!   OUTPUT_FORMAT:     R
//! Config File (/etc/app.ini):
//!   level:             3
//! Defaults:
//!   --threads:         4
//! ```

use std::fmt;

use crate::types::SettingValue;

/// Origin of a group of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    CommandLine,
    EnvironmentVariables,
    /// A config file, by source name.
    ConfigFile(String),
    Defaults,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::CommandLine => write!(f, "Command Line Args:"),
            ValueSource::EnvironmentVariables => write!(f, "Environment Variables:"),
            ValueSource::ConfigFile(name) => write!(f, "Config File ({name}):"),
            ValueSource::Defaults => write!(f, "Defaults:"),
        }
    }
}

/// One recorded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceEntry {
    /// Display key: the literal tokens, a variable name, a config key, or a flag.
    pub key: String,
    /// Identifier of the option this value sets, if any option claims it.
    pub dest: Option<String>,
    pub value: SettingValue,
}

/// Ordered source → entries record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    sources: Vec<(ValueSource, Vec<ProvenanceEntry>)>,
}

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry under `source`, creating the block on first use.
    pub fn record(
        &mut self,
        source: ValueSource,
        key: impl Into<String>,
        dest: Option<&str>,
        value: SettingValue,
    ) {
        let entry = ProvenanceEntry {
            key: key.into(),
            dest: dest.map(str::to_string),
            value,
        };
        match self.sources.iter_mut().find(|(s, _)| *s == source) {
            Some((_, entries)) => entries.push(entry),
            None => self.sources.push((source, vec![entry])),
        }
    }

    pub fn sources(&self) -> impl Iterator<Item = (&ValueSource, &[ProvenanceEntry])> {
        self.sources.iter().map(|(s, e)| (s, e.as_slice()))
    }

    pub fn entries(&self, source: &ValueSource) -> &[ProvenanceEntry] {
        self.sources
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, e)| e.as_slice())
            .unwrap_or(&[])
    }

    /// Which source supplied the option `dest`, if any was recorded.
    pub fn source_of(&self, dest: &str) -> Option<&ValueSource> {
        self.sources
            .iter()
            .find(|(_, entries)| entries.iter().any(|e| e.dest.as_deref() == Some(dest)))
            .map(|(s, _)| s)
    }

    /// Remove `Defaults` entries whose option `was_set` reports as given.
    pub(crate) fn drop_defaults_where(&mut self, mut was_set: impl FnMut(&str) -> bool) {
        for (source, entries) in &mut self.sources {
            if *source == ValueSource::Defaults {
                entries.retain(|e| !e.dest.as_deref().is_some_and(&mut was_set));
            }
        }
        self.sources.retain(|(_, entries)| !entries.is_empty());
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (source, entries) in &self.sources {
            if *source == ValueSource::CommandLine {
                // The literal command line is a single entry holding all tokens.
                for entry in entries {
                    let joined = match &entry.value {
                        SettingValue::List(tokens) => tokens.join(" "),
                        SettingValue::Scalar(s) => s.clone(),
                    };
                    writeln!(f, "{:<21}{joined}", source.to_string())?;
                }
                continue;
            }
            writeln!(f, "{source}")?;
            for entry in entries {
                writeln!(f, "  {:<19}{}", format!("{}:", entry.key), entry.value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_in_insertion_order() {
        let mut p = Provenance::new();
        p.record(
            ValueSource::CommandLine,
            "",
            None,
            SettingValue::List(vec!["--format".into(), "WIG".into()]),
        );
        p.record(
            ValueSource::EnvironmentVariables,
            "OUTPUT_FORMAT",
            Some("format"),
            "R".into(),
        );
        p.record(
            ValueSource::ConfigFile("a.ini".into()),
            "level",
            Some("level"),
            "3".into(),
        );
        p.record(ValueSource::Defaults, "--threads", Some("threads"), "4".into());

        assert_eq!(
            p.to_string(),
            "Command Line Args:   --format WIG\n\
             Environment Variables:\n  OUTPUT_FORMAT:     R\n\
             Config File (a.ini):\n  level:             3\n\
             Defaults:\n  --threads:         4\n"
        );
    }

    #[test]
    fn entries_grouped_by_source() {
        let mut p = Provenance::new();
        let file = ValueSource::ConfigFile("a.ini".into());
        p.record(file.clone(), "x", Some("x"), "1".into());
        p.record(ValueSource::Defaults, "--y", Some("y"), "2".into());
        p.record(file.clone(), "z", None, "3".into());

        assert_eq!(p.sources().count(), 2);
        let keys: Vec<&str> = p.entries(&file).iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["x", "z"]);
        assert_eq!(p.source_of("y"), Some(&ValueSource::Defaults));
        assert_eq!(p.source_of("missing"), None);
    }

    #[test]
    fn dropping_defaults_removes_empty_block() {
        let mut p = Provenance::new();
        p.record(ValueSource::ConfigFile("f".into()), "x", Some("x"), "1".into());
        p.record(ValueSource::Defaults, "out", Some("out"), "o".into());
        p.record(ValueSource::Defaults, "--y", Some("y"), "2".into());

        p.drop_defaults_where(|dest| dest == "out");
        assert_eq!(p.entries(&ValueSource::Defaults).len(), 1);

        p.drop_defaults_where(|dest| dest == "y" || dest == "x");
        assert!(p.entries(&ValueSource::Defaults).is_empty());
        assert_eq!(p.sources().count(), 1);
    }

    #[test]
    fn long_keys_are_not_truncated() {
        let mut p = Provenance::new();
        p.record(
            ValueSource::Defaults,
            "--a-very-long-option-name",
            None,
            "v".into(),
        );
        assert_eq!(p.to_string(), "Defaults:\n  --a-very-long-option-name:v\n");
    }

    #[test]
    fn list_values_bracketed() {
        let mut p = Provenance::new();
        p.record(
            ValueSource::ConfigFile("f".into()),
            "tags",
            None,
            SettingValue::List(vec!["a".into(), "b".into()]),
        );
        assert!(p.to_string().contains("tags:              [a, b]"));
    }
}
