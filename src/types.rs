//! Shared value types: option arity, value typing, defaults, and the parsed
//! form of config file settings.
//!
//! # Arity
//!
//! Every option declares the shape of values it accepts. The arity decides
//! how a config file or environment value is turned back into command-line
//! tokens:
//!
//! | Arity            | Command line          | Config / env value          |
//! |------------------|-----------------------|-----------------------------|
//! | `Scalar`         | `--name v`            | `name = v`                  |
//! | `OptionalScalar` | `--name` / `--name v` | `name = v`                  |
//! | `ListAppend`     | `--name a --name b`   | `name = [a, b]`             |
//! | `Variadic`       | `--name a b`          | `name = [a, b]`             |
//! | `Flag`           | `--name`              | `name = true` / `false`     |
//! | `FlagFalse`      | `--name`              | `name = true` / `false`     |
//! | `Counter`        | `-v -v -v`            | `name = 3` / `true`         |

use std::fmt;

/// The shape of values an option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arity {
    /// Exactly one value; a repeated flag replaces the earlier value.
    #[default]
    Scalar,
    /// Zero or one value.
    OptionalScalar,
    /// One value per occurrence, collected into a list.
    ListAppend,
    /// One or more values per occurrence, collected into a list.
    Variadic,
    /// Boolean flag, `true` when present.
    Flag,
    /// Boolean flag, `false` when present.
    FlagFalse,
    /// Counts occurrences.
    Counter,
}

impl Arity {
    /// Kinds that never take an explicit value on the command line.
    pub fn takes_no_value(self) -> bool {
        matches!(self, Arity::Flag | Arity::FlagFalse | Arity::Counter)
    }

    /// Kinds whose bound value is a list.
    pub fn is_list(self) -> bool {
        matches!(self, Arity::ListAppend | Arity::Variadic)
    }
}

/// How a value string is checked and converted by the flag engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueType {
    #[default]
    String,
    /// Parsed as `i64`.
    Integer,
    /// Parsed as `f64`.
    Float,
    /// Parsed as `PathBuf`.
    Path,
}

/// Default value of an option.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DefaultValue {
    /// No default: the option is absent from the result unless set.
    #[default]
    Unset,
    Value(SettingValue),
    /// Like `Unset`, and also hidden from help and provenance output.
    Suppressed,
}

/// Which syntax config files are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// The permissive INI/YAML-like `key = value` dialect.
    #[default]
    Simple,
    /// TOML documents; tables are flattened one level.
    #[cfg(feature = "toml")]
    Toml,
}

/// A single config file or environment value: a string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Scalar(String),
    List(Vec<String>),
}

impl SettingValue {
    /// Interpret a raw string, recognizing the bracketed `[a, b, c]` list form.
    pub fn from_raw(raw: &str) -> Self {
        match raw
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            Some(inner) if inner.trim().is_empty() => SettingValue::List(Vec::new()),
            Some(inner) => {
                SettingValue::List(inner.split(',').map(|e| e.trim().to_string()).collect())
            }
            None => SettingValue::Scalar(raw.to_string()),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Scalar(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Scalar(s)
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(items: Vec<String>) -> Self {
        SettingValue::List(items)
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Scalar(s) => write!(f, "{s}"),
            SettingValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Insertion-ordered mapping of config keys to values.
///
/// Re-inserting an existing key replaces its value in place, keeping the
/// position of the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    entries: Vec<(String, SettingValue)>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: SettingValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut SettingValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, SettingValue)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, SettingValue)>>(iter: I) -> Self {
        let mut settings = Settings::new();
        for (k, v) in iter {
            settings.insert(k, v);
        }
        settings
    }
}
