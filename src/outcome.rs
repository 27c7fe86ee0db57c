//! Parse results.

use std::any::Any;
use std::fmt;
use std::path::PathBuf;

use clap::ArgMatches;

use crate::engine;
use crate::option::OptionSpec;
use crate::types::{Arity, SettingValue};

/// Values bound by a successful parse.
///
/// Typed access goes through clap's own storage, so the type must match the
/// option's [`ValueType`](crate::ValueType): `String`, `i64`, `f64` or
/// `PathBuf` for value options, `bool` for flags, `u8` for counters.
#[derive(Debug, Clone)]
pub struct ParsedArgs {
    matches: ArgMatches,
    options: Vec<OptionSpec>,
    unknown: Vec<String>,
}

impl ParsedArgs {
    pub(crate) fn new(matches: ArgMatches, options: Vec<OptionSpec>, unknown: Vec<String>) -> Self {
        Self {
            matches,
            options,
            unknown,
        }
    }

    /// The single value of `dest`, or `None` if unset or of another type.
    pub fn get_one<T: Any + Clone + Send + Sync + 'static>(&self, dest: &str) -> Option<T> {
        self.matches.try_get_one::<T>(dest).ok().flatten().cloned()
    }

    /// All values of a list option, in order.
    pub fn get_many<T: Any + Clone + Send + Sync + 'static>(&self, dest: &str) -> Option<Vec<T>> {
        let values = self.matches.try_get_many::<T>(dest).ok().flatten()?;
        Some(values.cloned().collect())
    }

    pub fn get_str(&self, dest: &str) -> Option<&str> {
        self.matches
            .try_get_one::<String>(dest)
            .ok()
            .flatten()
            .map(String::as_str)
    }

    /// State of a `Flag` or `FlagFalse` option.
    pub fn flag(&self, dest: &str) -> bool {
        self.get_one::<bool>(dest).unwrap_or(false)
    }

    /// Occurrences of a `Counter` option.
    pub fn count(&self, dest: &str) -> u8 {
        self.get_one::<u8>(dest).unwrap_or(0)
    }

    /// The bound value of `dest` as strings, whatever its type.
    ///
    /// Flags render as `true`/`false`, counters as their count, list options
    /// as a list. Defaults count as bound.
    pub fn value(&self, dest: &str) -> Option<SettingValue> {
        let spec = self.options.iter().find(|o| o.get_dest() == dest)?;
        match spec.get_arity() {
            Arity::Flag | Arity::FlagFalse => {
                self.get_one::<bool>(dest).map(|b| b.to_string().into())
            }
            Arity::Counter => self.get_one::<u8>(dest).map(|n| n.to_string().into()),
            arity if arity.is_list() => {
                engine::raw_strings(&self.matches, dest).map(SettingValue::List)
            }
            _ => engine::raw_strings(&self.matches, dest)?
                .into_iter()
                .next_back()
                .map(SettingValue::Scalar),
        }
    }

    /// Whether `dest` has a value from any source, defaults included.
    pub fn contains(&self, dest: &str) -> bool {
        self.matches.try_contains_id(dest).unwrap_or(false)
    }

    /// Tokens nobody recognized. Always empty after a strict parse.
    pub fn unknown(&self) -> &[String] {
        &self.unknown
    }

    pub fn matches(&self) -> &ArgMatches {
        &self.matches
    }
}

/// What a parse call did.
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    /// Values were bound.
    Bound(ParsedArgs),
    /// A config-output option was given: the resolved settings were written
    /// to these paths instead.
    WroteConfig(Vec<PathBuf>),
}

impl ParseOutcome {
    pub fn bound(self) -> Option<ParsedArgs> {
        match self {
            ParseOutcome::Bound(args) => Some(args),
            ParseOutcome::WroteConfig(_) => None,
        }
    }
}

impl fmt::Display for ParseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseOutcome::Bound(args) => {
                write!(f, "Parsed arguments")?;
                if !args.unknown.is_empty() {
                    write!(f, " ({} unknown)", args.unknown.len())?;
                }
                Ok(())
            }
            ParseOutcome::WroteConfig(paths) => {
                let joined: Vec<String> =
                    paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "Wrote config file to {}", joined.join(", "))
            }
        }
    }
}
