//! Option descriptors.
//!
//! An [`OptionSpec`] is declared once and drives everything downstream: the
//! `clap::Arg` registered with the flag engine, the config keys and
//! environment variable that can set it, and how config values are turned
//! back into command-line tokens.

use crate::error::ArgfigError;
use crate::types::{Arity, DefaultValue, SettingValue, ValueType};

/// Declaration of a single option or positional argument.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    flags: Vec<String>,
    dest: String,
    arity: Arity,
    required: bool,
    default: DefaultValue,
    value_type: ValueType,
    choices: Option<Vec<String>>,
    help: Option<String>,
    value_name: Option<String>,
    positional: bool,
    config_path: bool,
    config_output_path: bool,
    env_var: Option<String>,
}

impl OptionSpec {
    /// A flag option such as `OptionSpec::new(["-f", "--format"])`.
    ///
    /// The identifier defaults to the first long flag without dashes, `-`
    /// replaced by `_` (`--output-format` → `output_format`).
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let flags: Vec<String> = flags.into_iter().map(Into::into).collect();
        let dest = derive_dest(&flags);
        Self::with(flags, dest, false)
    }

    /// A positional argument named `name`.
    pub fn positional(name: &str) -> Self {
        let mut spec = Self::with(Vec::new(), name.to_string(), true);
        spec.required = true;
        spec
    }

    fn with(flags: Vec<String>, dest: String, positional: bool) -> Self {
        Self {
            flags,
            dest,
            arity: Arity::Scalar,
            required: false,
            default: DefaultValue::Unset,
            value_type: ValueType::String,
            choices: None,
            help: None,
            value_name: None,
            positional,
            config_path: false,
            config_output_path: false,
            env_var: None,
        }
    }

    // --- setters ---

    pub fn dest(mut self, dest: &str) -> Self {
        self.dest = dest.to_string();
        self
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn default_value(mut self, value: impl Into<SettingValue>) -> Self {
        self.default = DefaultValue::Value(value.into());
        self
    }

    /// Hide the option from help defaults and from the `Defaults` provenance block.
    pub fn suppress_default(mut self) -> Self {
        self.default = DefaultValue::Suppressed;
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Restrict string values to a fixed set.
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn value_name(mut self, name: &str) -> Self {
        self.value_name = Some(name.to_string());
        self
    }

    /// Mark this option as naming config files to read.
    pub fn config_path(mut self) -> Self {
        self.config_path = true;
        self
    }

    /// Mark this option as naming a file to write the resolved config to.
    pub fn config_output_path(mut self) -> Self {
        self.config_output_path = true;
        self
    }

    /// Bind an environment variable by explicit name.
    pub fn env_var(mut self, name: &str) -> Self {
        self.env_var = Some(name.to_string());
        self
    }

    pub(crate) fn set_env_var(&mut self, name: String) {
        self.env_var = Some(name);
    }

    // --- getters ---

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn get_dest(&self) -> &str {
        &self.dest
    }

    pub fn get_arity(&self) -> Arity {
        self.arity
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn get_default(&self) -> &DefaultValue {
        &self.default
    }

    pub fn get_value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn get_choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    pub fn get_help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn get_value_name(&self) -> Option<&str> {
        self.value_name.as_deref()
    }

    pub fn is_positional(&self) -> bool {
        self.positional
    }

    pub fn is_config_path(&self) -> bool {
        self.config_path
    }

    pub fn is_config_output_path(&self) -> bool {
        self.config_output_path
    }

    pub fn get_env_var(&self) -> Option<&str> {
        self.env_var.as_deref()
    }

    // --- derived ---

    pub fn long_flags(&self) -> impl Iterator<Item = &str> {
        self.flags
            .iter()
            .map(String::as_str)
            .filter(|f| f.starts_with("--"))
    }

    pub fn short_flags(&self) -> impl Iterator<Item = char> {
        self.flags
            .iter()
            .filter(|f| !f.starts_with("--"))
            .filter_map(|f| f.strip_prefix('-').and_then(|s| s.chars().next()))
    }

    /// Config file keys that set this option: each long flag, without and
    /// with its `--` prefix. Positionals have none. The first key is the one
    /// used when writing a config file.
    pub fn config_keys(&self) -> Vec<&str> {
        if self.positional {
            return Vec::new();
        }
        self.long_flags().flat_map(|f| [&f[2..], f]).collect()
    }

    pub fn matches_config_key(&self, key: &str) -> bool {
        !self.positional && self.long_flags().any(|f| f == key || &f[2..] == key)
    }

    /// The flag spelled out when this option is set from a config file or
    /// the environment: the last long flag, or the last flag of any kind.
    pub fn command_line_flag(&self) -> Option<&str> {
        self.long_flags()
            .last()
            .or_else(|| self.flags.last().map(String::as_str))
    }

    /// Check the registration invariants.
    pub fn validate(&self) -> Result<(), ArgfigError> {
        let invalid = |reason: &str| ArgfigError::InvalidOption {
            option: self.display_name(),
            reason: reason.to_string(),
        };

        if self.positional {
            if self.config_path || self.config_output_path {
                return Err(invalid("a positional argument cannot name a config file"));
            }
            if self.env_var.is_some() {
                return Err(invalid("a positional argument cannot be set from an environment variable"));
            }
        } else if self.flags.is_empty() {
            return Err(invalid("at least one flag is required"));
        }

        for flag in &self.flags {
            let valid = match flag.strip_prefix("--") {
                Some(name) => !name.is_empty() && !name.starts_with('-'),
                None => flag.starts_with('-') && flag.chars().count() == 2,
            };
            if !valid {
                return Err(ArgfigError::InvalidOption {
                    option: self.display_name(),
                    reason: format!(
                        "invalid flag '{flag}': use '--name' or a single character after '-'"
                    ),
                });
            }
        }

        if self.config_path && self.config_output_path {
            return Err(invalid(
                "cannot both read config files and write the resolved config",
            ));
        }
        if self.config_path && !matches!(self.arity, Arity::Scalar | Arity::Variadic) {
            return Err(invalid("a config path option must take a value"));
        }
        if self.config_output_path && self.arity != Arity::Scalar {
            return Err(invalid("a config output option must take exactly one value"));
        }
        if let DefaultValue::Value(SettingValue::List(_)) = &self.default
            && !self.arity.is_list()
        {
            return Err(invalid("a list default requires a list arity"));
        }
        Ok(())
    }

    pub(crate) fn display_name(&self) -> String {
        if self.flags.is_empty() {
            self.dest.clone()
        } else {
            self.flags.join("/")
        }
    }
}

fn derive_dest(flags: &[String]) -> String {
    let chosen = flags
        .iter()
        .find(|f| f.starts_with("--"))
        .or_else(|| flags.first())
        .map(|f| f.trim_start_matches('-'))
        .unwrap_or_default();
    chosen.replace('-', "_")
}
