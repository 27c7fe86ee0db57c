//! Environment variable bindings.
//!
//! An option is bound to at most one variable, either by explicit name or by
//! a name derived from its first long flag when the parser has an
//! `auto_env_var_prefix`:
//!
//! ```text
//! prefix "APP_", flag --output-format  →  APP_OUTPUT_FORMAT
//! ```
//!
//! Raw values use the same `[a, b, c]` list form as config files.

use std::collections::HashMap;

use crate::option::OptionSpec;
use crate::types::SettingValue;

/// Derive the variable name for `spec` under `prefix`.
///
/// Returns `None` for options that cannot be set from the environment:
/// positionals, config-path and config-output options, and options without
/// a long flag.
pub fn auto_env_var_name(prefix: &str, spec: &OptionSpec) -> Option<String> {
    if spec.is_positional() || spec.is_config_path() || spec.is_config_output_path() {
        return None;
    }
    let first = spec.long_flags().next()?;
    let stripped = first.trim_start_matches('-');
    Some(format!("{prefix}{stripped}").replace('-', "_").to_uppercase())
}

/// A bound option whose variable is present in the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvValue<'a> {
    pub spec: &'a OptionSpec,
    pub var: &'a str,
    pub value: SettingValue,
}

/// Look up every bound, non-positional option in `vars`, in declaration order.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_values<'a>(
    options: &'a [OptionSpec],
    vars: impl IntoIterator<Item = (String, String)>,
) -> Vec<EnvValue<'a>> {
    let vars: HashMap<String, String> = vars.into_iter().collect();
    options
        .iter()
        .filter(|spec| !spec.is_positional())
        .filter_map(|spec| {
            let var = spec.get_env_var()?;
            let raw = vars.get(var)?;
            Some(EnvValue {
                spec,
                var,
                value: SettingValue::from_raw(raw),
            })
        })
        .collect()
}
