//! Turn config and environment values back into command-line tokens.
//!
//! The flag engine only ever sees a token list, so a value read from a file
//! or an environment variable is rewritten as the flags a user would have
//! typed. How depends on the option's arity:
//!
//! ```text
//! Flag / FlagFalse    true|yes|on|1  → --flag          false|no|off|0 → (nothing)
//! Counter             3              → -v -v -v
//! Scalar              v              → --name v        -5 → --name=-5
//! ListAppend          [a, b]         → --name a --name b
//! Variadic            [a, b]         → --name a b
//! unknown key         v              → --key=v         true → --key
//! ```

use crate::error::ArgfigError;
use crate::option::OptionSpec;
use crate::types::{Arity, SettingValue};

/// Interpret the boolean words accepted for flags.
pub fn parse_bool_word(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Tokens for `key = value`, where `spec` is the option the key belongs to
/// (`None` for a key no option claims). `key` is only used in error messages.
pub fn synthesize(
    spec: Option<&OptionSpec>,
    key: &str,
    value: &SettingValue,
) -> Result<Vec<String>, ArgfigError> {
    let Some(spec) = spec else {
        return Ok(synthesize_unknown(key, value));
    };
    let Some(flag) = spec.command_line_flag() else {
        return Ok(Vec::new());
    };

    if spec.get_arity().takes_no_value() {
        return synthesize_flag(spec, flag, key, value);
    }

    match value {
        SettingValue::Scalar(v) if v.eq_ignore_ascii_case("true") => {
            Err(ArgfigError::TrueForValueOption {
                key: key.to_string(),
            })
        }
        SettingValue::Scalar(v) => Ok(flag_with_value(flag, v)),
        SettingValue::List(items) => match spec.get_arity() {
            Arity::ListAppend => Ok(items.iter().flat_map(|e| flag_with_value(flag, e)).collect()),
            Arity::Variadic if items.is_empty() => Ok(Vec::new()),
            Arity::Variadic if items.iter().any(|e| e.starts_with('-')) => Ok(items
                .iter()
                .map(|e| format!("{flag}={e}"))
                .collect()),
            Arity::Variadic => {
                let mut tokens = vec![flag.to_string()];
                tokens.extend(items.iter().cloned());
                Ok(tokens)
            }
            _ => Err(ArgfigError::ListForNonList {
                key: key.to_string(),
                value: value.to_string(),
            }),
        },
    }
}

fn synthesize_flag(
    spec: &OptionSpec,
    flag: &str,
    key: &str,
    value: &SettingValue,
) -> Result<Vec<String>, ArgfigError> {
    let v = match value {
        SettingValue::List(_) => {
            return Err(ArgfigError::ValueForFlag {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        SettingValue::Scalar(v) => v,
    };

    match parse_bool_word(v) {
        Some(true) => return Ok(vec![flag.to_string()]),
        Some(false) => return Ok(Vec::new()),
        None => {}
    }
    if spec.get_arity() == Arity::Counter
        && let Ok(n) = v.trim().parse::<u8>()
    {
        return Ok(vec![flag.to_string(); n as usize]);
    }
    Err(ArgfigError::UnexpectedFlagValue {
        key: key.to_string(),
        value: v.clone(),
    })
}

fn synthesize_unknown(key: &str, value: &SettingValue) -> Vec<String> {
    let flag = unknown_key_flag(key);
    match value {
        SettingValue::Scalar(v) if v.eq_ignore_ascii_case("true") => vec![flag],
        SettingValue::Scalar(v) => vec![format!("{flag}={v}")],
        SettingValue::List(items) => items.iter().map(|e| format!("{flag}={e}")).collect(),
    }
}

/// The long-flag spelling of a key no option claims.
pub fn unknown_key_flag(key: &str) -> String {
    format!("--{}", key.trim_start_matches('-'))
}

fn flag_with_value(flag: &str, value: &str) -> Vec<String> {
    if value.starts_with('-') {
        vec![format!("{flag}={value}")]
    } else {
        vec![flag.to_string(), value.to_string()]
    }
}
